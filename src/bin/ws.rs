//! Flow WebSocket 入口：与 `flow` 相同的循环，输出流通过 WebSocket 文本帧推送给客户端
//!
//! 运行方式：
//! ```bash
//! cargo run --bin flow-ws --features ws -- --problem "..." --bind 127.0.0.1:8080
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use flow::config::load_config;
use flow::core::ShutdownManager;
use flow::{FlowBuilder, RunOutcome};
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "flow-ws", version, about = "Serve the think / critique / act loop output over WebSocket")]
struct Cli {
    #[arg(short, long)]
    problem: String,

    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    start_turn: Option<u32>,

    /// 监听地址（默认取 [server] bind_addr）
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config).context("Failed to load config")?;
    flow::observability::init(&cfg.log.level, cfg.log.pretty);

    let bind_addr = cli.bind.unwrap_or_else(|| cfg.server.bind_addr.clone());
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let session = FlowBuilder::new(cfg, cli.problem)
        .with_start_turn(cli.start_turn)
        .build()
        .context("Failed to build session")?;

    let cancel = shutdown.token();
    let outcome = session
        .run(shutdown.token(), move |output| async move {
            if let Err(e) = flow::server::serve(listener, output, cancel).await {
                tracing::error!(error = %e, "stream server failed");
            }
        })
        .await;

    match outcome {
        Ok(RunOutcome::Completed { tokens_used, turns }) => {
            tracing::info!(tokens_used, turns, "problem completed");
            Ok(())
        }
        Ok(RunOutcome::Cancelled) => Ok(()),
        Err(e) => Err(e).context("State loop aborted"),
    }
}
