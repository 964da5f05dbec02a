//! Flow - 思考 / 评审 / 行动循环
//!
//! 入口：加载配置、初始化日志、构建状态机，把输出流打印到 stdout，运行直到完成、取消或致命错误。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use flow::config::load_config;
use flow::core::ShutdownManager;
use flow::{FlowBuilder, RunOutcome};

#[derive(Parser, Debug)]
#[command(name = "flow", version, about = "Solve a computer problem with a think / critique / act loop")]
struct Cli {
    /// 要解决的问题
    #[arg(short, long)]
    problem: String,

    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 起始轮次（覆盖 [fsm] start_turn）
    #[arg(long)]
    start_turn: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config).context("Failed to load config")?;
    flow::observability::init(&cfg.log.level, cfg.log.pretty);

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let session = FlowBuilder::new(cfg, cli.problem)
        .with_start_turn(cli.start_turn)
        .build()
        .context("Failed to build session")?;

    let outcome = session
        .run(shutdown.token(), |mut output| async move {
            while let Some(msg) = output.recv().await {
                println!("{}", msg);
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
