//! 会话构建器：由配置组装 StateMachine、输出流与循环结束后的清理任务
//!
//! CLI 与 WebSocket 两个入口共用，测试可注入 Mock LLM / Mock Agent。

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::agent::{ActionAgent, ActionAgentGateway, ToolCallingAgent};
use crate::config::AppConfig;
use crate::core::{FlowError, RetryPolicy, ShutdownCoordinator};
use crate::fsm::{RunOutcome, StateMachine, Timeouts};
use crate::llm::{create_llm_from_config, LlmClient, ModelGateway};
use crate::prompts::PromptBuilder;
use crate::stream::{OutputReceiver, OutputStream};
use crate::tools::{default_registry, ToolExecutor};

/// 一次问题求解会话的全部组件
pub struct FlowSession {
    pub machine: StateMachine,
    pub output: OutputReceiver,
    /// 循环退出后调用 run_cleanup 释放外部资源
    pub cleanup: ShutdownCoordinator,
}

impl FlowSession {
    /// 消费端作为独立任务运行；状态机结束后释放生产端，等消费端取完剩余消息，再执行清理
    pub async fn run<F, Fut>(
        self,
        cancel: CancellationToken,
        consume: F,
    ) -> Result<RunOutcome, FlowError>
    where
        F: FnOnce(OutputReceiver) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let FlowSession {
            mut machine,
            output,
            cleanup,
        } = self;
        let consumer = tokio::spawn(consume(output));
        let outcome = match machine.run(cancel.clone()).await {
            // 取消后消费端先行退出，阻塞中的 push 会以 StreamClosed 返回
            Err(FlowError::StreamClosed) if cancel.is_cancelled() => {
                tracing::info!("output stream closed during shutdown");
                Ok(RunOutcome::Cancelled)
            }
            other => other,
        };
        drop(machine);

        if let Err(e) = consumer.await {
            tracing::warn!(error = %e, "output consumer task failed");
        }
        cleanup.run_cleanup().await;
        outcome
    }
}

pub struct FlowBuilder {
    config: AppConfig,
    problem: String,
    start_turn: Option<u32>,
    prompts_dir: PathBuf,
    llm: Option<Arc<dyn LlmClient>>,
    agent: Option<Arc<dyn ActionAgent>>,
}

impl FlowBuilder {
    pub fn new(config: AppConfig, problem: impl Into<String>) -> Self {
        Self {
            config,
            problem: problem.into(),
            start_turn: None,
            prompts_dir: PathBuf::from("config/prompts"),
            llm: None,
            agent: None,
        }
    }

    /// 覆盖配置中的起始轮次
    pub fn with_start_turn(mut self, turn: Option<u32>) -> Self {
        self.start_turn = turn;
        self
    }

    pub fn with_prompts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompts_dir = dir.into();
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_agent(mut self, agent: Arc<dyn ActionAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn build(self) -> anyhow::Result<FlowSession> {
        let cfg = &self.config;
        let mut cleanup = ShutdownCoordinator::new();

        let llm = match self.llm {
            Some(llm) => llm,
            None => create_llm_from_config(&cfg.llm, None)?,
        };

        let agent: Arc<dyn ActionAgent> = match self.agent {
            Some(agent) => agent,
            None => {
                let agent_llm = create_llm_from_config(&cfg.llm, cfg.agent.model.as_deref())?;
                let (registry, browser) = default_registry(&cfg.tools);
                cleanup.register(browser);
                tracing::info!(tools = ?registry.tool_names(), "action agent tools registered");
                let executor = ToolExecutor::new(registry, cfg.fsm.agent_timeout());
                Arc::new(
                    ToolCallingAgent::new(agent_llm, executor).with_max_steps(cfg.agent.max_steps),
                )
            }
        };

        let retry = RetryPolicy::constant(cfg.fsm.retry_delay());
        let prompts = if self.prompts_dir.is_dir() {
            PromptBuilder::load(&self.prompts_dir)
        } else {
            PromptBuilder::new()
        };

        let (sink, output) = OutputStream::new(&self.problem);
        let machine = StateMachine::new(
            self.problem.clone(),
            ModelGateway::new(llm, retry),
            ActionAgentGateway::new(agent, retry),
            sink,
        )
        .with_start_turn(self.start_turn.unwrap_or(cfg.fsm.start_turn))
        .with_prompts(prompts)
        .with_timeouts(Timeouts::from(&cfg.fsm));

        Ok(FlowSession {
            machine,
            output,
            cleanup,
        })
    }
}
