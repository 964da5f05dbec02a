//! 行动 Agent：把一条指令交给可调用工具的 Agent 执行，并记录审计轨迹

pub mod audit;
pub mod executor;
pub mod gateway;
pub mod mock;

use async_trait::async_trait;

use crate::core::AgentRunError;

pub use audit::{AgentObserver, AuditTrail};
pub use executor::{ToolCallingAgent, DEFAULT_MAX_STEPS};
pub use gateway::{ActionAgentGateway, AgentFailure, AgentOutput, NO_OUTPUT_PLACEHOLDER};
pub use mock::MockActionAgent;

/// 行动 Agent 能力：执行一条自然语言指令，运行过程中的日志与工具事件通知 observer
#[async_trait]
pub trait ActionAgent: Send + Sync {
    async fn run(
        &self,
        instruction: &str,
        observer: &mut dyn AgentObserver,
    ) -> Result<String, AgentRunError>;
}
