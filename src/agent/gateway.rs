//! ActionAgentGateway：行动 Agent 适配层
//!
//! 每次尝试都新建 AuditTrail 交给 Agent 记录，失败时也带回审计文本。
//! 工具执行失败为永久错误（命令可能已改动环境，盲目重试不安全）；其余错误持续重试。

use std::sync::Arc;

use thiserror::Error;

use crate::agent::{ActionAgent, AuditTrail};
use crate::core::{AgentRunError, RetryError, RetryPolicy};

/// Agent 成功但没有输出时的占位文本
pub const NO_OUTPUT_PLACEHOLDER: &str = "no output was produced";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutput {
    pub output: String,
    pub audit_trail: String,
}

/// Agent 调用失败，附带失败那次尝试的审计文本
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct AgentFailure {
    pub kind: AgentRunError,
    pub audit_trail: String,
}

pub struct ActionAgentGateway {
    agent: Arc<dyn ActionAgent>,
    retry: RetryPolicy,
}

impl ActionAgentGateway {
    pub fn new(agent: Arc<dyn ActionAgent>, retry: RetryPolicy) -> Self {
        Self { agent, retry }
    }

    pub async fn execute(&self, instruction: &str) -> Result<AgentOutput, AgentFailure> {
        let agent = &self.agent;
        let result = self
            .retry
            .retry_notify(
                || async move {
                    let mut trail = AuditTrail::new();
                    let result = agent.run(instruction, &mut trail).await;
                    let audit_trail = trail.render();
                    match result {
                        Ok(output) => Ok(AgentOutput {
                            output,
                            audit_trail,
                        }),
                        Err(kind @ AgentRunError::ToolExecution(_)) => {
                            Err(RetryError::Permanent(AgentFailure { kind, audit_trail }))
                        }
                        Err(kind) => Err(RetryError::Transient(AgentFailure { kind, audit_trail })),
                    }
                },
                |err, delay| {
                    tracing::warn!(error = %err, ?delay, "Agent call failed. Retrying...");
                },
            )
            .await?;

        if result.output.is_empty() {
            return Ok(AgentOutput {
                output: NO_OUTPUT_PLACEHOLDER.to_string(),
                audit_trail: result.audit_trail,
            });
        }
        Ok(result)
    }
}
