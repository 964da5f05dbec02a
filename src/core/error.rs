//! 错误类型
//!
//! 组件错误（LLM / Agent / 工具 / Prompt）各自独立，最终汇聚为 FlowError：
//! 状态机单步失败即返回 FlowError，由驱动循环终止整个会话。

use std::time::Duration;

use thiserror::Error;

/// 聊天模型调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// 返回结构不符合约定（无 choices / 无文本内容），不应重试
    #[error("Unexpected result shape: {0}")]
    UnexpectedShape(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),
}

impl LlmError {
    /// 结构错误属于契约违背，重试无意义
    pub fn is_permanent(&self) -> bool {
        matches!(self, LlmError::UnexpectedShape(_))
    }
}

/// 工具执行失败（命令无法启动或退出码非 0）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("command=[{command}], output=[{output}], process state=[{status}]")]
pub struct ToolExecutionError {
    pub command: String,
    pub output: String,
    pub status: String,
}

/// 工具错误：Execution 会中止整个 Agent 调用，Failed 则作为观察反馈给 Agent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool execution failed: {0}")]
    Execution(#[from] ToolExecutionError),

    #[error("{0}")]
    Failed(String),
}

/// 行动 Agent 单次运行错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentRunError {
    #[error("failed to run the tool: {0}")]
    ToolExecution(ToolExecutionError),

    #[error("Agent error: {0}")]
    Failed(String),
}

/// Prompt 渲染错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("missing template variable '{variable}' in prompt '{template}'")]
    MissingVariable { template: String, variable: String },
}

/// 状态机单步错误：一律视为致命，终止驱动循环
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("failed to render prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error("failed to call chat model: {0}")]
    Llm(#[from] LlmError),

    #[error("failed to call agent: {0}")]
    Agent(AgentRunError),

    #[error("{operation} timed out after {limit:?}")]
    Timeout { operation: &'static str, limit: Duration },

    #[error("unknown thought type: '{0}'")]
    UnknownThoughtType(String),

    #[error("unknown critique status: '{0}'")]
    UnknownCritiqueStatus(String),

    #[error("failed to unmarshal action message: {0}")]
    MalformedAction(#[from] serde_json::Error),

    #[error("output stream closed")]
    StreamClosed,

    #[error("state machine already completed")]
    AlreadyComplete,
}
