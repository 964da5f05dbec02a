//! 核心基础设施：错误分类、重试策略、优雅关闭、会话构建

pub mod builder;
pub mod error;
pub mod retry;
pub mod shutdown;

pub use builder::{FlowBuilder, FlowSession};
pub use error::{
    AgentRunError, FlowError, LlmError, PromptError, ToolError, ToolExecutionError,
};
pub use retry::{RetryError, RetryPolicy};
pub use shutdown::{ShutdownCleanup, ShutdownCoordinator, ShutdownManager};
