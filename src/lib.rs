//! Flow - 思考 / 评审 / 行动循环求解计算机问题
//!
//! 模块划分：
//! - **agent**: 行动 Agent、审计轨迹、ActionAgentGateway
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、重试策略、优雅关闭、会话构建
//! - **fsm**: 状态定义、JSON 决策解析、StateMachine
//! - **llm**: 聊天模型抽象与实现（OpenAI 兼容 / DeepSeek / Mock）、ModelGateway
//! - **memory**: 会话历史
//! - **prompts**: Prompt 模板与渲染
//! - **stream**: 输出流
//! - **tools**: terminal、sleep、文本浏览器工具与执行器
//! - **server**: WebSocket 输出流服务（feature = "ws"）

pub mod agent;
pub mod config;
pub mod core;
pub mod fsm;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod prompts;
#[cfg(feature = "ws")]
pub mod server;
pub mod stream;
pub mod tools;

pub use crate::core::{FlowBuilder, FlowError, FlowSession};
pub use crate::fsm::{RunOutcome, State, StateMachine};
