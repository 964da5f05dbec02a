//! 记忆层：思考上下文（只追加的会话历史）

pub mod conversation;

pub use conversation::{ChatSession, Message, Role};
