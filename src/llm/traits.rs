//! 聊天模型能力抽象
//!
//! 后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient::generate：消息列表 -> 回复文本 + token 用量。

use async_trait::async_trait;

use crate::core::LlmError;
use crate::memory::Message;

/// 单次调用的 token 用量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// 一次生成的结果；content 为 None 表示返回结构不含文本（契约违背）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub usage: TokenUsage,
}

impl ChatReply {
    pub fn text(content: impl Into<String>, total_tokens: u64) -> Self {
        Self {
            content: Some(content.into()),
            usage: TokenUsage {
                total_tokens,
                ..TokenUsage::default()
            },
        }
    }
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<ChatReply, LlmError>;
}
