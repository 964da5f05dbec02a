//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按脚本顺序返回预设回复或错误，并记录每次调用收到的消息，便于断言上下文与调用次数。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::LlmError;
use crate::llm::{ChatReply, LlmClient};
use crate::memory::Message;

/// 脚本化 Mock：脚本耗尽后返回永久错误，避免重试死循环
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<ChatReply, LlmError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条文本回复
    pub fn reply(self, content: impl Into<String>, total_tokens: u64) -> Self {
        self.push(Ok(ChatReply::text(content, total_tokens)))
    }

    /// 追加一次失败
    pub fn fail(self, err: LlmError) -> Self {
        self.push(Err(err))
    }

    /// 追加一条不含文本的回复（结构异常）
    pub fn empty_shape(self) -> Self {
        self.push(Ok(ChatReply::default()))
    }

    fn push(self, item: Result<ChatReply, LlmError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// 第 n 次调用收到的消息
    pub fn call(&self, n: usize) -> Option<Vec<Message>> {
        self.calls.lock().ok().and_then(|c| c.get(n).cloned())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, messages: &[Message]) -> Result<ChatReply, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Err(LlmError::UnexpectedShape("mock script exhausted".to_string())))
    }
}
