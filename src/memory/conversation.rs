//! 思考上下文：ChatSession
//!
//! 只追加、保持追加顺序的消息序列，作为「思考」调用的上下文。
//! 评审调用只用单条消息上下文，但其回复仍会追加到这里。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 会话历史：不剪枝、不去重、不重排
#[derive(Clone, Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn extend(&mut self, msgs: impl IntoIterator<Item = Message>) {
        self.messages.extend(msgs);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// 当前历史 + 本轮追加的 prompt，作为一次调用的上下文（不写回历史）
    pub fn snapshot_with(&self, prompt: Message) -> Vec<Message> {
        let mut context = Vec::with_capacity(self.messages.len() + 1);
        context.extend(self.messages.iter().cloned());
        context.push(prompt);
        context
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
