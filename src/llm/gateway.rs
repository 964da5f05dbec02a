//! ModelGateway：聊天模型适配层
//!
//! 在 RetryPolicy 下调用 LlmClient；成功时把本次 total tokens 计入会话累计值并返回回复文本。
//! 返回结构异常（无文本内容）或 UnexpectedShape 为永久错误，其余错误持续重试。

use std::sync::Arc;

use crate::core::{LlmError, RetryError, RetryPolicy};
use crate::llm::LlmClient;
use crate::memory::Message;

pub struct ModelGateway {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    tokens_used: u64,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            tokens_used: 0,
        }
    }

    /// 成功调用的 token 累计值；失败调用不计入
    pub fn tokens_used(&self) -> u64 {
        self.tokens_used
    }

    pub async fn generate(&mut self, messages: &[Message]) -> Result<String, LlmError> {
        let client = &self.client;
        let (content, total) = self
            .retry
            .retry_notify(
                || async move {
                    let reply = client.generate(messages).await.map_err(|e| {
                        if e.is_permanent() {
                            RetryError::Permanent(e)
                        } else {
                            RetryError::Transient(e)
                        }
                    })?;
                    tracing::info!(total_tokens = reply.usage.total_tokens, "token usage");
                    match reply.content {
                        Some(content) => Ok((content, reply.usage.total_tokens)),
                        None => Err(RetryError::Permanent(LlmError::UnexpectedShape(
                            "reply has no text content".to_string(),
                        ))),
                    }
                },
                |err, delay| {
                    tracing::warn!(error = %err, ?delay, "Chat generation failed. Retrying...");
                },
            )
            .await?;
        self.tokens_used += total;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use std::time::Duration;

    fn gateway(mock: Arc<MockLlmClient>) -> ModelGateway {
        ModelGateway::new(mock, RetryPolicy::constant(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_tokens_accumulate_over_successful_calls() {
        let mock = Arc::new(MockLlmClient::new().reply("a", 10).reply("b", 32));
        let mut gw = gateway(mock.clone());
        assert_eq!(gw.generate(&[Message::user("x")]).await.unwrap(), "a");
        assert_eq!(gw.generate(&[Message::user("y")]).await.unwrap(), "b");
        assert_eq!(gw.tokens_used(), 42);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_and_cost_nothing() {
        let mock = Arc::new(
            MockLlmClient::new()
                .fail(LlmError::Network("reset".to_string()))
                .fail(LlmError::RateLimited("slow down".to_string()))
                .reply("ok", 7),
        );
        let mut gw = gateway(mock.clone());
        assert_eq!(gw.generate(&[Message::user("x")]).await.unwrap(), "ok");
        assert_eq!(mock.call_count(), 3);
        assert_eq!(gw.tokens_used(), 7);
    }

    #[tokio::test]
    async fn test_missing_content_is_permanent() {
        let mock = Arc::new(MockLlmClient::new().empty_shape().reply("never", 1));
        let mut gw = gateway(mock.clone());
        let err = gw.generate(&[Message::user("x")]).await.unwrap_err();
        assert!(matches!(err, LlmError::UnexpectedShape(_)));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(gw.tokens_used(), 0);
    }
}
