//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；DeepSeek 走同一客户端。

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::core::LlmError;
use crate::llm::{ChatReply, LlmClient, TokenUsage};
use crate::memory::{Message, Role};

/// DeepSeek 的 OpenAI 兼容端点
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// OpenAI 兼容客户端：持有 Client、模型名与采样温度
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: &str, temperature: f32) -> Self {
        let config = match base_url {
            Some(url) => OpenAIConfig::new().with_api_base(url).with_api_key(api_key),
            None => OpenAIConfig::new().with_api_key(api_key),
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature,
        }
    }

    fn to_openai_messages(
        &self,
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        messages
            .iter()
            .map(|m| {
                Ok(match m.role {
                    Role::System => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessageArgs::default()
                            .content(m.content.clone())
                            .build()?,
                    ),
                    Role::User => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(m.content.clone())
                            .build()?,
                    ),
                    Role::Assistant => ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .content(m.content.clone())
                            .build()?,
                    ),
                })
            })
            .collect()
    }
}

/// 按错误文本归类：限流、网络、其余 API 错误
fn classify_error(err: OpenAIError) -> LlmError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("rate limit") || lower.contains("429") {
        LlmError::RateLimited(message)
    } else if lower.contains("http error")
        || lower.contains("timed out")
        || lower.contains("connection")
    {
        LlmError::Network(message)
    } else {
        LlmError::Api(message)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, messages: &[Message]) -> Result<ChatReply, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(self.to_openai_messages(messages).map_err(classify_error)?)
            .build()
            .map_err(classify_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(classify_error)?;

        let usage = response
            .usage
            .as_ref()
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens as u64,
                completion_tokens: u.completion_tokens as u64,
                total_tokens: u.total_tokens as u64,
            })
            .unwrap_or_default();

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone());

        Ok(ChatReply { content, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        let err = OpenAIError::InvalidArgument("Rate limit reached for requests".to_string());
        assert!(matches!(classify_error(err), LlmError::RateLimited(_)));
    }

    #[test]
    fn test_classify_other_as_api_error() {
        let err = OpenAIError::InvalidArgument("model not found".to_string());
        assert!(matches!(classify_error(err), LlmError::Api(_)));
    }
}
