//! LLM 层：聊天能力抽象、OpenAI 兼容实现、带重试与 token 统计的 ModelGateway、Mock

pub mod gateway;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use anyhow::Context;

use crate::config::LlmSection;

pub use gateway::ModelGateway;
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, DEEPSEEK_BASE_URL};
pub use traits::{ChatReply, LlmClient, TokenUsage};

/// 根据 [llm] 配置与环境变量创建客户端；model 用于覆盖配置中的模型（如 Agent 使用独立模型）
pub fn create_llm_from_config(
    cfg: &LlmSection,
    model: Option<&str>,
) -> anyhow::Result<Arc<dyn LlmClient>> {
    let model = model.unwrap_or(&cfg.model);
    match cfg.provider.to_lowercase().as_str() {
        "deepseek" => {
            let api_key = std::env::var("DEEPSEEK_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .context("DEEPSEEK_API_KEY is not set")?;
            let base = cfg.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);
            tracing::info!("Using DeepSeek LLM ({})", model);
            Ok(Arc::new(OpenAiClient::new(
                Some(base),
                model,
                &api_key,
                cfg.temperature,
            )))
        }
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
            tracing::info!("Using OpenAI LLM ({})", model);
            Ok(Arc::new(OpenAiClient::new(
                cfg.base_url.as_deref(),
                model,
                &api_key,
                cfg.temperature,
            )))
        }
        other => anyhow::bail!("unknown llm provider '{}'", other),
    }
}
