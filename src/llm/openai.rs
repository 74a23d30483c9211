//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url，缺省走
//! OpenRouter）；complete 时转 Message 为 API 格式并取首条 content。

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::LlmSection;
use crate::core::state::{Message, Role};
use crate::llm::traits::{ChatOptions, LlmClient};

/// OpenAI 兼容客户端：持有 Client 与缺省 model 名
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    default_model: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, default_model: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            default_model: default_model.to_string(),
        }
    }

    /// 从 llm 配置段构建；api_key 未配置时从环境变量取
    pub fn from_config(section: &LlmSection) -> Self {
        let api_key = section
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();
        Self::new(&section.base_url, &api_key, &section.model)
    }

    fn to_openai_messages(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, String> {
        messages
            .iter()
            .map(|m| {
                let converted = match m.role {
                    Role::System => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessageArgs::default()
                            .content(m.content.clone())
                            .build()
                            .map_err(|e| e.to_string())?,
                    ),
                    Role::User => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(m.content.clone())
                            .build()
                            .map_err(|e| e.to_string())?,
                    ),
                    Role::Assistant => ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .content(m.content.clone())
                            .build()
                            .map_err(|e| e.to_string())?,
                    ),
                };
                Ok(converted)
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message], opts: &ChatOptions) -> Result<String, String> {
        let model = opts.model.as_deref().unwrap_or(&self.default_model);

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(model)
            .temperature(opts.temperature)
            .messages(Self::to_openai_messages(messages)?);
        if let Some(max_tokens) = opts.max_tokens {
            builder.max_tokens(max_tokens);
        }
        let request = builder.build().map_err(|e| e.to_string())?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}
