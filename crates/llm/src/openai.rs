//! OpenAI Provider
//!
//! Implementation of the LlmProvider trait for OpenAI's Chat Completions API.
//! Any endpoint that speaks the same protocol (DeepSeek, local gateways) can be
//! reached through `base_url`.

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{missing_api_key_error, parse_http_error, parse_retry_after, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageContent, MessageRole,
    ProviderConfig, StopReason, UsageStats,
};
use crate::http_client::build_http_client;

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref())?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut openai_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(sys) = system {
            openai_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        openai_messages.extend(messages.iter().map(|m| self.message_to_openai(m)));

        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.effective_max_tokens(request_options),
            "temperature": self.config.effective_temperature(request_options),
            "messages": openai_messages,
        })
    }

    /// Convert a Message to OpenAI format
    ///
    /// Text-only messages use the plain string form; messages with images use
    /// the content-part array with data URLs.
    fn message_to_openai(&self, message: &Message) -> serde_json::Value {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        if !message.has_image() {
            let text: String = message
                .content
                .iter()
                .filter_map(|c| match c {
                    MessageContent::Text { text } => Some(text.as_str()),
                    MessageContent::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n");
            return serde_json::json!({ "role": role, "content": text });
        }

        let parts: Vec<serde_json::Value> = message
            .content
            .iter()
            .map(|c| match c {
                MessageContent::Text { text } => serde_json::json!({
                    "type": "text",
                    "text": text
                }),
                MessageContent::Image { media_type, data } => serde_json::json!({
                    "type": "image_url",
                    "image_url": { "url": format!("data:{};base64,{}", media_type, data) }
                }),
            })
            .collect();

        serde_json::json!({ "role": role, "content": parts })
    }

    /// Parse a response from the OpenAI API
    fn parse_response(&self, response: &OpenAIResponse) -> LlmResult<LlmResponse> {
        let choice = response.choices.first().ok_or_else(|| LlmError::ParseError {
            message: "response contained no choices".to_string(),
        })?;

        let usage = response
            .usage
            .as_ref()
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content: choice.message.content.clone().filter(|c| !c.is_empty()),
            stop_reason: choice
                .finish_reason
                .as_deref()
                .map(StopReason::from)
                .unwrap_or(StopReason::EndTurn),
            usage,
            model: response.model.clone(),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_multimodal(&self) -> bool {
        let model = self.config.model.to_lowercase();
        model.contains("gpt-4o") || model.contains("gpt-4.1") || model.contains("vision")
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;

        if !self.supports_multimodal() && messages.iter().any(Message::has_image) {
            return Err(LlmError::Unsupported {
                message: format!("model {} does not accept images", self.config.model),
            });
        }

        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        let response = self
            .client
            .post(self.base_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "openai", retry_after));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        self.parse_response(&openai_response)
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
