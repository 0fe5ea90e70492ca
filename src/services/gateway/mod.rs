//! Model Gateway
//!
//! The single entry point for model calls. Adds role profiles, retry with
//! backoff on rate limits, and cleanup of completions into HTML or JSON.

mod response;
mod roles;
pub mod testing;

pub use response::{extract_json, parse_json, strip_code_fences};
pub use roles::ModelRole;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use site_tailor_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::config::EngineConfig;
use crate::utils::error::{AppError, AppResult};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_MAX_DELAY_SECS: u64 = 60;

/// Per-call options.
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub role: ModelRole,
    /// Overrides the role's token budget
    pub max_tokens: Option<u32>,
}

impl From<ModelRole> for GenerateOptions {
    fn from(role: ModelRole) -> Self {
        Self {
            role,
            max_tokens: None,
        }
    }
}

/// Retrying wrapper around an `LlmProvider`.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn LlmProvider>,
    max_attempts: u32,
    max_delay_secs: u64,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }

    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &EngineConfig) -> Self {
        Self::new(provider).with_retry_policy(config.max_retry_attempts, config.retry_max_delay_secs)
    }

    /// Total attempts per call (at least one) and the cap on a single wait.
    pub fn with_retry_policy(mut self, max_attempts: u32, max_delay_secs: u64) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.max_delay_secs = max_delay_secs;
        self
    }

    pub fn supports_vision(&self) -> bool {
        self.provider.supports_multimodal()
    }

    /// Generate text for a prompt under a role.
    pub async fn generate(&self, prompt: &str, role: ModelRole) -> AppResult<String> {
        self.generate_text(prompt, role.into()).await
    }

    pub async fn generate_text(&self, prompt: &str, options: GenerateOptions) -> AppResult<String> {
        self.send_with_retry(vec![Message::user(prompt)], options).await
    }

    /// Generate HTML: fences are stripped and an empty result is an error.
    pub async fn generate_html(&self, prompt: &str, role: ModelRole) -> AppResult<String> {
        let text = self.generate(prompt, role).await?;
        let html = strip_code_fences(&text);
        if html.is_empty() {
            return Err(AppError::response_parse("model returned no HTML"));
        }
        Ok(html)
    }

    /// Generate and deserialize a JSON value.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str, role: ModelRole) -> AppResult<T> {
        let text = self.generate(prompt, role).await?;
        parse_json(&text)
    }

    /// Send an image plus instructions. Fails with `Upstream` if the
    /// provider cannot read images.
    pub async fn generate_from_image(
        &self,
        image: &[u8],
        media_type: &str,
        prompt: &str,
        role: ModelRole,
    ) -> AppResult<String> {
        if !self.provider.supports_multimodal() {
            return Err(AppError::upstream(format!(
                "model {} does not accept images",
                self.provider.model()
            )));
        }
        let message = Message::user_with_image(image, media_type, prompt);
        self.send_with_retry(vec![message], role.into()).await
    }

    async fn send_with_retry(&self, messages: Vec<Message>, options: GenerateOptions) -> AppResult<String> {
        let request_options = LlmRequestOptions {
            temperature_override: Some(options.role.temperature()),
            max_tokens_override: options.max_tokens.or(options.role.max_tokens()),
        };
        let system = Some(options.role.system_prompt().to_string());

        for attempt in 0..self.max_attempts {
            tracing::debug!(
                "[gateway] {} call via {} (attempt {}/{})",
                options.role,
                self.provider.name(),
                attempt + 1,
                self.max_attempts
            );
            let result = self
                .provider
                .send_message(messages.clone(), system.clone(), request_options.clone())
                .await;
            match result {
                Ok(response) => {
                    if response.is_truncated() {
                        tracing::warn!(
                            "[gateway] {} response hit the token limit ({} output tokens)",
                            options.role,
                            response.usage.output_tokens
                        );
                    }
                    return Ok(response.text().to_string());
                }
                Err(e) if e.is_rate_limited() && attempt + 1 < self.max_attempts => {
                    let backoff = 1u64
                        .checked_shl(attempt)
                        .unwrap_or(u64::MAX)
                        .min(self.max_delay_secs);
                    let wait = e
                        .retry_after_secs()
                        .map_or(backoff, |hint| hint.min(self.max_delay_secs));
                    tracing::warn!(
                        "[gateway:retry] {} on attempt {}/{}, retrying in {}s",
                        e,
                        attempt + 1,
                        self.max_attempts,
                        wait
                    );
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                Err(e) => {
                    if e.is_rate_limited() {
                        tracing::error!(
                            "[gateway:retry] giving up after {} attempts: {}",
                            self.max_attempts,
                            e
                        );
                    } else {
                        tracing::warn!("[gateway] {} call failed: {}", options.role, e);
                    }
                    return Err(e.into());
                }
            }
        }
        Err(AppError::internal("retry loop ended without a result"))
    }
}
