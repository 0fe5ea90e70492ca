//! Site Tailor LLM
//!
//! Provides a unified interface for the text and vision generation services
//! the modification engine calls:
//! - Anthropic Claude (Messages API)
//! - OpenAI and OpenAI-compatible endpoints (Chat Completions API)
//!
//! Also includes the HTTP client factory and the provider factory.

pub mod anthropic;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;

/// Create an LLM provider from a ProviderConfig.
///
/// Maps `ProviderType` to the concrete provider implementation.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
    };
    Ok(provider)
}
