//! Test doubles for the model boundary.
//!
//! `ScriptedProvider` replays queued completions or errors in order and
//! records every request, so retry policy, prompt routing and pipeline
//! control flow can be exercised without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use site_tailor_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageContent,
    ProviderConfig, StopReason, UsageStats,
};

/// One request seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: Option<String>,
    /// Concatenated text blocks of all messages
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub has_image: bool,
}

/// Replays scripted completions.
pub struct ScriptedProvider {
    config: ProviderConfig,
    script: Mutex<VecDeque<LlmResult<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
    fallback: Option<String>,
    multimodal: bool,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            config: ProviderConfig {
                model: "scripted".to_string(),
                ..Default::default()
            },
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fallback: None,
            multimodal: false,
        }
    }

    /// Queue successful completions in order.
    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for response in responses {
            self.push_ok(response);
        }
        self
    }

    /// Completion returned once the script runs out. Without one, an
    /// exhausted script answers with a server error.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    pub fn with_multimodal(mut self, enabled: bool) -> Self {
        self.multimodal = enabled;
        self
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.script_lock().push_back(Ok(text.into()));
    }

    pub fn push_err(&self, error: LlmError) {
        self.script_lock().push_back(Err(error));
    }

    /// Queue `count` rate-limit errors carrying an optional retry-after hint.
    pub fn push_rate_limited(&self, count: usize, retry_after: Option<u32>) {
        for _ in 0..count {
            self.push_err(LlmError::RateLimited {
                message: "scripted rate limit".to_string(),
                retry_after,
            });
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn script_lock(&self) -> std::sync::MutexGuard<'_, VecDeque<LlmResult<String>>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_multimodal(&self) -> bool {
        self.multimodal
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let prompt = messages
            .iter()
            .flat_map(|m| m.content.iter())
            .filter_map(|c| match c {
                MessageContent::Text { text } => Some(text.as_str()),
                MessageContent::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                system,
                prompt,
                temperature: request_options.temperature_override,
                max_tokens: request_options.max_tokens_override,
                has_image: messages.iter().any(Message::has_image),
            });

        let next = self.script_lock().pop_front();
        let text = match next {
            Some(result) => result?,
            None => match &self.fallback {
                Some(text) => text.clone(),
                None => {
                    return Err(LlmError::ServerError {
                        message: "script exhausted".to_string(),
                        status: None,
                    })
                }
            },
        };
        Ok(LlmResponse {
            content: Some(text),
            stop_reason: StopReason::EndTurn,
            usage: UsageStats::default(),
            model: self.config.model.clone(),
        })
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
