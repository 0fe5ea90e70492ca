//! Calling conventions for each kind of model request.

use serde::{Deserialize, Serialize};

/// A named profile selecting temperature, token budget and system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    /// Deterministic structured output (plans, JSON)
    Analysis,
    /// Design direction as prose
    Design,
    /// Complete HTML output
    Code,
    /// Review of a change
    Test,
    /// New elements and freer rewrites
    Creative,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Analysis => "analysis",
            ModelRole::Design => "design",
            ModelRole::Code => "code",
            ModelRole::Test => "test",
            ModelRole::Creative => "creative",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            ModelRole::Analysis => 0.0,
            ModelRole::Design => 0.7,
            ModelRole::Code => 0.2,
            ModelRole::Test => 0.1,
            ModelRole::Creative => 0.8,
        }
    }

    /// Token budget; `None` uses the provider's configured maximum.
    pub fn max_tokens(&self) -> Option<u32> {
        match self {
            ModelRole::Code | ModelRole::Creative => None,
            ModelRole::Analysis | ModelRole::Design | ModelRole::Test => Some(2048),
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            ModelRole::Analysis => {
                "You analyze website modification requests. Answer precisely and \
                 in the exact format requested. Do not add commentary."
            }
            ModelRole::Design => {
                "You are a senior web designer. Describe concrete visual design \
                 decisions: colors as hex values, spacing in px or rem, typography, \
                 states. Be specific and brief."
            }
            ModelRole::Code => {
                "You are an expert front-end developer. Return only HTML. Preserve \
                 everything the request does not ask you to change, including \
                 scripts, ids, event handler attributes and links."
            }
            ModelRole::Test => {
                "You review HTML changes against the request that motivated them. \
                 Point out concrete problems. If the change fully satisfies the \
                 request and breaks nothing, say \"Looks good\"."
            }
            ModelRole::Creative => {
                "You are a creative front-end developer. Produce polished, \
                 self-contained HTML using inline styles only."
            }
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
