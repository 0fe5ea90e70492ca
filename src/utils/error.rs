//! Error Handling
//!
//! Unified error type for the engine. Variants mirror the failure kinds the
//! engine distinguishes when deciding whether to retry, fall back, skip a
//! document, or report a failure to the caller.

use site_tailor_core::CoreError;
use site_tailor_llm::LlmError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Instruction could not be mapped to an action
    #[error("Parse error: {0}")]
    Parse(String),

    /// No element matched the target description
    #[error("No match: {0}")]
    NoMatch(String),

    /// Model calls were rate limited past the retry budget
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    /// Non-retryable model failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Model output could not be used as the requested shape
    #[error("Response parse error: {0}")]
    ResponseParse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn no_match(msg: impl Into<String>) -> Self {
        Self::NoMatch(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn response_parse(msg: impl Into<String>) -> Self {
        Self::ResponseParse(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this came from the model side (rate limit, upstream, bad output).
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Upstream(_) | Self::ResponseParse(_)
        )
    }

    /// Short message suitable for a caller-facing result. Detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoMatch(target) => format!("No element matched '{}'", target),
            Self::NotFound(what) => format!("Not found: {}", what),
            Self::Validation(msg) => format!("Invalid request: {}", msg),
            Self::RateLimited { .. } => {
                "The model service is rate limiting requests; try again later".to_string()
            }
            Self::Upstream(_) | Self::ResponseParse(_) => {
                "The model service could not complete the request".to_string()
            }
            Self::Parse(_) => "Could not understand the instruction".to_string(),
            Self::Config(_) => "The engine is misconfigured".to_string(),
            Self::Io(_) | Self::Serialization(_) | Self::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(msg) => Self::Config(msg),
            CoreError::Io(e) => Self::Io(e),
            CoreError::Serialization(e) => Self::Serialization(e),
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::NotFound(msg) => Self::NotFound(msg),
            CoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited {
                message,
                retry_after,
            } => Self::RateLimited {
                message,
                retry_after: retry_after.map(u64::from),
            },
            other => Self::Upstream(other.to_string()),
        }
    }
}

/// Convert AppError to a plain string
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
