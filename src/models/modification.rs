//! Modification Result Models

use serde::{Deserialize, Serialize};

/// Outcome of one `modify` request, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModificationResult {
    pub success: bool,
    pub message: String,
    pub changed_count: usize,
    pub files_updated: Vec<String>,
    pub files_failed: Vec<String>,
}

impl ModificationResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Result of applying an instruction to one in-memory document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub updated_text: String,
    pub changed_count: usize,
    pub failed_count: usize,
}
