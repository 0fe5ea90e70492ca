//! Progress Events
//!
//! Status events emitted while a site is being modified. The engine publishes
//! them on an in-process channel; transports (SSE, WebSocket, the CLI) forward
//! them as JSON objects keyed by `status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status carried by every progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// An operation (modification, pipeline batch, clone) has begun
    Started,
    /// Work on a single file or pipeline stage is underway
    Processing,
    /// A single file was updated
    Completed,
    /// A file was left untouched (nothing matched, nothing changed)
    Skipped,
    /// A file or stage failed
    Error,
    /// The whole operation is over; carries the summary message
    Finished,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressStatus::Started => write!(f, "started"),
            ProgressStatus::Processing => write!(f, "processing"),
            ProgressStatus::Completed => write!(f, "completed"),
            ProgressStatus::Skipped => write!(f, "skipped"),
            ProgressStatus::Error => write!(f, "error"),
            ProgressStatus::Finished => write!(f, "finished"),
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Pipeline stage ("planning", "designing", "coding", "testing", "refining")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_count: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(status: ProgressStatus, domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            domain: domain.into(),
            file: None,
            stage: None,
            message: message.into(),
            changed_count: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_changed_count(mut self, count: usize) -> Self {
        self.changed_count = Some(count);
        self
    }

    /// True for statuses after which no further events follow for the operation.
    pub fn is_terminal(&self) -> bool {
        self.status == ProgressStatus::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ProgressStatus::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
    }

    #[test]
    fn test_event_is_discriminated_by_status() {
        let event = ProgressEvent::new(ProgressStatus::Completed, "acme", "updated 1 element")
            .with_file("index.html")
            .with_changed_count(1);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["file"], "index.html");
        assert_eq!(value["changedCount"], 1);
        assert!(value.get("stage").is_none());
    }

    #[test]
    fn test_only_finished_is_terminal() {
        assert!(ProgressEvent::new(ProgressStatus::Finished, "d", "done").is_terminal());
        assert!(!ProgressEvent::new(ProgressStatus::Error, "d", "boom").is_terminal());
    }
}
