//! Progress Reporter
//!
//! Fire-and-forget publish/subscribe for `ProgressEvent`s. Emitting never
//! blocks and never fails: with no subscribers the event is dropped, and a
//! slow subscriber sees `Lagged` rather than slowing the engine.

use site_tailor_core::{ProgressEvent, ProgressStatus};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: broadcast::Sender<ProgressEvent>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ProgressReporter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ProgressEvent) {
        tracing::trace!("[progress] {} {}: {}", event.status, event.domain, event.message);
        let _ = self.sender.send(event);
    }

    /// Shorthand for a domain-level event.
    pub fn status(&self, status: ProgressStatus, domain: &str, message: impl Into<String>) {
        self.emit(ProgressEvent::new(status, domain, message));
    }

    /// Shorthand for a file-level event.
    pub fn file_status(
        &self,
        status: ProgressStatus,
        domain: &str,
        file: &str,
        message: impl Into<String>,
    ) {
        self.emit(ProgressEvent::new(status, domain, message).with_file(file));
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let reporter = ProgressReporter::new(8);
        let mut rx = reporter.subscribe();
        reporter.status(ProgressStatus::Started, "site", "go");
        reporter.file_status(ProgressStatus::Completed, "site", "index.html", "done");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.status, ProgressStatus::Started);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.file.as_deref(), Some("index.html"));
    }

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        let reporter = ProgressReporter::new(1);
        reporter.status(ProgressStatus::Error, "site", "nobody listening");
        assert_eq!(reporter.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_affect_others() {
        let reporter = ProgressReporter::new(4);
        let dropped = reporter.subscribe();
        let mut kept = reporter.subscribe();
        drop(dropped);
        reporter.status(ProgressStatus::Finished, "site", "end");
        assert_eq!(kept.recv().await.unwrap().status, ProgressStatus::Finished);
    }
}
