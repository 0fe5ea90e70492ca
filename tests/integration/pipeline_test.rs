//! Pipeline Integration Tests
//!
//! Termination and partial-failure behavior of the refinement loop.

use std::sync::Arc;

use tempfile::TempDir;

use site_tailor::config::PipelineSettings;
use site_tailor::models::PipelineState;
use site_tailor::services::gateway::testing::ScriptedProvider;
use site_tailor::services::{DocumentStore, ModelGateway, PipelineOrchestrator, ProgressReporter};
use site_tailor_llm::LlmError;

async fn orchestrator(provider: &Arc<ScriptedProvider>, max_iterations: u32) -> (TempDir, PipelineOrchestrator) {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path(), "versions");
    for file in ["a.html", "b.html", "c.html"] {
        store
            .write("site", file, "<html><body>old</body></html>")
            .await
            .unwrap();
    }
    let mut settings = PipelineSettings::default().without_delays();
    settings.max_iterations = max_iterations;
    let orchestrator = PipelineOrchestrator::new(
        ModelGateway::new(provider.clone()),
        store,
        settings,
        ProgressReporter::default(),
    );
    (dir, orchestrator)
}

fn files() -> Vec<String> {
    ["a.html", "b.html", "c.html"].iter().map(|f| f.to_string()).collect()
}

#[tokio::test]
async fn test_every_document_terminates_within_the_cap() {
    for max_iterations in [0, 1, 3] {
        let provider = Arc::new(
            ScriptedProvider::new().with_fallback("<html><body>still not right</body></html>"),
        );
        let (_dir, orchestrator) = orchestrator(&provider, max_iterations).await;

        let summary = orchestrator.run_batch("site", &files(), "fix everything").await;
        assert_eq!(summary.outcomes.len(), 3);
        for outcome in &summary.outcomes {
            assert_eq!(outcome.state, PipelineState::Done);
            assert_eq!(outcome.coding_invocations, 1 + max_iterations);
            assert!(outcome.written);
        }
    }
}

#[tokio::test]
async fn test_one_failure_does_not_abort_the_batch() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_ok("plan");
    // a.html
    provider.push_ok("design");
    provider.push_ok("<html><body>a</body></html>");
    provider.push_ok("Great job");
    // b.html fails during coding
    provider.push_ok("design");
    provider.push_err(LlmError::ServerError {
        message: "overloaded".to_string(),
        status: Some(529),
    });
    // c.html
    provider.push_ok("design");
    provider.push_ok("<html><body>c</body></html>");
    provider.push_ok("Passed all checks");

    let (dir, orchestrator) = orchestrator(&provider, 3).await;
    let summary = orchestrator.run_batch("site", &files(), "tidy").await;

    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.abandoned_files(), vec!["b.html".to_string()]);
    assert_eq!(
        summary.written_files(),
        vec!["a.html".to_string(), "c.html".to_string()]
    );
    let b = std::fs::read_to_string(dir.path().join("site").join("b.html")).unwrap();
    assert_eq!(b, "<html><body>old</body></html>");
}
