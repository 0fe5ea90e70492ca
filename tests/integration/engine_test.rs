//! Engine Integration Tests
//!
//! Drives `ModificationEngine::modify` over a temporary workspace:
//! - targeted color edit with snapshot
//! - text replacement idempotence
//! - element creation
//! - unmatched targets leave files byte-identical
//! - routing of page-wide requests to the pipeline
//! - progress events and server restarts

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use site_tailor::config::EngineConfig;
use site_tailor::services::gateway::testing::ScriptedProvider;
use site_tailor::services::html::HtmlDocument;
use site_tailor::services::{DocumentStore, ModificationEngine, ServerHandle};
use site_tailor::{AppResult, ProgressStatus};

const SHOP: &str = "<!DOCTYPE html>
<html>
<head><title>Shop</title></head>
<body>
  <nav><a href=\"about.html\">About</a></nav>
  <main>
    <h1>Welcome to the shop</h1>
    <div class=\"actions\">
      <button id=\"buy\" onclick=\"buy()\">Buy now</button>
      <button id=\"cancel\">Cancel</button>
    </div>
  </main>
</body>
</html>
";

const ABOUT: &str = "<html><body><h1>About us</h1><button>Contact</button></body></html>\n";

const THREE_BUTTONS: &str = "<html><body>\
<button>Home</button><button>Pricing</button><button>Docs</button>\
</body></html>";

const FORM_BUTTONS: &str = "<html><body><form>\
<button>Submit</button><button>Cancel</button><button>Help</button>\
</form></body></html>";

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct RecordingServer {
    restarts: Mutex<Vec<String>>,
}

#[async_trait]
impl ServerHandle for RecordingServer {
    async fn restart(&self, domain: &str) -> AppResult<()> {
        self.restarts.lock().unwrap().push(domain.to_string());
        Ok(())
    }
}

struct Fixture {
    dir: TempDir,
    engine: ModificationEngine,
    provider: Arc<ScriptedProvider>,
}

impl Fixture {
    fn store(&self) -> DocumentStore {
        DocumentStore::new(self.dir.path(), "versions")
    }

    fn read(&self, file: &str) -> String {
        std::fs::read_to_string(self.dir.path().join("shop").join(file)).unwrap()
    }
}

fn fixture(provider: ScriptedProvider, pages: &[(&str, &str)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("shop");
    std::fs::create_dir_all(&site).unwrap();
    for (file, html) in pages {
        std::fs::write(site.join(file), html).unwrap();
    }

    let mut config = EngineConfig::default();
    config.workspace_root = dir.path().to_path_buf();
    config.pipeline = config.pipeline.clone().without_delays();

    let provider = Arc::new(provider);
    let engine = ModificationEngine::new(&config, provider.clone());
    Fixture {
        dir,
        engine,
        provider,
    }
}

// ============================================================================
// Element edits
// ============================================================================

#[tokio::test]
async fn test_color_instruction_changes_only_the_named_button() {
    let fx = fixture(
        ScriptedProvider::new().with_fallback("I would make it red."),
        &[("index.html", SHOP)],
    );

    let result = fx
        .engine
        .modify("shop", Some("index.html"), "make the Buy now button red")
        .await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.changed_count, 1);
    assert_eq!(result.files_updated, vec!["index.html".to_string()]);

    let expected = SHOP.replace(
        "<button id=\"buy\" onclick=\"buy()\">",
        "<button id=\"buy\" onclick=\"buy()\" style=\"color: red;\">",
    );
    assert_eq!(fx.read("index.html"), expected);

    let versions = fx.store().list_versions("shop", "index.html").await.unwrap();
    assert_eq!(versions.len(), 1);
    let snapshot = fx
        .store()
        .read_version("shop", "index.html", &versions[0].id)
        .await
        .unwrap();
    assert_eq!(snapshot, SHOP);
}

#[tokio::test]
async fn test_color_of_phrasing_touches_only_the_named_button() {
    let fx = fixture(
        ScriptedProvider::new().with_fallback("Sure, I can help with that."),
        &[("form.html", FORM_BUTTONS)],
    );

    let result = fx
        .engine
        .modify("shop", None, "change the color of the Submit button to red")
        .await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.changed_count, 1);
    assert_eq!(
        fx.read("form.html"),
        FORM_BUTTONS.replace(
            "<button>Submit</button>",
            "<button style=\"color: red;\">Submit</button>"
        )
    );
}

#[tokio::test]
async fn test_file_token_selects_the_page() {
    let fx = fixture(
        ScriptedProvider::new().with_fallback("nope"),
        &[("index.html", SHOP), ("about.html", ABOUT)],
    );

    let result = fx
        .engine
        .modify("shop", None, "@about.html change the Contact button text to 'Write to us'")
        .await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.files_updated, vec!["about.html".to_string()]);
    assert!(fx.read("about.html").contains("<button>Write to us</button>"));
    assert_eq!(fx.read("index.html"), SHOP);
}

#[tokio::test]
async fn test_simple_replacement_is_idempotent() {
    let fx = fixture(
        ScriptedProvider::new(),
        &[("index.html", SHOP), ("about.html", ABOUT)],
    );
    let instruction = "@index.html change \"Buy now\" to \"Order today\"";

    let first = fx.engine.modify("shop", None, instruction).await;
    assert!(first.success, "{}", first.message);
    assert_eq!(first.changed_count, 1);
    assert_eq!(first.files_updated, vec!["index.html".to_string()]);
    let after_first = fx.read("index.html");
    assert!(after_first.contains(">Order today</button>"));

    let second = fx.engine.modify("shop", None, instruction).await;
    assert!(!second.success);
    assert_eq!(second.changed_count, 0);
    assert_eq!(fx.read("index.html"), after_first);
    assert_eq!(fx.provider.call_count(), 0);
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_creation_appends_without_removing_anything() {
    let fx = fixture(
        ScriptedProvider::new().with_responses([
            "```html\n<button style=\"padding: 8px 16px;\">Subscribe</button>\n```",
        ]),
        &[("index.html", SHOP), ("about.html", ABOUT)],
    );

    let result = fx
        .engine
        .modify("shop", None, "add a button that says Subscribe")
        .await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.files_updated, vec!["index.html".to_string()]);

    let updated = fx.read("index.html");
    assert!(updated.len() > SHOP.len());
    let doc = HtmlDocument::parse(&updated);
    let buttons = doc.elements_by_tag("button");
    assert_eq!(buttons.len(), 3);
    assert_eq!(doc.attr(buttons[0], "id"), Some("buy"));
    assert_eq!(doc.attr(buttons[1], "id"), Some("cancel"));
    assert_eq!(doc.visible_text(buttons[2]), "Subscribe");

    let container = doc.parent(buttons[2]).unwrap();
    assert!(doc.has_class(container, "actions"));
    assert_eq!(doc.element_children(container).last(), Some(&buttons[2]));
    assert_eq!(fx.read("about.html"), ABOUT);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unmatched_target_leaves_file_byte_identical() {
    let fx = fixture(
        ScriptedProvider::new().with_fallback("None of these look right."),
        &[("three.html", THREE_BUTTONS)],
    );

    let result = fx
        .engine
        .modify("shop", Some("three.html"), "make the Nonexistent button red")
        .await;
    assert!(!result.success);
    assert_eq!(result.changed_count, 0);
    assert!(result.message.contains("nonexistent"), "{}", result.message);
    assert_eq!(fx.read("three.html"), THREE_BUTTONS);
    assert!(fx
        .store()
        .list_versions("shop", "three.html")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_model_picks_among_unmatched_candidates() {
    let fx = fixture(
        ScriptedProvider::new()
            .with_responses(["{\"matches\": [1]}"])
            .with_fallback("no html here"),
        &[("three.html", THREE_BUTTONS)],
    );

    let result = fx
        .engine
        .modify("shop", Some("three.html"), "make the Plans button green")
        .await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.changed_count, 1);
    assert!(fx
        .read("three.html")
        .contains("<button style=\"color: green;\">Pricing</button>"));
}

#[tokio::test]
async fn test_missing_domain_is_a_failure_result() {
    let fx = fixture(ScriptedProvider::new(), &[("index.html", SHOP)]);

    let result = fx.engine.modify("ghost", None, "make the Buy button red").await;
    assert!(!result.success);
    assert!(result.message.starts_with("Not found"), "{}", result.message);
}

#[tokio::test]
async fn test_path_traversal_is_rejected() {
    let fx = fixture(ScriptedProvider::new(), &[("index.html", SHOP)]);

    let result = fx
        .engine
        .modify("shop", Some("../index.html"), "make the Buy button red")
        .await;
    assert!(!result.success);
    assert!(result.message.starts_with("Invalid request"), "{}", result.message);
}

// ============================================================================
// Routing, progress and restarts
// ============================================================================

#[tokio::test]
async fn test_page_wide_request_runs_the_pipeline() {
    let fx = fixture(
        ScriptedProvider::new().with_responses([
            "1. Modernize every page",
            "Use #0f172a text on white",
            "<html><body>About, modern</body></html>",
            "Looks good",
            "Use #0f172a text on white",
            "<html><body>Shop, modern</body></html>",
            "Looks good",
        ]),
        &[("index.html", SHOP), ("about.html", ABOUT)],
    );

    let result = fx
        .engine
        .modify("shop", None, "redesign the whole website to feel modern")
        .await;
    assert!(result.success, "{}", result.message);
    assert_eq!(
        result.files_updated,
        vec!["about.html".to_string(), "index.html".to_string()]
    );
    assert_eq!(fx.read("about.html"), "<html><body>About, modern</body></html>");
    assert_eq!(fx.read("index.html"), "<html><body>Shop, modern</body></html>");
}

#[tokio::test]
async fn test_progress_events_and_restart() {
    let server = Arc::new(RecordingServer::default());
    let fx = fixture(
        ScriptedProvider::new().with_fallback("?"),
        &[("index.html", SHOP)],
    );
    let engine = fx.engine.with_server(server.clone());
    let mut rx = engine.progress().subscribe();

    let result = engine
        .modify("shop", Some("index.html"), "make the Cancel button gray")
        .await;
    assert!(result.success, "{}", result.message);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.first().map(|e| e.status), Some(ProgressStatus::Started));
    assert_eq!(events.last().map(|e| e.status), Some(ProgressStatus::Finished));
    assert!(events.iter().any(|e| {
        e.status == ProgressStatus::Completed
            && e.file.as_deref() == Some("index.html")
            && e.changed_count == Some(1)
    }));
    assert_eq!(*server.restarts.lock().unwrap(), vec!["shop".to_string()]);
}
