//! Website Cloning
//!
//! Builds a domain from page screenshots: capture every page, turn each
//! image into HTML with a vision model, point navigation links at the local
//! copies and store the result.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use site_tailor_core::ProgressStatus;
use url::Url;

use crate::services::gateway::{strip_code_fences, ModelGateway, ModelRole};
use crate::services::html::HtmlDocument;
use crate::services::progress::ProgressReporter;
use crate::services::store::DocumentStore;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::validate_domain;

/// One captured page image.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// File name, e.g. `about.png`
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    /// Page stem the image stands for, e.g. `about`.
    pub fn page_stem(&self) -> String {
        page_stem(&self.name)
    }

    pub fn media_type(&self) -> &'static str {
        let extension = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "image/png",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub files: Vec<CapturedImage>,
}

/// Captures screenshots of a site's pages.
#[async_trait]
pub trait ScreenshotProvider: Send + Sync {
    async fn capture(&self, url: &str) -> AppResult<Capture>;
}

/// What the code generator knows about the page it is rebuilding.
#[derive(Debug, Clone)]
pub struct CodegenContext {
    pub page_name: String,
    /// Stems of every captured page, this one included
    pub sibling_pages: Vec<String>,
}

/// Turns a page image into HTML.
#[async_trait]
pub trait VisionCodegenProvider: Send + Sync {
    async fn generate(&self, image: &[u8], media_type: &str, context: &CodegenContext) -> AppResult<String>;
}

/// Vision code generation through any multimodal `LlmProvider`.
#[derive(Debug, Clone)]
pub struct LlmVisionCodegen {
    gateway: ModelGateway,
}

impl LlmVisionCodegen {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    fn prompt(context: &CodegenContext) -> String {
        let siblings = context
            .sibling_pages
            .iter()
            .map(|stem| format!("{}.html", stem))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Recreate the web page in this screenshot (\"{}\") as a single self-contained \
             HTML document with embedded CSS. Match layout, colors and text as closely as \
             possible. The site has these pages: {}. Link navigation items to those files. \
             Return only the HTML.",
            context.page_name, siblings
        )
    }
}

#[async_trait]
impl VisionCodegenProvider for LlmVisionCodegen {
    async fn generate(&self, image: &[u8], media_type: &str, context: &CodegenContext) -> AppResult<String> {
        let text = self
            .gateway
            .generate_from_image(image, media_type, &Self::prompt(context), ModelRole::Code)
            .await?;
        Ok(strip_code_fences(&text))
    }
}

/// Result of a clone run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSummary {
    pub domain: String,
    pub pages_written: Vec<String>,
    pub pages_failed: Vec<String>,
}

pub struct CloneService {
    screenshots: Arc<dyn ScreenshotProvider>,
    codegen: Arc<dyn VisionCodegenProvider>,
    store: DocumentStore,
    progress: ProgressReporter,
}

impl CloneService {
    pub fn new(
        screenshots: Arc<dyn ScreenshotProvider>,
        codegen: Arc<dyn VisionCodegenProvider>,
        store: DocumentStore,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            screenshots,
            codegen,
            store,
            progress,
        }
    }

    /// Capture `url` and write one HTML file per captured page. Pages are
    /// generated one at a time; a failed page is counted, not fatal.
    pub async fn clone_from_screenshots(&self, domain: &str, url: &str) -> AppResult<CloneSummary> {
        validate_domain(domain)?;
        self.progress
            .status(ProgressStatus::Started, domain, format!("Capturing {}", url));

        let capture = self.screenshots.capture(url).await.map_err(|e| {
            self.progress
                .status(ProgressStatus::Error, domain, e.user_message());
            e
        })?;
        if capture.files.is_empty() {
            self.progress
                .status(ProgressStatus::Error, domain, "No pages captured");
            return Err(AppError::not_found(format!("no pages captured from {}", url)));
        }

        let siblings: Vec<String> = capture.files.iter().map(|f| f.page_stem()).collect();
        let mut summary = CloneSummary {
            domain: domain.to_string(),
            ..Default::default()
        };

        for image in &capture.files {
            let file = format!("{}.html", image.page_stem());
            self.progress
                .file_status(ProgressStatus::Processing, domain, &file, "Generating page");
            match self.build_page(domain, image, &file, &siblings).await {
                Ok(()) => {
                    self.progress
                        .file_status(ProgressStatus::Completed, domain, &file, "Page generated");
                    summary.pages_written.push(file);
                }
                Err(e) => {
                    tracing::warn!("[clone] {} failed: {}", file, e);
                    self.progress
                        .file_status(ProgressStatus::Error, domain, &file, e.user_message());
                    summary.pages_failed.push(file);
                }
            }
        }

        self.progress.status(
            ProgressStatus::Finished,
            domain,
            format!(
                "Cloned {} page(s), {} failed",
                summary.pages_written.len(),
                summary.pages_failed.len()
            ),
        );
        Ok(summary)
    }

    async fn build_page(&self, domain: &str, image: &CapturedImage, file: &str, siblings: &[String]) -> AppResult<()> {
        let context = CodegenContext {
            page_name: image.page_stem(),
            sibling_pages: siblings.to_vec(),
        };
        let html = self
            .codegen
            .generate(&image.bytes, image.media_type(), &context)
            .await?;
        let html = strip_code_fences(&html);
        if !html.contains('<') {
            return Err(AppError::response_parse("generated page contains no markup"));
        }
        let html = rewrite_navigation_links(&html, siblings);
        self.store.write(domain, file, &html).await?;
        Ok(())
    }
}

/// Lowercased file stem with spaces as dashes.
pub fn page_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .trim()
        .to_lowercase()
        .replace(' ', "-")
}

/// Point links that name a sibling page at its local `<stem>.html`. The
/// site root maps to `index` when there is one.
pub fn rewrite_navigation_links(html: &str, sibling_pages: &[String]) -> String {
    let Ok(base) = Url::parse("http://clone.invalid/") else {
        return html.to_string();
    };
    let mut doc = HtmlDocument::parse(html);
    let mut rewritten = 0usize;

    for anchor in doc.elements_by_tag("a") {
        let Some(href) = doc.attr(anchor, "href").map(str::trim).map(String::from) else {
            continue;
        };
        if href.is_empty()
            || href.starts_with('#')
            || ["mailto:", "tel:", "javascript:", "data:"]
                .iter()
                .any(|scheme| href.to_ascii_lowercase().starts_with(scheme))
        {
            continue;
        }
        let Ok(target) = base.join(&href) else {
            continue;
        };
        let stem = target
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(page_stem))
            .unwrap_or_else(|| "index".to_string());
        if !sibling_pages.iter().any(|page| *page == stem) {
            continue;
        }

        let mut local = format!("{}.html", stem);
        if let Some(fragment) = target.fragment().filter(|f| !f.is_empty()) {
            local.push('#');
            local.push_str(fragment);
        }
        if local != href {
            doc.set_attr(anchor, "href", &local);
            rewritten += 1;
        }
    }

    tracing::debug!("[clone] rewrote {} navigation link(s)", rewritten);
    doc.serialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gateway::testing::ScriptedProvider;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct FixedScreens(Vec<&'static str>);

    #[async_trait]
    impl ScreenshotProvider for FixedScreens {
        async fn capture(&self, _url: &str) -> AppResult<Capture> {
            Ok(Capture {
                files: self
                    .0
                    .iter()
                    .map(|name| CapturedImage {
                        name: name.to_string(),
                        bytes: vec![0x89, b'P', b'N', b'G'],
                    })
                    .collect(),
            })
        }
    }

    fn siblings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_page_stem() {
        assert_eq!(page_stem("About Us.png"), "about-us");
        assert_eq!(page_stem("index.JPG"), "index");
    }

    #[test]
    fn test_rewrite_navigation_links() {
        let html = "<nav><a href=\"https://example.com/\">Home</a>\
            <a href=\"/about\">About</a><a href=\"contact.php#form\">Contact</a>\
            <a href=\"https://other.org/blog\">Blog</a><a href=\"#top\">Top</a></nav>";
        let out = rewrite_navigation_links(html, &siblings(&["index", "about", "contact"]));
        assert_eq!(
            out,
            "<nav><a href=\"index.html\">Home</a>\
            <a href=\"about.html\">About</a><a href=\"contact.html#form\">Contact</a>\
            <a href=\"https://other.org/blog\">Blog</a><a href=\"#top\">Top</a></nav>"
        );
    }

    #[tokio::test]
    async fn test_clone_writes_each_page() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path(), "versions");
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_multimodal(true)
                .with_responses([
                    "```html\n<html><body><a href=\"/about\">About</a></body></html>\n```",
                    "I cannot read this image",
                ]),
        );
        let codegen = Arc::new(LlmVisionCodegen::new(ModelGateway::new(provider.clone())));
        let service = CloneService::new(
            Arc::new(FixedScreens(vec!["index.png", "about.png"])),
            codegen,
            store.clone(),
            ProgressReporter::default(),
        );

        let summary = service
            .clone_from_screenshots("example", "https://example.com")
            .await
            .unwrap();
        assert_eq!(summary.pages_written, vec!["index.html".to_string()]);
        assert_eq!(summary.pages_failed, vec!["about.html".to_string()]);

        let index = store.read("example", "index.html").await.unwrap();
        assert_eq!(index, "<html><body><a href=\"about.html\">About</a></body></html>");
        assert!(provider.calls()[0].has_image);
        assert!(provider.calls()[0].prompt.contains("about.html"));
    }

    #[tokio::test]
    async fn test_empty_capture_is_not_found() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new().with_multimodal(true));
        let service = CloneService::new(
            Arc::new(FixedScreens(Vec::new())),
            Arc::new(LlmVisionCodegen::new(ModelGateway::new(provider))),
            DocumentStore::new(dir.path(), "versions"),
            ProgressReporter::default(),
        );
        let err = service
            .clone_from_screenshots("example", "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
