//! In-memory document: parsed tree plus the text it was loaded from.

use crate::services::html::HtmlDocument;

/// One HTML file held for editing.
///
/// `text()` is always derived from the tree, so the serialized form cannot
/// drift from the structure that was edited.
#[derive(Debug, Clone)]
pub struct Document {
    path: String,
    loaded_text: String,
    tree: HtmlDocument,
}

impl Document {
    pub fn parse(path: impl Into<String>, text: impl Into<String>) -> Self {
        let loaded_text = text.into();
        let tree = HtmlDocument::parse(&loaded_text);
        Self {
            path: path.into(),
            loaded_text,
            tree,
        }
    }

    /// Domain-relative path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Text as it was when loaded.
    pub fn loaded_text(&self) -> &str {
        &self.loaded_text
    }

    pub fn tree(&self) -> &HtmlDocument {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut HtmlDocument {
        &mut self.tree
    }

    /// Current serialized form.
    pub fn text(&self) -> String {
        self.tree.serialize()
    }

    pub fn is_modified(&self) -> bool {
        self.text() != self.loaded_text
    }
}
