//! Where new elements go and what they look like when the model is no help.

use crate::services::html::{escape_attribute, escape_text, HtmlDocument, NodeId};
use crate::services::locator::interactive_elements;

/// Class fragments that mark a group of actions.
const GROUP_CLASS_HINTS: &[&str] = &["button-group", "btn-group", "actions", "buttons", "cta"];

const DEFAULT_BUTTON_STYLE: &str = "padding: 10px 20px; border: none; border-radius: 6px; \
     background-color: #2563eb; color: #ffffff; font-size: 16px; cursor: pointer;";

const MAX_STYLE_BLOCK: usize = 2000;

/// Pick the element a new button is appended to: an explicit button group,
/// then the parent of two or more interactive elements, then `main`,
/// `.content`, `.container`, `body`, and finally the document root.
pub fn choose_container(tree: &HtmlDocument) -> NodeId {
    let elements = tree.elements();

    let grouped = elements.iter().copied().find(|&id| {
        tree.classes(id).iter().any(|class| {
            let class = class.to_ascii_lowercase();
            GROUP_CLASS_HINTS.iter().any(|hint| class.contains(hint))
        })
    });
    if let Some(id) = grouped {
        return id;
    }

    let interactive = interactive_elements(tree);
    let shared_parent = interactive.iter().find_map(|&id| {
        let parent = tree.parent(id)?;
        let siblings = interactive
            .iter()
            .filter(|&&other| tree.parent(other) == Some(parent))
            .count();
        (siblings >= 2 && tree.is_element(parent)).then_some(parent)
    });
    if let Some(id) = shared_parent {
        return id;
    }

    tree.first_element_by_tag("main")
        .or_else(|| elements.iter().copied().find(|&id| tree.has_class(id, "content")))
        .or_else(|| elements.iter().copied().find(|&id| tree.has_class(id, "container")))
        .or_else(|| tree.first_element_by_tag("body"))
        .unwrap_or_else(|| tree.root())
}

/// Markup of up to `limit` existing buttons, those inside `container` first.
pub fn nearby_buttons(tree: &HtmlDocument, container: NodeId, limit: usize) -> Vec<String> {
    let inside: Vec<NodeId> = tree
        .descendants(container)
        .into_iter()
        .filter(|&id| tree.tag_name(id) == Some("button"))
        .collect();
    let pool = if inside.is_empty() {
        tree.elements_by_tag("button")
    } else {
        inside
    };
    pool.into_iter()
        .take(limit)
        .map(|id| tree.outer_html(id))
        .collect()
}

/// Contents of the page's `<style>` blocks, truncated.
pub fn page_style_block(tree: &HtmlDocument) -> Option<String> {
    let mut css = String::new();
    for id in tree.elements_by_tag("style") {
        css.push_str(tree.inner_html(id).trim());
        css.push('\n');
    }
    let css = css.trim();
    if css.is_empty() {
        return None;
    }
    if css.len() <= MAX_STYLE_BLOCK {
        return Some(css.to_string());
    }
    let mut end = MAX_STYLE_BLOCK;
    while !css.is_char_boundary(end) {
        end -= 1;
    }
    Some(css[..end].to_string())
}

/// A plain button carrying `label`, styled like the first styled button on
/// the page.
pub fn synthesize_button(tree: &HtmlDocument, label: &str) -> String {
    let style = tree
        .elements_by_tag("button")
        .into_iter()
        .find_map(|id| tree.attr(id, "style").filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_BUTTON_STYLE);
    format!(
        "<button type=\"button\" style=\"{}\">{}</button>",
        escape_attribute(style),
        escape_text(label)
    )
}

/// A usable creation result holds at least one element and no document
/// scaffolding.
pub fn is_usable_creation(markup: &str) -> bool {
    let (fragment, elements) = crate::services::html::top_level_elements(markup);
    !elements.is_empty()
        && elements.iter().all(|&id| {
            !matches!(
                fragment.tag_name(id),
                Some("html") | Some("head") | Some("body")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_class_wins() {
        let tree = HtmlDocument::parse(
            "<body><main><div class=\"hero-actions\"><a href=\"#\">Go</a></div></main></body>",
        );
        let container = choose_container(&tree);
        assert!(tree.has_class(container, "hero-actions"));
    }

    #[test]
    fn test_shared_parent_of_buttons() {
        let tree = HtmlDocument::parse(
            "<body><main><p>x</p><div id=\"row\"><button>A</button><button>B</button></div></main></body>",
        );
        let container = choose_container(&tree);
        assert_eq!(tree.attr(container, "id"), Some("row"));
    }

    #[test]
    fn test_structural_fallbacks() {
        let tree = HtmlDocument::parse("<body><div class=\"container\"><p>x</p></div></body>");
        assert!(tree.has_class(choose_container(&tree), "container"));

        let tree = HtmlDocument::parse("<html><body><p>x</p></body></html>");
        assert_eq!(tree.tag_name(choose_container(&tree)), Some("body"));

        let tree = HtmlDocument::parse("<p>x</p>");
        assert_eq!(choose_container(&tree), tree.root());
    }

    #[test]
    fn test_synthesized_button_copies_style() {
        let tree = HtmlDocument::parse("<button style=\"color: red;\">A</button>");
        assert_eq!(
            synthesize_button(&tree, "Sign <up>"),
            "<button type=\"button\" style=\"color: red;\">Sign &lt;up&gt;</button>"
        );
        let bare = HtmlDocument::parse("<p></p>");
        assert!(synthesize_button(&bare, "Go").contains("background-color: #2563eb"));
    }

    #[test]
    fn test_usable_creation() {
        assert!(is_usable_creation("<button>Go</button>"));
        assert!(!is_usable_creation("Sure, here you go"));
        assert!(!is_usable_creation("<html><body><button>Go</button></body></html>"));
    }

    #[test]
    fn test_style_block() {
        let tree = HtmlDocument::parse("<style> .a { color: red } </style><p></p>");
        assert_eq!(page_style_block(&tree).as_deref(), Some(".a { color: red }"));
        assert!(page_style_block(&HtmlDocument::parse("<p></p>")).is_none());
    }
}
