//! Arena-backed HTML document that serializes back to its source.
//!
//! Each node keeps the raw text it was parsed from. Untouched nodes write
//! their raw text verbatim; an element whose attributes were changed
//! re-renders only its start tag. This keeps every edit local: bytes
//! outside the modified subtree never move.

use super::entities::{decode_entities, escape_attribute, escape_text};
use super::style::StyleDeclarations;
use super::tokenizer::{is_void_element, tokenize, Attribute, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct ElementData {
    name: String,
    attributes: Vec<Attribute>,
    /// Source text of the start tag; cleared when attributes change.
    raw_start: Option<String>,
    /// Source text of the end tag, if one was present.
    raw_end: Option<String>,
    self_closing: bool,
}

#[derive(Debug, Clone)]
enum NodeKind {
    /// Container for top-level nodes (document root or fragment holder).
    Root,
    Doctype(String),
    Comment(String),
    Text(String),
    /// End tag with no matching open element.
    StrayEndTag(String),
    Element(ElementData),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<Node>,
    root: NodeId,
}

fn implied_close(opening: &str, current: &str) -> bool {
    match opening {
        "p" | "li" | "option" | "tr" => current == opening,
        "td" | "th" => matches!(current, "td" | "th"),
        "dt" | "dd" => matches!(current, "dt" | "dd"),
        _ => false,
    }
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.alloc(NodeKind::Root, None);
        let root = doc.root;
        doc.build_under(root, source);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Parse `source` and attach the resulting nodes as children of `container`.
    fn build_under(&mut self, container: NodeId, source: &str) {
        let mut open: Vec<NodeId> = Vec::new();
        for token in tokenize(source) {
            let current = open.last().copied().unwrap_or(container);
            match token {
                Token::Doctype(raw) => {
                    self.alloc(NodeKind::Doctype(raw.to_string()), Some(current));
                }
                Token::Comment(raw) => {
                    self.alloc(NodeKind::Comment(raw.to_string()), Some(current));
                }
                Token::Text(raw) => {
                    self.alloc(NodeKind::Text(raw.to_string()), Some(current));
                }
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                    raw,
                } => {
                    let mut parent = current;
                    if let Some(&top) = open.last() {
                        if self
                            .tag_name(top)
                            .is_some_and(|current_name| implied_close(&name, current_name))
                        {
                            open.pop();
                            parent = open.last().copied().unwrap_or(container);
                        }
                    }
                    let is_void = is_void_element(&name);
                    let id = self.alloc(
                        NodeKind::Element(ElementData {
                            name,
                            attributes,
                            raw_start: Some(raw.to_string()),
                            raw_end: None,
                            self_closing,
                        }),
                        Some(parent),
                    );
                    if !is_void && !self_closing {
                        open.push(id);
                    }
                }
                Token::EndTag { name, raw } => {
                    let matched = open
                        .iter()
                        .rposition(|&id| self.tag_name(id) == Some(name.as_str()));
                    match matched {
                        Some(pos) => {
                            let id = open[pos];
                            if let NodeKind::Element(data) = &mut self.nodes[id.0].kind {
                                data.raw_end = Some(raw.to_string());
                            }
                            open.truncate(pos);
                        }
                        None => {
                            self.alloc(NodeKind::StrayEndTag(raw.to_string()), Some(current));
                        }
                    }
                }
            }
        }
    }

    /// Parse markup into detached nodes and return the top-level ids.
    fn parse_fragment(&mut self, markup: &str) -> Vec<NodeId> {
        let holder = self.alloc(NodeKind::Root, None);
        self.build_under(holder, markup);
        let children = std::mem::take(&mut self.nodes[holder.0].children);
        for &child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    // ── Queries ─────────────────────────────────────────────────────────

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercased tag name, or `None` for non-element nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// Whether the node is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every attached element in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.is_element(id))
            .collect()
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.elements()
            .into_iter()
            .filter(|&id| self.tag_name(id) == Some(tag.as_str()))
            .collect()
    }

    pub fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_by_tag(tag).into_iter().next()
    }

    /// Attribute value; bare attributes read as the empty string.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.element(id)?
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attribute_names(&self, id: NodeId) -> Vec<&str> {
        self.element(id)
            .map(|data| data.attributes.iter().map(|a| a.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| *c == class)
    }

    pub fn style(&self, id: NodeId) -> StyleDeclarations {
        StyleDeclarations::parse(self.attr(id, "style").unwrap_or(""))
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        self.style(id).get(property).map(str::to_string)
    }

    /// Decoded text of all descendant text nodes, excluding script/style.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(Node {
            kind: NodeKind::Text(raw),
            ..
        }) = self.nodes.get(id.0)
        {
            return decode_entities(raw);
        }
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            match &self.nodes[next.0].kind {
                NodeKind::Text(raw) => out.push_str(&decode_entities(raw)),
                NodeKind::Element(data) if matches!(data.name.as_str(), "script" | "style") => {}
                NodeKind::Element(_) => {
                    stack.extend(self.children(next).iter().rev().copied());
                }
                _ => {}
            }
        }
        out
    }

    /// `text_content` with whitespace collapsed.
    pub fn visible_text(&self, id: NodeId) -> String {
        self.text_content(id)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    // ── Serialization ───────────────────────────────────────────────────

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize the whole document.
    pub fn serialize(&self) -> String {
        self.inner_html(self.root)
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Root => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Doctype(raw)
            | NodeKind::Comment(raw)
            | NodeKind::Text(raw)
            | NodeKind::StrayEndTag(raw) => out.push_str(raw),
            NodeKind::Element(data) => {
                match &data.raw_start {
                    Some(raw) => out.push_str(raw),
                    None => render_start_tag(data, out),
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                if let Some(raw) = &data.raw_end {
                    out.push_str(raw);
                }
            }
        }
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Set an attribute. Returns false if `id` is not an element.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let Some(data) = self.element_mut(id) else {
            return false;
        };
        match data.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => {
                if existing.value.as_deref() == Some(value) {
                    return true;
                }
                existing.value = Some(value.to_string());
            }
            None => data.attributes.push(Attribute {
                name,
                value: Some(value.to_string()),
            }),
        }
        data.raw_start = None;
        true
    }

    /// Remove an attribute. Returns true if it was present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let Some(data) = self.element_mut(id) else {
            return false;
        };
        let before = data.attributes.len();
        data.attributes.retain(|a| a.name != name);
        if data.attributes.len() == before {
            return false;
        }
        data.raw_start = None;
        true
    }

    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) -> bool {
        if !self.is_element(id) {
            return false;
        }
        let mut style = self.style(id);
        style.set(property, value);
        self.set_attr(id, "style", &style.to_string())
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.is_element(id) {
            return false;
        }
        if self.has_class(id, class) {
            return true;
        }
        let mut classes: Vec<String> = self.classes(id).iter().map(|c| c.to_string()).collect();
        classes.push(class.to_string());
        self.set_attr(id, "class", &classes.join(" "))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.has_class(id, class) {
            return false;
        }
        let remaining: Vec<String> = self
            .classes(id)
            .iter()
            .filter(|c| **c != class)
            .map(|c| c.to_string())
            .collect();
        if remaining.is_empty() {
            self.remove_attr(id, "class")
        } else {
            self.set_attr(id, "class", &remaining.join(" "))
        }
    }

    /// Replace all children with a single escaped text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        if !self.is_element(id) {
            return false;
        }
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
        self.alloc(NodeKind::Text(escape_text(text)), Some(id));
        true
    }

    /// Detach a node from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.nodes[id.0].parent = None;
        }
    }

    /// Replace `id` with the nodes parsed from `markup`. Returns the new
    /// top-level node ids; `id` is detached afterwards.
    pub fn replace_with_markup(&mut self, id: NodeId, markup: &str) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let new_nodes = self.parse_fragment(markup);
        for &node in &new_nodes {
            self.nodes[node.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|&c| c == id) {
            Some(pos) => {
                siblings.splice(pos..pos + 1, new_nodes.iter().copied());
            }
            None => siblings.extend(new_nodes.iter().copied()),
        }
        self.nodes[id.0].parent = None;
        new_nodes
    }

    /// Append nodes parsed from `markup` as the last children of `parent`.
    pub fn append_markup(&mut self, parent: NodeId, markup: &str) -> Vec<NodeId> {
        let new_nodes = self.parse_fragment(markup);
        for &node in &new_nodes {
            self.nodes[node.0].parent = Some(parent);
        }
        self.nodes[parent.0].children.extend(new_nodes.iter().copied());
        new_nodes
    }
}

fn render_start_tag(data: &ElementData, out: &mut String) {
    out.push('<');
    out.push_str(&data.name);
    for attr in &data.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
    }
    if data.self_closing {
        out.push_str(" /");
    }
    out.push('>');
}

/// Element ids of the top-level elements parsed from `markup`, ignoring
/// surrounding whitespace and comments.
pub fn top_level_elements(markup: &str) -> (HtmlDocument, Vec<NodeId>) {
    let doc = HtmlDocument::parse(markup);
    let elements = doc.element_children(doc.root());
    (doc, elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>T &amp; C</title>\
        <style>.btn{color:red}</style></head>\n<body>\n  <!-- nav -->\n  \
        <div class=\"actions\"><button class='btn primary' id=go>Go &rarr;</button>\
        <button>Cancel</button></div>\n  <p>one<p>two\n  <img src=\"a.png\">\n</body>\n</html>\n";

    #[test]
    fn test_unmodified_document_is_byte_identical() {
        let doc = HtmlDocument::parse(PAGE);
        assert_eq!(doc.serialize(), PAGE);
    }

    #[test]
    fn test_messy_markup_round_trips() {
        let messy = "<div><span>unclosed<b>bold</div></i>tail<p a=1 b c='3'/>";
        assert_eq!(HtmlDocument::parse(messy).serialize(), messy);
    }

    #[test]
    fn test_queries() {
        let doc = HtmlDocument::parse(PAGE);
        let buttons = doc.elements_by_tag("button");
        assert_eq!(buttons.len(), 2);
        assert_eq!(doc.attr(buttons[0], "id"), Some("go"));
        assert!(doc.has_class(buttons[0], "primary"));
        assert_eq!(doc.visible_text(buttons[1]), "Cancel");
        let parent = doc.parent(buttons[0]).unwrap();
        assert!(doc.has_class(parent, "actions"));
        assert_eq!(doc.elements_by_tag("p").len(), 2);
    }

    #[test]
    fn test_attribute_edit_is_local() {
        let mut doc = HtmlDocument::parse(PAGE);
        let go = doc.elements_by_tag("button")[0];
        assert!(doc.set_style_property(go, "color", "blue"));
        let out = doc.serialize();
        assert!(out.contains(
            r#"<button class="btn primary" id="go" style="color: blue;">Go &rarr;</button>"#
        ));
        assert_eq!(out.replace(r#"<button class="btn primary" id="go" style="color: blue;">"#, "<button class='btn primary' id=go>"), PAGE);
    }

    #[test]
    fn test_replace_with_markup() {
        let mut doc = HtmlDocument::parse(PAGE);
        let cancel = doc.elements_by_tag("button")[1];
        let new_ids = doc.replace_with_markup(cancel, "<button class=\"ghost\">Back</button>");
        assert_eq!(new_ids.len(), 1);
        assert!(!doc.is_attached(cancel));
        assert!(doc.is_attached(new_ids[0]));
        let out = doc.serialize();
        assert!(out.contains("<button class=\"ghost\">Back</button></div>"));
        assert!(!out.contains("Cancel"));
    }

    #[test]
    fn test_descendant_of_replaced_node_is_detached() {
        let mut doc = HtmlDocument::parse("<div id=a><span>x</span></div>");
        let div = doc.first_element_by_tag("div").unwrap();
        let span = doc.first_element_by_tag("span").unwrap();
        doc.replace_with_markup(div, "<section></section>");
        assert!(!doc.is_attached(span));
        assert_eq!(doc.serialize(), "<section></section>");
    }

    #[test]
    fn test_set_text_escapes() {
        let mut doc = HtmlDocument::parse("<button>Old</button>");
        let button = doc.first_element_by_tag("button").unwrap();
        doc.set_text(button, "Save & <Exit>");
        assert_eq!(doc.serialize(), "<button>Save &amp; &lt;Exit&gt;</button>");
        assert_eq!(doc.text_content(button), "Save & <Exit>");
    }

    #[test]
    fn test_append_markup_and_classes() {
        let mut doc = HtmlDocument::parse("<div class=\"a\"></div>");
        let div = doc.first_element_by_tag("div").unwrap();
        doc.append_markup(div, "<button>New</button>");
        doc.add_class(div, "b");
        doc.remove_class(div, "a");
        assert_eq!(doc.serialize(), "<div class=\"b\"><button>New</button></div>");
    }

    #[test]
    fn test_text_content_skips_scripts() {
        let doc = HtmlDocument::parse("<div>a<script>var x;</script>b</div>");
        let div = doc.first_element_by_tag("div").unwrap();
        assert_eq!(doc.text_content(div), "ab");
    }
}
