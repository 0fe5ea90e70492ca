//! Element Locator
//!
//! Finds the interactive elements an instruction most likely refers to.
//! Candidates are scored against the target description, sorted, and cut
//! according to the configured confidence bands.

mod synonyms;

pub(crate) use synonyms::normalize_label;

use crate::config::LocatorSettings;
use crate::models::{CandidateElement, LocateResult, MatchConfidence};
use crate::services::html::{HtmlDocument, NodeId};

const SCORE_EXACT: u8 = 100;
const SCORE_SYNONYM: u8 = 90;
const SCORE_TEXT_CONTAINS_TARGET: u8 = 80;
const SCORE_TARGET_CONTAINS_TEXT: u8 = 70;

/// Attributes consulted when an element has no visible text.
const LABEL_ATTRIBUTES: &[&str] = &["value", "aria-label", "title"];

#[derive(Debug, Clone, Default)]
pub struct ElementLocator {
    settings: LocatorSettings,
}

impl ElementLocator {
    pub fn new(settings: LocatorSettings) -> Self {
        Self { settings }
    }

    /// Score and filter the interactive elements of `doc` against `target`.
    pub fn locate(&self, doc: &HtmlDocument, target: &str) -> LocateResult {
        let elements = interactive_elements(doc);
        if elements.is_empty() {
            return LocateResult {
                confidence: MatchConfidence::Empty,
                candidates: Vec::new(),
            };
        }

        let target = normalize_label(target);
        if target.is_empty() {
            return LocateResult {
                confidence: MatchConfidence::Blanket,
                candidates: elements
                    .into_iter()
                    .map(|node| candidate(doc, node, SCORE_EXACT))
                    .collect(),
            };
        }

        let expanded = synonyms::expand(&target);
        let mut scored: Vec<CandidateElement> = elements
            .into_iter()
            .map(|node| {
                let label = element_label(doc, node);
                let score = self.score(&normalize_label(&label), &target, &expanded);
                candidate(doc, node, score)
            })
            .collect();
        // Stable: equal scores keep document order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));

        let top = scored[0].score;
        let result = if top >= self.settings.confident_score {
            LocateResult {
                confidence: MatchConfidence::Confident,
                candidates: scored.into_iter().take(1).collect(),
            }
        } else {
            let floor = self.settings.ambiguous_floor;
            if top >= floor {
                LocateResult {
                    confidence: MatchConfidence::Ambiguous,
                    candidates: scored.into_iter().filter(|c| c.score >= floor).collect(),
                }
            } else {
                LocateResult {
                    confidence: MatchConfidence::Unfiltered,
                    candidates: scored,
                }
            }
        };

        tracing::debug!(
            "[locator] target '{}': {:?}, {} candidate(s), top score {}",
            target,
            result.confidence,
            result.candidates.len(),
            result.top_score()
        );
        result
    }

    /// Score one normalized label against a normalized target.
    pub fn score(&self, label: &str, target: &str, synonyms: &[String]) -> u8 {
        if label.is_empty() || target.is_empty() {
            return 0;
        }
        if label == target {
            return SCORE_EXACT;
        }
        if synonyms.iter().any(|s| s == label) {
            return SCORE_SYNONYM;
        }
        if label.contains(target) {
            return SCORE_TEXT_CONTAINS_TARGET;
        }
        if target.contains(label) {
            return SCORE_TARGET_CONTAINS_TEXT;
        }
        let label_words: Vec<&str> = label.split_whitespace().collect();
        let matched = target
            .split_whitespace()
            .filter(|w| label_words.contains(w))
            .count();
        if matched == 0 {
            return 0;
        }
        let raw = u32::from(self.settings.word_base)
            + u32::from(self.settings.word_bonus) * matched as u32;
        let cap = self
            .settings
            .word_cap
            .min(self.settings.confident_score.saturating_sub(1));
        raw.min(u32::from(cap)) as u8
    }
}

fn candidate(doc: &HtmlDocument, node: NodeId, score: u8) -> CandidateElement {
    CandidateElement {
        node,
        score,
        tag: doc.tag_name(node).unwrap_or_default().to_string(),
        text: element_label(doc, node),
    }
}

/// Visible text, or a labelling attribute for icon-only controls.
pub fn element_label(doc: &HtmlDocument, node: NodeId) -> String {
    let text = doc.visible_text(node);
    if !text.is_empty() {
        return text;
    }
    LABEL_ATTRIBUTES
        .iter()
        .filter_map(|attr| doc.attr(node, attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Every element that looks clickable, in document order.
pub fn interactive_elements(doc: &HtmlDocument) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|&node| is_interactive(doc, node))
        .collect()
}

fn is_interactive(doc: &HtmlDocument, node: NodeId) -> bool {
    let tag = doc.tag_name(node).unwrap_or_default();
    if tag == "button" {
        return true;
    }
    if tag == "input" {
        let kind = doc.attr(node, "type").unwrap_or("").to_ascii_lowercase();
        return matches!(kind.as_str(), "button" | "submit");
    }
    if doc
        .classes(node)
        .iter()
        .any(|c| {
            let c = c.to_ascii_lowercase();
            c.contains("btn") || c.contains("button")
        })
    {
        return true;
    }
    if doc
        .attr(node, "role")
        .is_some_and(|r| r.eq_ignore_ascii_case("button"))
    {
        return true;
    }
    let clickable = doc.has_attr(node, "onclick") || (tag == "a" && doc.has_attr(node, "href"));
    clickable && has_button_presentation(doc, node)
}

fn has_button_presentation(doc: &HtmlDocument, node: NodeId) -> bool {
    let style = doc.style(node);
    let cursor = style
        .get("cursor")
        .map(|c| !matches!(c.to_ascii_lowercase().as_str(), "auto" | "default"))
        .unwrap_or(false);
    cursor
        || style.iter().any(|(name, _)| name.starts_with("padding"))
        || style.get("border-radius").is_some()
}
