//! Change Applier
//!
//! Applies a parsed instruction to located elements inside one document.
//! Each candidate gets a model-produced replacement; output that does not
//! survive validation falls back to a mechanical edit of the same element.

mod creation;
mod fallback;
mod prompts;

use regex::Regex;
use serde::Deserialize;

pub use creation::{choose_container, synthesize_button};
pub use prompts::PromptKind;

use crate::models::{ApplyOutcome, CandidateElement, Instruction};
use crate::services::gateway::{ModelGateway, ModelRole};
use crate::services::html::{top_level_elements, HtmlDocument, NodeId};
use crate::services::store::Document;
use crate::utils::error::{AppError, AppResult};

const NEARBY_BUTTON_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
struct SelectionReply {
    #[serde(default)]
    matches: Vec<usize>,
}
const DEFAULT_BUTTON_LABEL: &str = "Button";

/// Applies instructions to documents through a model gateway.
#[derive(Debug, Clone)]
pub struct ChangeApplier {
    gateway: ModelGateway,
    label_pattern: Option<Regex>,
}

impl ChangeApplier {
    pub fn new(gateway: ModelGateway) -> Self {
        let label_pattern = Regex::new(
            r#"(?i)\b(?:says?|saying|labell?ed|called|named|reads?|with\s+(?:the\s+)?(?:text|label))\s+(?P<label>.+?)\s*$"#,
        )
        .map_err(|e| tracing::error!("[applier] label pattern failed to compile: {}", e))
        .ok();
        Self {
            gateway,
            label_pattern,
        }
    }

    /// Apply `instruction` to every still-attached candidate, in order.
    ///
    /// Fails with `NoMatch` and leaves the document untouched when no
    /// candidate could be changed.
    pub async fn apply(
        &self,
        doc: &mut Document,
        candidates: &[CandidateElement],
        instruction: &Instruction,
    ) -> AppResult<ApplyOutcome> {
        let kind = PromptKind::for_instruction(instruction);
        let mut changed_count = 0;
        let mut failed_count = 0;

        for candidate in candidates {
            if !doc.tree().is_attached(candidate.node) {
                tracing::debug!(
                    "[applier] skipping <{}> '{}', replaced with an ancestor",
                    candidate.tag,
                    candidate.text
                );
                continue;
            }

            match self.model_replacement(doc.tree(), candidate.node, kind, instruction).await {
                Ok(markup) => {
                    doc.tree_mut().replace_with_markup(candidate.node, &markup);
                    changed_count += 1;
                }
                Err(reason) => {
                    tracing::info!(
                        "[applier] model edit of <{}> '{}' unusable ({}), editing directly",
                        candidate.tag,
                        candidate.text,
                        reason
                    );
                    match fallback::apply_direct(doc.tree_mut(), candidate.node, instruction) {
                        Ok(()) => changed_count += 1,
                        Err(reason) => {
                            tracing::warn!(
                                "[applier] could not change <{}> '{}': {}",
                                candidate.tag,
                                candidate.text,
                                reason
                            );
                            failed_count += 1;
                        }
                    }
                }
            }
        }

        if changed_count == 0 {
            tracing::warn!(
                "[applier] {}: '{}' changed none of {} candidate(s)",
                doc.path(),
                instruction.action_type,
                candidates.len()
            );
            let target = if instruction.target_description.is_empty() {
                "any element"
            } else {
                instruction.target_description.as_str()
            };
            return Err(AppError::no_match(target));
        }

        tracing::info!(
            "[applier] {}: {} changed, {} failed",
            doc.path(),
            changed_count,
            failed_count
        );
        Ok(ApplyOutcome {
            updated_text: doc.text(),
            changed_count,
            failed_count,
        })
    }

    /// Ask the model which of an unfiltered candidate list the instruction
    /// means. An unusable reply selects nothing.
    pub async fn select_candidates(
        &self,
        instruction: &Instruction,
        candidates: &[CandidateElement],
    ) -> Vec<CandidateElement> {
        let prompt = prompts::selection_prompt(instruction, candidates);
        match self
            .gateway
            .generate_json::<SelectionReply>(&prompt, ModelRole::Analysis)
            .await
        {
            Ok(reply) => {
                let mut indices = reply.matches;
                indices.sort_unstable();
                indices.dedup();
                indices
                    .into_iter()
                    .filter_map(|index| candidates.get(index).cloned())
                    .collect()
            }
            Err(e) => {
                tracing::info!(
                    "[applier] no selection for '{}': {}",
                    instruction.target_description,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Add a new button to the document. Falls back to a plain button that
    /// copies the page's button style when the model output is unusable.
    pub async fn create(&self, doc: &mut Document, instruction: &Instruction) -> AppResult<ApplyOutcome> {
        let container = choose_container(doc.tree());
        let buttons = creation::nearby_buttons(doc.tree(), container, NEARBY_BUTTON_LIMIT);
        let style_block = creation::page_style_block(doc.tree());
        let prompt = prompts::creation_prompt(instruction, &buttons, style_block.as_deref());

        let markup = match self.gateway.generate_html(&prompt, ModelRole::Creative).await {
            Ok(markup) if creation::is_usable_creation(&markup) => markup,
            Ok(_) => {
                tracing::info!("[applier] generated element unusable, building one directly");
                synthesize_button(doc.tree(), &self.creation_label(instruction))
            }
            Err(e) => {
                tracing::info!("[applier] element generation failed ({}), building one directly", e);
                synthesize_button(doc.tree(), &self.creation_label(instruction))
            }
        };

        let added = doc.tree_mut().append_markup(container, &markup);
        let changed_count = added.iter().filter(|&&id| doc.tree().is_element(id)).count();
        if changed_count == 0 {
            return Err(AppError::internal("created element did not parse"));
        }
        Ok(ApplyOutcome {
            updated_text: doc.text(),
            changed_count,
            failed_count: 0,
        })
    }

    /// Label for a fallback button, taken from "says X"-style phrasing.
    pub fn creation_label(&self, instruction: &Instruction) -> String {
        let pattern = self.label_pattern.as_ref();
        [instruction.action_value.as_str(), instruction.raw_text.as_str()]
            .iter()
            .find_map(|text| {
                pattern
                    .and_then(|re| re.captures(text))
                    .and_then(|caps| caps.name("label"))
                    .map(|m| strip_quotes(m.as_str()))
                    .filter(|label| !label.is_empty())
            })
            .unwrap_or_else(|| DEFAULT_BUTTON_LABEL.to_string())
    }

    async fn model_replacement(
        &self,
        tree: &HtmlDocument,
        node: NodeId,
        kind: PromptKind,
        instruction: &Instruction,
    ) -> Result<String, String> {
        let original = tree.outer_html(node);
        let prompt = prompts::element_prompt(kind, &original, instruction);
        let markup = self
            .gateway
            .generate_html(&prompt, kind.role())
            .await
            .map_err(|e| e.to_string())?;
        validate_replacement(tree, node, &original, &markup, kind)
    }
}

/// Check a model-produced replacement for `node`. Returns the markup to
/// splice in.
fn validate_replacement(
    tree: &HtmlDocument,
    node: NodeId,
    original: &str,
    markup: &str,
    kind: PromptKind,
) -> Result<String, String> {
    let markup = markup.trim();
    if !markup.starts_with('<') || !markup.ends_with('>') {
        return Err("output is not bare markup".to_string());
    }
    if markup == original.trim() {
        return Err("output is unchanged".to_string());
    }

    let (fragment, elements) = top_level_elements(markup);
    let [replacement] = elements.as_slice() else {
        return Err(format!("expected one element, got {}", elements.len()));
    };
    let replacement = *replacement;

    let expected_tag = tree.tag_name(node).unwrap_or_default();
    let actual_tag = fragment.tag_name(replacement).unwrap_or_default();
    if expected_tag != actual_tag {
        return Err(format!("tag changed from <{}> to <{}>", expected_tag, actual_tag));
    }

    let lost_handler = tree
        .attribute_names(node)
        .into_iter()
        .filter(|name| name.starts_with("on"))
        .find(|name| !fragment.has_attr(replacement, name));
    if let Some(handler) = lost_handler {
        return Err(format!("{} handler dropped", handler));
    }

    if kind == PromptKind::ColorOnly && fragment.visible_text(replacement) != tree.visible_text(node) {
        return Err("text changed during a color edit".to_string());
    }

    Ok(markup.to_string())
}

fn strip_quotes(value: &str) -> String {
    let quotes: &[char] = &['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];
    value
        .trim()
        .trim_end_matches(['.', '!'])
        .trim_matches(quotes)
        .trim()
        .to_string()
}
