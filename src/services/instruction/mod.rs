//! Instruction Parser
//!
//! Turns free text into an `Instruction` through three independent paths:
//! the `@file` token, the simple-replacement recognizer, and the ordered
//! matcher cascade. Parsing never fails; text no matcher understands becomes
//! a redesign request carrying the whole instruction.

mod matchers;
mod vocabulary;

pub use vocabulary::{css_color, is_color_value};

use regex::Regex;

use crate::models::{ActionType, Instruction, SimpleReplacement, TargetFile};
use matchers::{clean_value, default_matchers, normalize_target, Matcher};
use vocabulary::{ELEMENT_VOCABULARY, PAGE_SCOPE_WORDS, PAGE_TARGET_FILLER};

/// Rule-based instruction parser. Patterns are compiled once in `new()`.
pub struct InstructionParser {
    matchers: Vec<Matcher>,
    fallback: Option<Regex>,
    file_token: Option<Regex>,
    quoted_replacement: Option<Regex>,
    plain_replacement: Option<Regex>,
    page_scope: Option<Regex>,
}

impl Default for InstructionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionParser {
    pub fn new() -> Self {
        Self {
            matchers: default_matchers(),
            fallback: Regex::new(r"(?i)\bthe\s+([\w\s]+?)\s+button").ok(),
            file_token: Regex::new(r"(?:^|\s)(@(?P<file>[\w][\w./-]*\.[A-Za-z0-9]+))").ok(),
            quoted_replacement: Regex::new(
                r#"(?is)^\s*(?:changed?|replace)\s+["“'](?P<old>.+?)["”']\s+(?:to|with)\s+["“'](?P<new>.*?)["”']\s*[.!]?\s*$"#,
            )
            .ok(),
            plain_replacement: Regex::new(
                r"(?is)^\s*(?:changed?|replace)\s+(?P<old>.+?)\s+(?:to|with)\s+(?P<new>.+?)\s*$",
            )
            .ok(),
            page_scope: Regex::new(&format!(r"(?i)\b(?:{})\b", PAGE_SCOPE_WORDS.join("|"))).ok(),
        }
    }

    /// Split off an `@file.ext` token. Returns the target and the remaining text.
    pub fn extract_target_file(&self, raw: &str) -> (TargetFile, String) {
        let Some(re) = &self.file_token else {
            return (TargetFile::All, raw.trim().to_string());
        };
        let Some(caps) = re.captures(raw) else {
            return (TargetFile::All, raw.trim().to_string());
        };
        let (Some(token), Some(file)) = (caps.get(1), caps.name("file")) else {
            return (TargetFile::All, raw.trim().to_string());
        };
        let mut body = String::with_capacity(raw.len());
        body.push_str(&raw[..token.start()]);
        body.push_str(&raw[token.end()..]);
        let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
        (TargetFile::File(file.as_str().to_string()), body)
    }

    /// Recognize `@file changed X to Y`. A file must be named. Quoted pairs
    /// are always literal; unquoted pairs only when X does not read like an
    /// element description.
    pub fn parse_replacement(&self, raw: &str) -> Option<SimpleReplacement> {
        let (target_file, body) = self.extract_target_file(raw);
        if target_file.is_all() {
            return None;
        }

        if let Some(caps) = self.quoted_replacement.as_ref().and_then(|re| re.captures(&body)) {
            let old_text = caps.name("old")?.as_str().to_string();
            let new_text = caps.name("new").map(|m| m.as_str()).unwrap_or("").to_string();
            return Some(SimpleReplacement {
                target_file,
                old_text,
                new_text,
            });
        }

        let caps = self.plain_replacement.as_ref()?.captures(&body)?;
        let old_text = caps.name("old")?.as_str().trim().to_string();
        let new_text = clean_value(caps.name("new")?.as_str());
        let lowered = old_text.to_lowercase();
        let looks_like_element = lowered.starts_with("the ")
            || lowered
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| ELEMENT_VOCABULARY.contains(&word));
        if looks_like_element || old_text.is_empty() || new_text.is_empty() {
            return None;
        }
        Some(SimpleReplacement {
            target_file,
            old_text,
            new_text,
        })
    }

    /// Parse an instruction. Never fails.
    pub fn parse(&self, raw: &str) -> Instruction {
        let (target_file, body) = self.extract_target_file(raw);

        for matcher in &self.matchers {
            if let Some(action) = matcher.try_match(&body) {
                tracing::debug!(
                    "[instruction] '{}' matched {} -> {} '{}'",
                    body,
                    matcher.name,
                    action.action,
                    action.target
                );
                return Instruction {
                    raw_text: raw.to_string(),
                    target_file,
                    target_description: action.target,
                    action_type: action.action,
                    action_value: action.value,
                    property: action.property,
                };
            }
        }

        if let Some(target) = self
            .fallback
            .as_ref()
            .and_then(|re| re.captures(&body))
            .and_then(|caps| caps.get(1))
        {
            tracing::debug!("[instruction] fallback target '{}'", target.as_str());
            return Instruction {
                raw_text: raw.to_string(),
                target_file,
                target_description: normalize_target(target.as_str()),
                action_type: ActionType::Redesign,
                action_value: body.clone(),
                property: None,
            };
        }

        tracing::debug!("[instruction] no pattern for '{}', treating as redesign", body);
        Instruction {
            target_file,
            action_value: body,
            ..Instruction::fallback(raw)
        }
    }

    /// Whether a target description names the page itself ("the whole
    /// website", "page") rather than an element on it.
    pub fn is_page_target(&self, target: &str) -> bool {
        let words: Vec<String> = target
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        words.iter().any(|w| PAGE_SCOPE_WORDS.contains(&w.as_str()))
            && words.iter().all(|w| {
                PAGE_SCOPE_WORDS.contains(&w.as_str()) || PAGE_TARGET_FILLER.contains(&w.as_str())
            })
    }

    /// Whether the instruction talks about whole pages rather than elements.
    pub fn mentions_page_scope(&self, text: &str) -> bool {
        self.page_scope
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }
}
