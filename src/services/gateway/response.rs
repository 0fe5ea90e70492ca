//! Cleanup of model completions.

use serde::de::DeserializeOwned;

use crate::utils::error::{AppError, AppResult};

/// Remove a Markdown code fence around (or inside) a completion.
///
/// A fenced block anywhere in the text wins over surrounding prose; an
/// unterminated opening fence is dropped along with its language tag.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed.to_string();
    };
    let after_open = &trimmed[open + 3..];
    let body = match after_open.find('\n') {
        Some(nl) => &after_open[nl + 1..],
        None => after_open,
    };
    match body.find("```") {
        Some(close) => body[..close].trim().to_string(),
        None if open == 0 => body.trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Find the first JSON object or array in a completion.
///
/// Looks in a ```json fence first, then any fence whose content starts with
/// `{` or `[`, then the first balanced `{...}`/`[...]` in the raw text.
pub fn extract_json(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            return Some(after[..end].trim().to_string());
        }
    }
    if text.contains("```") {
        let fenced = strip_code_fences(text);
        if fenced.starts_with('{') || fenced.starts_with('[') {
            if let Some(balanced) = balanced_json(&fenced) {
                return Some(balanced.to_string());
            }
        }
    }
    balanced_json(text).map(str::to_string)
}

/// Extract and deserialize JSON, reporting failures as `ResponseParse`.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> AppResult<T> {
    let json = extract_json(text)
        .ok_or_else(|| AppError::response_parse("no JSON object found in model output"))?;
    serde_json::from_str(&json).map_err(|e| AppError::response_parse(e.to_string()))
}

/// The first balanced object/array, respecting string literals.
fn balanced_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
