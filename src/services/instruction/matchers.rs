//! The ordered matcher cascade.
//!
//! Each matcher is a compiled pattern plus a builder that may still reject
//! the match (e.g. a "make the X button Y" whose Y is not a color). The
//! first matcher whose builder returns `Some` wins.

use regex::{Captures, Regex};

use super::vocabulary::{canonical_property, is_color_value, STYLE_PROPERTIES};
use crate::models::ActionType;

/// Intent extracted by one matcher, before file targeting is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedAction {
    pub target: String,
    pub action: ActionType,
    pub value: String,
    pub property: Option<String>,
}

type BuildFn = fn(&Captures<'_>, &str) -> Option<ParsedAction>;

pub(crate) struct Matcher {
    pub name: &'static str,
    regex: Regex,
    build: BuildFn,
}

impl Matcher {
    fn compile(name: &'static str, pattern: &str, build: BuildFn) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(regex) => Some(Self { name, regex, build }),
            Err(e) => {
                tracing::warn!("[instruction] matcher {} failed to compile: {}", name, e);
                None
            }
        }
    }

    pub fn try_match(&self, body: &str) -> Option<ParsedAction> {
        let caps = self.regex.captures(body)?;
        (self.build)(&caps, body)
    }
}

fn cap<'a>(caps: &'a Captures<'_>, name: &str) -> &'a str {
    caps.name(name).map(|m| m.as_str()).unwrap_or("")
}

/// Strip surrounding quotes and trailing sentence punctuation.
pub(crate) fn clean_value(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches(['.', '!']).trim();
    let quotes: &[char] = &['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];
    trimmed
        .trim_start_matches(quotes)
        .trim_end_matches(quotes)
        .trim()
        .to_string()
}

/// Lowercase a target description and drop filler: leading "the"/"all",
/// a trailing "button(s)"/"btn". "all buttons" normalizes to empty.
pub(crate) fn normalize_target(target: &str) -> String {
    let mut words: Vec<String> = clean_value(target)
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();
    while words
        .first()
        .is_some_and(|w| matches!(w.as_str(), "the" | "all" | "every" | "each"))
    {
        words.remove(0);
    }
    while words
        .last()
        .is_some_and(|w| matches!(w.as_str(), "button" | "buttons" | "btn"))
    {
        words.pop();
    }
    words.join(" ")
}

/// Color targets may name the part being colored ("submit button text").
fn normalize_color_target(target: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    let normalized = normalize_target(target);
    words.extend(normalized.split_whitespace());
    while words
        .last()
        .is_some_and(|w| matches!(*w, "text" | "font" | "button" | "buttons" | "btn"))
    {
        words.pop();
    }
    words.join(" ")
}

fn build_create(caps: &Captures<'_>, body: &str) -> Option<ParsedAction> {
    let value = clean_value(cap(caps, "value"));
    Some(ParsedAction {
        target: String::new(),
        action: ActionType::Create,
        value: if value.is_empty() {
            body.trim().to_string()
        } else {
            value
        },
        property: None,
    })
}

/// True when a captured target carries no element words at all, e.g. the
/// lone "the" left behind by "change the color of ...".
fn is_filler_target(raw_target: &str) -> bool {
    raw_target
        .split_whitespace()
        .all(|w| matches!(w, "the" | "a" | "an" | "text" | "font" | "its" | "their"))
}

fn build_color_of(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    let value = clean_value(cap(caps, "value"));
    if !is_color_value(&value) {
        return None;
    }
    let target = normalize_target(cap(caps, "target"));
    if target.is_empty() {
        return None;
    }
    let part = cap(caps, "part").trim().to_lowercase();
    let property = matches!(part.as_str(), "background" | "bg").then(|| "background-color".to_string());
    Some(ParsedAction {
        target,
        action: ActionType::Color,
        value,
        property,
    })
}

fn build_color_keyword(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    let raw_target = cap(caps, "target").to_lowercase();
    let last = raw_target.split_whitespace().last().unwrap_or("");
    if matches!(last, "background" | "bg") || is_filler_target(&raw_target) {
        return None;
    }
    let value = clean_value(cap(caps, "value"));
    if !is_color_value(&value) {
        return None;
    }
    Some(ParsedAction {
        target: normalize_color_target(&raw_target),
        action: ActionType::Color,
        value,
        property: None,
    })
}

fn build_button_color(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    let value = clean_value(cap(caps, "value"));
    if !is_color_value(&value) {
        return None;
    }
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Color,
        value,
        property: None,
    })
}

fn build_background(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Color,
        value: clean_value(cap(caps, "value")),
        property: Some("background-color".to_string()),
    })
}

fn build_text(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    let value = clean_value(cap(caps, "value"));
    if value.is_empty() {
        return None;
    }
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Text,
        value,
        property: None,
    })
}

fn build_redesign(caps: &Captures<'_>, body: &str) -> Option<ParsedAction> {
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Redesign,
        value: body.trim().to_string(),
        property: None,
    })
}

fn build_enhance(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Enhance,
        value: clean_value(cap(caps, "value")),
        property: None,
    })
}

fn build_class(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    let class = caps
        .name("c1")
        .or_else(|| caps.name("c2"))
        .map(|m| m.as_str().to_string())?;
    let op = cap(caps, "op").to_ascii_lowercase();
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Class,
        value: class,
        property: Some(op),
    })
}

fn build_attribute(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Attribute,
        value: clean_value(cap(caps, "value")),
        property: Some(cap(caps, "attr").to_ascii_lowercase()),
    })
}

fn build_style(caps: &Captures<'_>, _body: &str) -> Option<ParsedAction> {
    let value = clean_value(cap(caps, "value"));
    if value.is_empty() {
        return None;
    }
    Some(ParsedAction {
        target: normalize_target(cap(caps, "target")),
        action: ActionType::Style,
        value,
        property: Some(canonical_property(cap(caps, "property"))),
    })
}

/// Build the cascade in priority order.
pub(crate) fn default_matchers() -> Vec<Matcher> {
    let properties = STYLE_PROPERTIES
        .iter()
        .map(|(pattern, _)| *pattern)
        .collect::<Vec<_>>()
        .join("|");
    let style_pattern = format!(
        r"(?i)\b(?:change|set|make|update)\s+(?:the\s+)?(?P<target>.+?)\s+(?P<property>{})\s+(?:to\s+|of\s+)?(?P<value>.+?)\s*$",
        properties
    );

    [
        Matcher::compile(
            "create",
            r#"(?i)\b(?:(?:add|create|insert)\s+(?:an?\s+)?(?:new\s+)?|new\s+)button\b(?:\s+(?:that|which|to|for)\s+(?P<value>.+))?"#,
            build_create,
        ),
        Matcher::compile(
            "color-of",
            r"(?i)\b(?:changed?|make|set|turn|update)\s+(?:the\s+)?(?P<part>(?:text|font|background|bg)\s+)?colou?r\s+of\s+(?P<target>.+?)\s+(?:to|into)\s+(?P<value>.+?)\s*$",
            build_color_of,
        ),
        Matcher::compile(
            "color",
            r"(?i)\b(?:changed?|make|set|turn)\s+(?:the\s+)?(?P<target>.+?)\s+colou?r\s+(?:to\s+|into\s+)?(?P<value>.+?)\s*$",
            build_color_keyword,
        ),
        Matcher::compile(
            "button-color",
            r"(?i)^\s*(?:make|turn|change|set)\s+(?:the\s+)?(?P<target>.+?)\s+buttons?\s+(?:to\s+|into\s+)?(?P<value>.+?)\s*$",
            build_button_color,
        ),
        Matcher::compile(
            "background",
            r"(?i)\b(?:change|set|make|turn)\s+(?:the\s+)?(?P<target>.*?)\s*\b(?:background|bg)(?:[\s-]+colou?r)?\s+(?:to\s+|into\s+)?(?P<value>.+?)\s*$",
            build_background,
        ),
        Matcher::compile(
            "class",
            r#"(?i)\b(?P<op>add|remove)\s+(?:the\s+)?(?:class\s+["']?(?P<c1>[-\w]+)["']?|["']?(?P<c2>[-\w]+)["']?\s+class)\s+(?:to|from|on)\s+(?:the\s+)?(?P<target>.+?)\s*$"#,
            build_class,
        ),
        Matcher::compile(
            "attribute",
            r#"(?i)\bset\s+(?:the\s+)?(?P<attr>[-\w]+)\s+attribute\s+(?:of|on)\s+(?:the\s+)?(?P<target>.+?)\s+to\s+(?P<value>.+?)\s*$"#,
            build_attribute,
        ),
        Matcher::compile(
            "button-text",
            r#"(?i)\b(?:change|update|make|set)\s+(?:the\s+text\s+(?:of|on)\s+)?(?:the\s+)?(?P<target>.+?)\s+button\s+(?:text\s+)?(?:to\s+(?:say\s+|read\s+)?|say\s+|read\s+)?(?P<value>["“'][^"”']+["”'])"#,
            build_text,
        ),
        Matcher::compile(
            "text",
            r"(?i)\b(?:change|set|make|update)\s+(?:the\s+)?(?P<target>.+?)\s+text\s+(?:to\s+)?(?P<value>.+?)\s*$",
            build_text,
        ),
        Matcher::compile(
            "redesign",
            r"(?i)\bredesign\s+(?:the\s+)?(?P<target>.+?)(?:\s+(?:to|so|with|using|in|for|as)\b.*)?\s*$",
            build_redesign,
        ),
        Matcher::compile(
            "enhance",
            r"(?i)\bmake\s+(?:the\s+)?(?P<target>.+?)\s+more\s+(?P<value>.+?)\s*$",
            build_enhance,
        ),
        Matcher::compile("style", &style_pattern, build_style),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(body: &str) -> Option<(&'static str, ParsedAction)> {
        default_matchers()
            .into_iter()
            .find_map(|m| m.try_match(body).map(|action| (m.name, action)))
    }

    #[test]
    fn test_all_matchers_compile() {
        assert_eq!(default_matchers().len(), 12);
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("the Submit button"), "submit");
        assert_eq!(normalize_target("  'Sign Up' "), "sign up");
        assert_eq!(normalize_target("all the buttons"), "");
        assert_eq!(normalize_target("the the buttons"), "");
    }

    #[test]
    fn test_button_color_requires_color_value() {
        let (name, action) = run("make the Submit button red").unwrap();
        assert_eq!(name, "button-color");
        assert_eq!(action.target, "submit");
        assert_eq!(action.value, "red");

        let (name, _) = run("make the Submit button more prominent").unwrap();
        assert_eq!(name, "enhance");
    }

    #[test]
    fn test_background_is_not_taken_by_color_keyword() {
        let (name, action) = run("change the header background color to navy").unwrap();
        assert_eq!(name, "background");
        assert_eq!(action.target, "header");
        assert_eq!(action.property.as_deref(), Some("background-color"));
    }

    #[test]
    fn test_color_of_form() {
        let (name, action) = run("change the color of the Submit button to red").unwrap();
        assert_eq!(name, "color-of");
        assert_eq!(action.target, "submit");
        assert_eq!(action.value, "red");
        assert_eq!(action.property, None);

        let (_, text) = run("change the text color of the Login button to dark blue").unwrap();
        assert_eq!(text.target, "login");
        assert_eq!(text.value, "dark blue");
        assert_eq!(text.property, None);

        let (_, background) = run("set the background colour of the header to #112233").unwrap();
        assert_eq!(background.target, "header");
        assert_eq!(background.property.as_deref(), Some("background-color"));
    }

    #[test]
    fn test_color_keyword_rejects_non_colors_and_filler_targets() {
        let color = default_matchers()
            .into_iter()
            .find(|m| m.name == "color")
            .unwrap();
        assert!(color.try_match("change the color of everything to calm").is_none());
        assert!(color.try_match("make the Buy button color something nice").is_none());
        assert!(color.try_match("make the Buy button color green").is_some());
    }

    #[test]
    fn test_text_of_form() {
        let (name, action) = run("change the text of the Login button to \"Sign in\"").unwrap();
        assert_eq!(name, "button-text");
        assert_eq!(action.target, "login");
        assert_eq!(action.value, "Sign in");
    }

    #[test]
    fn test_style_prefers_longer_property() {
        let (name, action) = run("set the Contact button border radius to 8px").unwrap();
        assert_eq!(name, "style");
        assert_eq!(action.target, "contact");
        assert_eq!(action.property.as_deref(), Some("border-radius"));
        assert_eq!(action.value, "8px");
    }

    #[test]
    fn test_class_and_attribute() {
        let (_, class) = run("add the class highlight to the Buy button").unwrap();
        assert_eq!(class.action, ActionType::Class);
        assert_eq!(class.value, "highlight");
        assert_eq!(class.property.as_deref(), Some("add"));
        assert_eq!(class.target, "buy");

        let (_, attr) = run("set the title attribute of the Buy button to 'Order now'").unwrap();
        assert_eq!(attr.action, ActionType::Attribute);
        assert_eq!(attr.property.as_deref(), Some("title"));
        assert_eq!(attr.value, "Order now");
    }
}
