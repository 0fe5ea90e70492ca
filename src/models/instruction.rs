//! Instruction Models
//!
//! The structured form of a free-text modification request.

use serde::{Deserialize, Serialize};

/// Which documents an instruction applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetFile {
    /// Every document in the domain
    #[default]
    All,
    /// A single domain-relative file
    File(String),
}

impl TargetFile {
    pub fn file(&self) -> Option<&str> {
        match self {
            TargetFile::All => None,
            TargetFile::File(name) => Some(name),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, TargetFile::All)
    }
}

impl std::fmt::Display for TargetFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetFile::All => write!(f, "all"),
            TargetFile::File(name) => write!(f, "{}", name),
        }
    }
}

/// What kind of change an instruction asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    Color,
    BackgroundColor,
    Text,
    Style,
    Class,
    Attribute,
    Create,
    Redesign,
    Enhance,
    Generic,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Color => "color",
            ActionType::BackgroundColor => "background-color",
            ActionType::Text => "text",
            ActionType::Style => "style",
            ActionType::Class => "class",
            ActionType::Attribute => "attribute",
            ActionType::Create => "create",
            ActionType::Redesign => "redesign",
            ActionType::Enhance => "enhance",
            ActionType::Generic => "generic",
        }
    }

    /// Broad changes whose result the model decides.
    pub fn is_open_ended(&self) -> bool {
        matches!(self, ActionType::Redesign | ActionType::Enhance)
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "color" | "colour" => ActionType::Color,
            "background-color" | "background" => ActionType::BackgroundColor,
            "text" => ActionType::Text,
            "style" => ActionType::Style,
            "class" => ActionType::Class,
            "attribute" => ActionType::Attribute,
            "create" => ActionType::Create,
            "redesign" => ActionType::Redesign,
            "enhance" => ActionType::Enhance,
            "generic" => ActionType::Generic,
            other => return Err(format!("unknown action type: {}", other)),
        })
    }
}

/// A parsed modification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub raw_text: String,
    pub target_file: TargetFile,
    /// Lowercased element description, e.g. "submit"; empty means every
    /// interactive element
    pub target_description: String,
    pub action_type: ActionType,
    pub action_value: String,
    /// Style property for `style`/`color`, attribute name for `attribute`,
    /// `add`/`remove` for `class`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl Instruction {
    /// The catch-all form: redesign with the whole text as value.
    pub fn fallback(raw: &str) -> Self {
        Self {
            raw_text: raw.to_string(),
            target_file: TargetFile::All,
            target_description: String::new(),
            action_type: ActionType::Redesign,
            action_value: raw.trim().to_string(),
            property: None,
        }
    }

    /// CSS property touched by a mechanical edit, if the action is a style edit.
    pub fn css_property(&self) -> Option<&str> {
        match self.action_type {
            ActionType::Color => Some(self.property.as_deref().unwrap_or("color")),
            ActionType::BackgroundColor => Some("background-color"),
            ActionType::Style => self.property.as_deref(),
            _ => None,
        }
    }

    /// True for pure color edits (foreground or background).
    pub fn is_color_change(&self) -> bool {
        matches!(
            self.action_type,
            ActionType::Color | ActionType::BackgroundColor
        )
    }
}

/// `@file changed X to Y`: a literal substitution that bypasses element
/// location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleReplacement {
    pub target_file: TargetFile,
    pub old_text: String,
    pub new_text: String,
}

impl SimpleReplacement {
    /// Replace every occurrence. Returns the new text and the count.
    pub fn apply(&self, content: &str) -> (String, usize) {
        if self.old_text.is_empty() {
            return (content.to_string(), 0);
        }
        let count = content.matches(self.old_text.as_str()).count();
        if count == 0 {
            return (content.to_string(), 0);
        }
        (content.replace(&self.old_text, &self.new_text), count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&ActionType::BackgroundColor).unwrap(),
            "\"background-color\""
        );
        assert_eq!("colour".parse::<ActionType>().unwrap(), ActionType::Color);
        assert!("dance".parse::<ActionType>().is_err());
    }

    #[test]
    fn test_css_property_resolution() {
        let mut instruction = Instruction::fallback("x");
        instruction.action_type = ActionType::Color;
        assert_eq!(instruction.css_property(), Some("color"));
        instruction.property = Some("background-color".into());
        assert_eq!(instruction.css_property(), Some("background-color"));
        instruction.action_type = ActionType::Text;
        assert_eq!(instruction.css_property(), None);
    }

    #[test]
    fn test_simple_replacement_counts_and_is_idempotent() {
        let replacement = SimpleReplacement {
            target_file: TargetFile::File("index.html".into()),
            old_text: "Hello".into(),
            new_text: "Welcome".into(),
        };
        let (once, count) = replacement.apply("<h1>Hello</h1><p>Hello there</p>");
        assert_eq!(count, 2);
        let (twice, again) = replacement.apply(&once);
        assert_eq!(again, 0);
        assert_eq!(once, twice);
    }
}
