//! Prompt templates for element edits and element creation.

use crate::models::{ActionType, CandidateElement, Instruction};
use crate::services::gateway::ModelRole;

/// Which edit template an instruction gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Only `color`/`background-color` may change
    ColorOnly,
    /// Styling, classes and content may change; element type and handlers may not
    Redesign,
    /// Exactly the requested change
    Generic,
}

impl PromptKind {
    pub fn for_instruction(instruction: &Instruction) -> Self {
        match instruction.action_type {
            ActionType::Color | ActionType::BackgroundColor => PromptKind::ColorOnly,
            ActionType::Redesign | ActionType::Enhance => PromptKind::Redesign,
            _ => PromptKind::Generic,
        }
    }

    pub fn role(&self) -> ModelRole {
        match self {
            PromptKind::ColorOnly | PromptKind::Generic => ModelRole::Code,
            PromptKind::Redesign => ModelRole::Creative,
        }
    }
}

pub fn element_prompt(kind: PromptKind, element_html: &str, instruction: &Instruction) -> String {
    let rules = match kind {
        PromptKind::ColorOnly => {
            let property = instruction.css_property().unwrap_or("color");
            format!(
                "Change only the CSS `{}` of this element to \"{}\" using its inline style \
                 attribute. Do not touch any other property, attribute, class, or text.",
                property, instruction.action_value
            )
        }
        PromptKind::Redesign => "You may adjust inline styles, classes and text content to \
             satisfy the request. Do not change the element's tag, and keep every existing \
             event handler attribute (onclick and similar), id, href, type and name."
            .to_string(),
        PromptKind::Generic => "Apply exactly the requested change and nothing else. Keep all \
             other attributes, classes, text and children as they are."
            .to_string(),
    };

    format!(
        "Request: {request}\n\n\
         Element:\n{element}\n\n\
         {rules}\n\n\
         Return the complete replacement element as a single HTML element with the same \
         tag. No explanation, no Markdown.",
        request = instruction.raw_text.trim(),
        element = element_html,
        rules = rules,
    )
}

pub fn selection_prompt(instruction: &Instruction, candidates: &[CandidateElement]) -> String {
    let listing = candidates
        .iter()
        .enumerate()
        .map(|(index, c)| format!("{}: <{}> \"{}\"", index, c.tag, c.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Request: {request}\n\n\
         The request refers to \"{target}\", but no element on the page has that label. \
         Elements on the page:\n{listing}\n\n\
         Which elements does the request mean? Reply with JSON only: \
         {{\"matches\": [indices]}}. Use an empty list if none of them fit.",
        request = instruction.raw_text.trim(),
        target = instruction.target_description,
        listing = listing,
    )
}

pub fn creation_prompt(
    instruction: &Instruction,
    nearby_buttons: &[String],
    style_block: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Create one new HTML button for this request: {}\n\n\
         Use inline style attributes only. Do not use utility CSS frameworks (Tailwind, \
         Bootstrap utility classes or similar) and do not rely on external stylesheets. \
         Match the look of the page.\n",
        instruction.raw_text.trim()
    );
    if !nearby_buttons.is_empty() {
        prompt.push_str("\nExisting buttons on the page:\n");
        for button in nearby_buttons {
            prompt.push_str(button);
            prompt.push('\n');
        }
    }
    if let Some(style) = style_block {
        prompt.push_str("\nPage styles:\n");
        prompt.push_str(style);
        prompt.push('\n');
    }
    prompt.push_str("\nReturn only the new element's HTML. No explanation, no Markdown.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::instruction::InstructionParser;

    #[test]
    fn test_kind_selection() {
        let parser = InstructionParser::new();
        assert_eq!(
            PromptKind::for_instruction(&parser.parse("make the Submit button red")),
            PromptKind::ColorOnly
        );
        assert_eq!(
            PromptKind::for_instruction(&parser.parse("redesign the login button")),
            PromptKind::Redesign
        );
        assert_eq!(
            PromptKind::for_instruction(&parser.parse("change the Go button text to 'Run'")),
            PromptKind::Generic
        );
    }

    #[test]
    fn test_color_prompt_names_property() {
        let parser = InstructionParser::new();
        let instruction = parser.parse("change the header background color to navy");
        let prompt = element_prompt(PromptKind::ColorOnly, "<div></div>", &instruction);
        assert!(prompt.contains("`background-color`"));
        assert!(prompt.contains("\"navy\""));
    }

    #[test]
    fn test_creation_prompt_forbids_frameworks() {
        let parser = InstructionParser::new();
        let instruction = parser.parse("add a button that says Subscribe");
        let prompt = creation_prompt(&instruction, &["<button>Go</button>".into()], Some(".a{}"));
        assert!(prompt.contains("inline style"));
        assert!(prompt.contains("Tailwind"));
        assert!(prompt.contains("<button>Go</button>"));
        assert!(prompt.contains(".a{}"));
    }
}
