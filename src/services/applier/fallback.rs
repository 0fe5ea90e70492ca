//! Mechanical edits used when the model cannot produce a usable element.

use crate::models::{ActionType, Instruction};
use crate::services::html::{HtmlDocument, NodeId};
use crate::services::instruction::css_color;

/// Apply the instruction directly to `node`. On `Err` the tree is untouched.
pub fn apply_direct(tree: &mut HtmlDocument, node: NodeId, instruction: &Instruction) -> Result<(), String> {
    let value = instruction.action_value.trim();
    match instruction.action_type {
        ActionType::Color | ActionType::BackgroundColor => {
            let property = instruction.css_property().unwrap_or("color").to_string();
            if value.is_empty() {
                return Err("no color given".to_string());
            }
            set_style(tree, node, &property, &css_color(value))
        }
        ActionType::Style => {
            let property = instruction
                .property
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| "no style property given".to_string())?;
            if value.is_empty() {
                return Err(format!("no value given for {}", property));
            }
            set_style(tree, node, property, value)
        }
        ActionType::Text => {
            if tree.set_text(node, value) {
                Ok(())
            } else {
                Err("target is not an element".to_string())
            }
        }
        ActionType::Class => {
            let class = value.trim_start_matches('.');
            if class.is_empty() || class.contains(char::is_whitespace) {
                return Err(format!("'{}' is not a class name", value));
            }
            let changed = match instruction.property.as_deref() {
                Some("remove") => tree.remove_class(node, class),
                _ => tree.add_class(node, class),
            };
            if changed {
                Ok(())
            } else {
                Err(format!("class '{}' not present", class))
            }
        }
        ActionType::Attribute => {
            let name = instruction
                .property
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| "no attribute name given".to_string())?;
            if name.contains(char::is_whitespace) {
                return Err(format!("'{}' is not an attribute name", name));
            }
            if tree.set_attr(node, name, value) {
                Ok(())
            } else {
                Err("target is not an element".to_string())
            }
        }
        ActionType::Create | ActionType::Redesign | ActionType::Enhance | ActionType::Generic => Err(
            format!("no mechanical edit for '{}'", instruction.action_type),
        ),
    }
}

fn set_style(tree: &mut HtmlDocument, node: NodeId, property: &str, value: &str) -> Result<(), String> {
    if tree.set_style_property(node, property, value) {
        Ok(())
    } else {
        Err("target is not an element".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::instruction::InstructionParser;

    fn apply(html: &str, instruction: &str) -> (Result<(), String>, String) {
        let parser = InstructionParser::new();
        let instruction = parser.parse(instruction);
        let mut tree = HtmlDocument::parse(html);
        let node = tree.first_element_by_tag("button").unwrap();
        let result = apply_direct(&mut tree, node, &instruction);
        (result, tree.serialize())
    }

    #[test]
    fn test_color_sets_inline_style() {
        let (result, html) = apply("<button>Go</button>", "make the Go button light blue");
        assert!(result.is_ok());
        assert_eq!(html, "<button style=\"color: lightblue;\">Go</button>");
    }

    #[test]
    fn test_background_color() {
        let (result, html) = apply(
            "<button style=\"padding: 4px\">Go</button>",
            "set the Go button background color to #222",
        );
        assert!(result.is_ok());
        assert_eq!(
            html,
            "<button style=\"padding: 4px; background-color: #222;\">Go</button>"
        );
    }

    #[test]
    fn test_text_and_class() {
        let (_, html) = apply("<button>Go</button>", "change the Go button text to 'Run'");
        assert_eq!(html, "<button>Run</button>");

        let (result, html) = apply(
            "<button class=\"a\">Go</button>",
            "remove the class a from the Go button",
        );
        assert!(result.is_ok());
        assert_eq!(html, "<button>Go</button>");
    }

    fn apply_instruction(html: &str, instruction: &Instruction) -> (Result<(), String>, String) {
        let mut tree = HtmlDocument::parse(html);
        let node = tree.first_element_by_tag("button").unwrap();
        let result = apply_direct(&mut tree, node, instruction);
        (result, tree.serialize())
    }

    fn direct(action_type: ActionType, value: &str, property: Option<&str>) -> Instruction {
        Instruction {
            target_description: "go".to_string(),
            action_type,
            action_value: value.to_string(),
            property: property.map(str::to_string),
            ..Instruction::fallback("direct edit")
        }
    }

    #[test]
    fn test_style_sets_named_property() {
        let (result, html) = apply("<button>Go</button>", "set the Go button border radius to 8px");
        assert!(result.is_ok());
        assert_eq!(html, "<button style=\"border-radius: 8px;\">Go</button>");
    }

    #[test]
    fn test_style_without_property_or_value_is_refused() {
        let original = "<button style=\"padding: 4px\">Go</button>";

        let (result, html) = apply_instruction(original, &direct(ActionType::Style, "8px", None));
        assert_eq!(result, Err("no style property given".to_string()));
        assert_eq!(html, original);

        let (result, html) =
            apply_instruction(original, &direct(ActionType::Style, "  ", Some("border-radius")));
        assert_eq!(result, Err("no value given for border-radius".to_string()));
        assert_eq!(html, original);
    }

    #[test]
    fn test_attribute_sets_value() {
        let (result, html) = apply(
            "<button>Go</button>",
            "set the title attribute of the Go button to 'x'",
        );
        assert!(result.is_ok());
        assert_eq!(html, "<button title=\"x\">Go</button>");

        let (result, html) = apply_instruction(
            "<button title=\"old\">Go</button>",
            &direct(ActionType::Attribute, "new", Some("title")),
        );
        assert!(result.is_ok());
        assert_eq!(html, "<button title=\"new\">Go</button>");
    }

    #[test]
    fn test_attribute_without_name_is_refused() {
        let original = "<button>Go</button>";
        for property in [None, Some(""), Some("data label")] {
            let (result, html) =
                apply_instruction(original, &direct(ActionType::Attribute, "x", property));
            assert!(result.is_err(), "{:?}", property);
            assert_eq!(html, original);
        }
    }

    #[test]
    fn test_color_without_value_is_refused() {
        let original = "<button>Go</button>";
        let (result, html) = apply_instruction(original, &direct(ActionType::Color, "", None));
        assert_eq!(result, Err("no color given".to_string()));
        assert_eq!(html, original);
    }

    #[test]
    fn test_unmappable_action_leaves_tree_alone() {
        let original = "<button>Go</button>";
        let (result, html) = apply(original, "redesign the Go button");
        assert!(result.is_err());
        assert_eq!(html, original);
    }
}
