//! HTML parsing and in-place editing.

mod dom;
mod entities;
mod style;
mod tokenizer;

pub use dom::{top_level_elements, HtmlDocument, NodeId};
pub use entities::{decode_entities, escape_attribute, escape_text};
pub use style::StyleDeclarations;
pub use tokenizer::{tokenize, Attribute, Token};
