//! Lossless HTML tokenizer.
//!
//! Every byte of the input lands in exactly one token's `raw` slice, so
//! concatenating the raw slices in order reproduces the input. Tag and
//! attribute names are lowercased; attribute values are entity-decoded.
//!
//! Known limitations:
//! - No HTML5 parse-error recovery beyond what editing needs (no foster
//!   parenting, no adoption agency).
//! - Raw-text close-tag scanning accepts only ASCII whitespace before `>`.

use memchr::memchr;

use super::entities::decode_entities;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Elements whose content is not parsed as markup.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// A parsed attribute. `value` is `None` for bare attributes like `disabled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Doctype(&'a str),
    Comment(&'a str),
    Text(&'a str),
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        raw: &'a str,
    },
    EndTag {
        name: String,
        raw: &'a str,
    },
}

impl Token<'_> {
    /// The exact source bytes this token was cut from.
    pub fn raw(&self) -> &str {
        match self {
            Token::Doctype(raw) | Token::Comment(raw) | Token::Text(raw) => raw,
            Token::StartTag { raw, .. } | Token::EndTag { raw, .. } => raw,
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'.')
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Find `</name\s*>` starting at `from`; returns (close_start, close_end).
fn find_raw_text_close(input: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let bytes = input.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        let rel = memchr(b'<', &bytes[i..])?;
        i += rel;
        if i + 1 < bytes.len()
            && bytes[i + 1] == b'/'
            && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes())
        {
            let mut k = i + 2 + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Position just past the next `>` at or after `from`, or the end of input.
fn skip_past_gt(bytes: &[u8], from: usize) -> usize {
    match memchr(b'>', &bytes[from.min(bytes.len())..]) {
        Some(rel) => from + rel + 1,
        None => bytes.len(),
    }
}

/// Tokenize `input` into lossless tokens.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    // Start of a pending text run; text is flushed lazily so that a `<` that
    // does not open markup stays part of the surrounding text.
    let mut text_start: Option<usize> = None;

    macro_rules! flush_text {
        ($end:expr) => {
            if let Some(start) = text_start.take() {
                if $end > start {
                    out.push(Token::Text(&input[start..$end]));
                }
            }
        };
    }

    while i < bytes.len() {
        if bytes[i] != b'<' {
            text_start.get_or_insert(i);
            i = match memchr(b'<', &bytes[i..]) {
                Some(rel) => i + rel,
                None => bytes.len(),
            };
            continue;
        }

        let next = bytes.get(i + 1).copied();
        match next {
            Some(b'!') => {
                flush_text!(i);
                if input[i..].starts_with(COMMENT_START) {
                    let end = match input[i + COMMENT_START.len()..].find(COMMENT_END) {
                        Some(rel) => i + COMMENT_START.len() + rel + COMMENT_END.len(),
                        None => bytes.len(),
                    };
                    out.push(Token::Comment(&input[i..end]));
                    i = end;
                } else {
                    let end = skip_past_gt(bytes, i);
                    let raw = &input[i..end];
                    if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
                        out.push(Token::Doctype(raw));
                    } else {
                        out.push(Token::Comment(raw));
                    }
                    i = end;
                }
            }
            Some(b'?') => {
                flush_text!(i);
                let end = skip_past_gt(bytes, i);
                out.push(Token::Comment(&input[i..end]));
                i = end;
            }
            Some(b'/') if bytes.get(i + 2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                flush_text!(i);
                let name_start = i + 2;
                let mut k = name_start;
                while k < bytes.len() && is_name_byte(bytes[k]) {
                    k += 1;
                }
                let name = input[name_start..k].to_ascii_lowercase();
                let end = skip_past_gt(bytes, k);
                out.push(Token::EndTag {
                    name,
                    raw: &input[i..end],
                });
                i = end;
            }
            Some(b) if b.is_ascii_alphabetic() => {
                flush_text!(i);
                let (token, end) = read_start_tag(input, i);
                let raw_text_name = match &token {
                    Token::StartTag {
                        name, self_closing, ..
                    } if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) => {
                        Some(name.clone())
                    }
                    _ => None,
                };
                out.push(token);
                i = end;
                if let Some(name) = raw_text_name {
                    match find_raw_text_close(input, i, &name) {
                        Some((close_start, close_end)) => {
                            if close_start > i {
                                out.push(Token::Text(&input[i..close_start]));
                            }
                            out.push(Token::EndTag {
                                name,
                                raw: &input[close_start..close_end],
                            });
                            i = close_end;
                        }
                        None => {
                            if i < bytes.len() {
                                out.push(Token::Text(&input[i..]));
                            }
                            i = bytes.len();
                        }
                    }
                }
            }
            _ => {
                // Literal `<` in text.
                text_start.get_or_insert(i);
                i += 1;
            }
        }
    }
    flush_text!(bytes.len());
    out
}

/// Read a start tag beginning at `start` (which points at `<`).
fn read_start_tag(input: &str, start: usize) -> (Token<'_>, usize) {
    let bytes = input.as_bytes();
    let mut k = start + 1;
    while k < bytes.len() && is_name_byte(bytes[k]) {
        k += 1;
    }
    let name = input[start + 1..k].to_ascii_lowercase();
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut self_closing = false;

    loop {
        while k < bytes.len() && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        if k >= bytes.len() {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' => {
                if bytes.get(k + 1) == Some(&b'>') {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = k;
        while k < bytes.len()
            && !bytes[k].is_ascii_whitespace()
            && !matches!(bytes[k], b'=' | b'>' | b'/')
        {
            k += 1;
        }
        if k == attr_start {
            // Lone `=` or similar junk; skip it.
            k += 1;
            continue;
        }
        let attr_name = input[attr_start..k].to_ascii_lowercase();

        let mut j = k;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if j < bytes.len() && bytes[j] == b'=' {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && (bytes[j] == b'"' || bytes[j] == b'\'') {
                let quote = bytes[j];
                let value_start = j + 1;
                let value_end = match memchr(quote, &bytes[value_start..]) {
                    Some(rel) => value_start + rel,
                    None => bytes.len(),
                };
                value = Some(decode_entities(&input[value_start..value_end]));
                k = (value_end + 1).min(bytes.len());
            } else {
                let value_start = j;
                while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                    j += 1;
                }
                value = Some(decode_entities(&input[value_start..j]));
                k = j;
            }
        }

        if !attributes.iter().any(|a| a.name == attr_name) {
            attributes.push(Attribute {
                name: attr_name,
                value,
            });
        }
    }

    let end = k.min(bytes.len());
    (
        Token::StartTag {
            name,
            attributes,
            self_closing,
            raw: &input[start..end],
        },
        end,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(tokens: &[Token<'_>]) -> String {
        tokens.iter().map(|t| t.raw()).collect()
    }

    #[test]
    fn test_tokens_cover_every_byte() {
        let input = "<!DOCTYPE html>\n<html><body class=main>\n<!-- c -->\
                     <p>a < b && c</p><img src=x.png/><br></body></html>";
        let tokens = tokenize(input);
        assert_eq!(rejoin(&tokens), input);
        assert!(matches!(tokens[0], Token::Doctype(_)));
    }

    #[test]
    fn test_attributes_are_parsed_and_decoded() {
        let tokens = tokenize(r#"<a HREF="/q?a=1&amp;b=2" data-x='y' disabled>"#);
        match &tokens[0] {
            Token::StartTag {
                name, attributes, ..
            } => {
                assert_eq!(name, "a");
                assert_eq!(attributes[0].name, "href");
                assert_eq!(attributes[0].value.as_deref(), Some("/q?a=1&b=2"));
                assert_eq!(attributes[1].value.as_deref(), Some("y"));
                assert_eq!(attributes[2].value, None);
            }
            other => panic!("expected start tag, got {:?}", other),
        }
    }

    #[test]
    fn test_unquoted_value_with_slash() {
        let tokens = tokenize("<a href=/about>About</a>");
        match &tokens[0] {
            Token::StartTag {
                attributes,
                self_closing,
                ..
            } => {
                assert_eq!(attributes[0].value.as_deref(), Some("/about"));
                assert!(!self_closing);
            }
            other => panic!("expected start tag, got {:?}", other),
        }
    }

    #[test]
    fn test_script_content_is_raw_text() {
        let input = "<script>if (a<b) { x = '</div>'; }</script><p>ok</p>";
        let tokens = tokenize(input);
        assert_eq!(rejoin(&tokens), input);
        assert!(matches!(&tokens[1], Token::Text(t) if t.contains("</div>")));
        assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "script"));
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let tokens = tokenize(r#"<button onclick="if(a>b){go()}">Go</button>"#);
        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[1], Token::Text("Go")));
    }

    #[test]
    fn test_unterminated_tag_is_kept() {
        let input = "<div><span class=\"x";
        assert_eq!(rejoin(&tokenize(input)), input);
    }
}
