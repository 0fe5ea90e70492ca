//! Word lists the parser and fallbacks consult.

/// Named CSS colors accepted in instructions.
const NAMED_COLORS: &[&str] = &[
    "black", "white", "red", "green", "blue", "yellow", "orange", "purple", "pink", "brown",
    "gray", "grey", "cyan", "magenta", "lime", "navy", "teal", "maroon", "olive", "silver",
    "gold", "indigo", "violet", "coral", "crimson", "salmon", "turquoise", "tomato", "orchid",
    "beige", "ivory", "khaki", "lavender", "plum", "tan", "aqua", "fuchsia", "skyblue",
    "steelblue", "royalblue", "slategray", "slategrey", "forestgreen", "seagreen", "darkred",
    "darkblue", "darkgreen", "lightblue", "lightgreen", "lightgray", "lightgrey", "darkgray",
    "darkgrey", "transparent",
];

const SHADE_PREFIXES: &[&str] = &["light", "dark"];

/// Style properties recognized in "change the X <property> to Y". Longer
/// spellings first so alternation prefers them.
pub(crate) const STYLE_PROPERTIES: &[(&str, &str)] = &[
    ("font[- ]?size", "font-size"),
    ("font[- ]?weight", "font-weight"),
    ("font[- ]?family", "font-family"),
    ("border[- ]?radius", "border-radius"),
    ("box[- ]?shadow", "box-shadow"),
    ("text[- ]?align", "text-align"),
    ("line[- ]?height", "line-height"),
    ("letter[- ]?spacing", "letter-spacing"),
    ("border", "border"),
    ("padding", "padding"),
    ("margin", "margin"),
    ("width", "width"),
    ("height", "height"),
    ("opacity", "opacity"),
    ("cursor", "cursor"),
    ("display", "display"),
    ("shadow", "box-shadow"),
    ("font", "font-family"),
    ("size", "font-size"),
];

/// Words that mark an instruction as talking about elements or styling
/// rather than literal page text.
pub(crate) const ELEMENT_VOCABULARY: &[&str] =
    &["button", "color", "colour", "background", "text", "style"];

/// Words that scope an instruction to whole pages.
pub(crate) const PAGE_SCOPE_WORDS: &[&str] =
    &["page", "website", "site", "layout", "entire", "whole"];

/// Words that may accompany a page-scope word in a target naming the page.
pub(crate) const PAGE_TARGET_FILLER: &[&str] =
    &["the", "all", "of", "my", "our", "this", "web", "home", "main", "landing"];

/// Map a matched property spelling back to its CSS name.
pub(crate) fn canonical_property(matched: &str) -> String {
    let compact: String = matched
        .to_ascii_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    STYLE_PROPERTIES
        .iter()
        .find(|(_, css)| css.replace('-', "") == compact)
        .map(|(_, css)| css.to_string())
        .unwrap_or_else(|| match compact.as_str() {
            "shadow" => "box-shadow".to_string(),
            "font" => "font-family".to_string(),
            "size" => "font-size".to_string(),
            _ => matched.to_ascii_lowercase().replace(' ', "-"),
        })
}

/// Whether a value reads as a CSS color.
pub fn is_color_value(value: &str) -> bool {
    let v = value.trim().trim_end_matches(['.', '!']).to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if ["rgb(", "rgba(", "hsl(", "hsla("]
        .iter()
        .any(|p| v.starts_with(p))
        && v.ends_with(')')
    {
        return true;
    }
    let compact = css_color(&v);
    NAMED_COLORS.contains(&compact.as_str())
        || SHADE_PREFIXES.iter().any(|prefix| {
            compact
                .strip_prefix(prefix)
                .is_some_and(|rest| NAMED_COLORS.contains(&rest))
        })
}

/// Normalize a spoken color into something CSS accepts:
/// "Light Blue" -> "lightblue". Hex and functional values pass through.
pub fn css_color(value: &str) -> String {
    let v = value.trim().trim_end_matches(['.', '!']).trim();
    if v.starts_with('#') || v.contains('(') {
        return v.to_string();
    }
    v.split_whitespace()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_values() {
        for ok in ["red", "Dark Blue", "#fff", "#1a2B3c", "rgb(0, 0, 0)", "light green", "navy."] {
            assert!(is_color_value(ok), "{ok}");
        }
        for bad in ["bigger", "#ggg", "rounded", "text to 'Go'", ""] {
            assert!(!is_color_value(bad), "{bad}");
        }
    }

    #[test]
    fn test_css_color() {
        assert_eq!(css_color("Light Blue"), "lightblue");
        assert_eq!(css_color("#ABC"), "#ABC");
        assert_eq!(css_color("rgb(1, 2, 3)"), "rgb(1, 2, 3)");
    }

    #[test]
    fn test_canonical_property() {
        assert_eq!(canonical_property("border radius"), "border-radius");
        assert_eq!(canonical_property("Font-Size"), "font-size");
        assert_eq!(canonical_property("shadow"), "box-shadow");
        assert_eq!(canonical_property("padding"), "padding");
    }
}
