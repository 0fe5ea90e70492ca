//! Inline `style` attribute parsing and rewriting.

/// Ordered list of inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclarations {
    entries: Vec<(String, String)>,
}

impl StyleDeclarations {
    /// Parse a `style` attribute value. Semicolons inside parentheses or
    /// quotes (e.g. `url(data:image/png;base64,..)`) do not split.
    pub fn parse(input: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for decl in split_declarations(input) {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            match entries.iter_mut().find(|(n, _)| *n == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => entries.push((name, value.to_string())),
            }
        }
        Self { entries }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set or overwrite a property, keeping its position if it exists.
    pub fn set(&mut self, property: &str, value: &str) {
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim().trim_end_matches(';').trim().to_string();
        match self.entries.iter_mut().find(|(n, _)| *n == property) {
            Some(existing) => existing.1 = value,
            None => self.entries.push((property, value)),
        }
    }

    pub fn remove(&mut self, property: &str) -> bool {
        let property = property.trim().to_ascii_lowercase();
        let before = self.entries.len();
        self.entries.retain(|(n, _)| *n != property);
        self.entries.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for StyleDeclarations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .entries
            .iter()
            .map(|(n, v)| format!("{}: {}", n, v))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)?;
        if !self.entries.is_empty() {
            write!(f, ";")?;
        }
        Ok(())
    }
}

fn split_declarations(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_get() {
        let style = StyleDeclarations::parse("Color: red; padding:4px 8px;;");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("PADDING"), Some("4px 8px"));
        assert_eq!(style.get("margin"), None);
    }

    #[test]
    fn test_set_keeps_order_and_overwrites() {
        let mut style = StyleDeclarations::parse("color: red; padding: 4px");
        style.set("color", "blue;");
        style.set("border-radius", "6px");
        assert_eq!(
            style.to_string(),
            "color: blue; padding: 4px; border-radius: 6px;"
        );
    }

    #[test]
    fn test_semicolon_inside_url_does_not_split() {
        let style =
            StyleDeclarations::parse("background: url(data:image/png;base64,AAAA) no-repeat; color: red");
        assert_eq!(
            style.get("background"),
            Some("url(data:image/png;base64,AAAA) no-repeat")
        );
        assert_eq!(style.get("color"), Some("red"));
    }

    #[test]
    fn test_remove() {
        let mut style = StyleDeclarations::parse("color: red");
        assert!(style.remove("color"));
        assert!(!style.remove("color"));
        assert!(style.is_empty());
        assert_eq!(style.to_string(), "");
    }
}
