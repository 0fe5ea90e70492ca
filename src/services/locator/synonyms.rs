//! UI label synonyms.

/// Groups of labels that name the same action. Membership is symmetric.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["login", "log in", "sign in", "signin"],
    &["logout", "log out", "sign out", "signout"],
    &["submit", "send", "save", "confirm", "ok"],
    &["cancel", "close", "back", "dismiss"],
    &["register", "sign up", "signup", "create account", "join"],
    &["delete", "remove", "trash"],
    &["edit", "modify", "update", "change"],
    &["add", "new", "create", "plus"],
    &["search", "find", "go"],
    &["continue", "next", "proceed", "forward"],
    &["previous", "prev", "back"],
    &["buy", "purchase", "checkout", "order", "add to cart", "buy now", "shop now"],
    &["download", "get", "install"],
    &["subscribe", "join newsletter", "follow"],
    &["contact", "contact us", "get in touch", "reach out"],
];

/// Minimum length of a single word from a multi-word target that counts as
/// a synonym on its own.
const MIN_SPLIT_WORD_LEN: usize = 4;

/// Lowercase, replace punctuation with spaces, collapse whitespace.
pub(crate) fn normalize_label(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand a normalized target into the labels that should count as a
/// synonym match. The target itself is not included.
pub(crate) fn expand(target: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        if s != target && !out.iter().any(|o| o == s) {
            out.push(s.to_string());
        }
    };
    for group in SYNONYM_GROUPS {
        if group.contains(&target) {
            for label in group.iter() {
                push(label);
            }
        }
    }
    let words: Vec<&str> = target.split_whitespace().collect();
    if words.len() > 1 {
        for word in words {
            if word.chars().count() >= MIN_SPLIT_WORD_LEN {
                push(word);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_are_symmetric() {
        assert!(expand("login").contains(&"sign in".to_string()));
        assert!(expand("sign in").contains(&"login".to_string()));
        assert!(expand("send").contains(&"submit".to_string()));
    }

    #[test]
    fn test_multi_word_split() {
        let expanded = expand("newsletter sign up");
        assert!(expanded.contains(&"newsletter".to_string()));
        assert!(expanded.contains(&"sign".to_string()));
        assert!(!expanded.contains(&"up".to_string()));
        assert!(!expanded.contains(&"register".to_string()));
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Sign-In  →"), "sign in");
        assert_eq!(normalize_label("Add to Cart!"), "add to cart");
    }
}
