//! Element Locator Integration Tests
//!
//! Confidence bands on realistic pages.

use site_tailor::config::LocatorSettings;
use site_tailor::models::MatchConfidence;
use site_tailor::services::html::HtmlDocument;
use site_tailor::services::ElementLocator;

const FORM: &str = "<form>\
<input type=\"submit\" value=\"Sign In\">\
<button type=\"button\">Save draft</button>\
<button type=\"button\">Publish post</button>\
<a class=\"btn btn-link\" href=\"/help\">Help</a>\
</form>";

fn locator() -> ElementLocator {
    ElementLocator::new(LocatorSettings::default())
}

#[test]
fn test_exact_label_is_a_single_confident_match() {
    let doc = HtmlDocument::parse(FORM);
    for label in ["Sign In", "Save draft", "Publish post", "Help"] {
        let result = locator().locate(&doc, label);
        assert_eq!(result.confidence, MatchConfidence::Confident, "{label}");
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].score, 100);
        assert_eq!(result.candidates[0].text, label);
    }
}

#[test]
fn test_synonym_reaches_sign_in() {
    let doc = HtmlDocument::parse(FORM);
    let result = locator().locate(&doc, "login");
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.candidates[0].text, "Sign In");
    assert!(result.candidates[0].score >= 90);
}

#[test]
fn test_partial_matches_keep_every_candidate() {
    let doc = HtmlDocument::parse(FORM);
    let result = locator().locate(&doc, "publish draft now");
    assert_eq!(result.confidence, MatchConfidence::Ambiguous);
    let labels: Vec<&str> = result.candidates.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(labels, vec!["Save draft", "Publish post"]);
    assert!(result.candidates.iter().all(|c| c.score >= 40 && c.score < 70));
}

#[test]
fn test_thresholds_are_configurable() {
    let doc = HtmlDocument::parse(FORM);
    let strict = ElementLocator::new(LocatorSettings {
        confident_score: 95,
        ..LocatorSettings::default()
    });
    // "login" only reaches Sign In through a synonym (90)
    let result = strict.locate(&doc, "login");
    assert_eq!(result.confidence, MatchConfidence::Ambiguous);
    assert_eq!(result.candidates[0].score, 90);
}
