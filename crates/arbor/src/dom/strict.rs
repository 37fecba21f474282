// ABOUTME: Strict-mode validation: reports the structural repairs html5ever made to a document.
// ABOUTME: Missing doctypes, XML declarations, and self-closing syntax are tolerated before checking.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::Html;

static LEADING_DOCTYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*(?:<!--.*?-->\s*)*<!doctype\b").unwrap());

static PROCESSING_INSTRUCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<\?.*?\?>").unwrap());

static SELF_CLOSING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9:._-]*)(\s[^<>]*?)?\s*/>").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

// Rewrites XML-flavoured syntax into the HTML form html5ever accepts silently.
fn normalize(markup: &str) -> String {
    let stripped = PROCESSING_INSTRUCTION_RE.replace_all(markup, "");
    let expanded = SELF_CLOSING_RE.replace_all(&stripped, |caps: &Captures| {
        let name = &caps[1];
        if VOID_ELEMENTS.iter().any(|v| name.eq_ignore_ascii_case(v)) {
            return caps[0].to_string();
        }
        let attrs = caps.get(2).map_or("", |m| m.as_str());
        format!("<{name}{attrs}></{name}>")
    });
    if LEADING_DOCTYPE_RE.is_match(&expanded) {
        expanded.into_owned()
    } else {
        format!("<!DOCTYPE html>{expanded}")
    }
}

/// Errors html5ever reports while repairing `markup`.
///
/// A missing doctype, `<?...?>` declarations and processing instructions,
/// and `<name/>` on non-void elements are not counted.
pub(crate) fn repair_errors(markup: &str) -> Vec<String> {
    Html::parse_document(&normalize(markup))
        .errors
        .into_iter()
        .map(Cow::into_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fragment_without_doctype_is_clean() {
        assert_eq!(
            repair_errors(r#"<div id="a"><p>hi</p><p>bye</p></div>"#),
            Vec::<String>::new()
        );
    }

    #[test]
    fn xml_document_is_clean() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<root><item/><item id="2" /></root>"#;
        assert_eq!(repair_errors(xml), Vec::<String>::new());
    }

    #[test]
    fn void_self_closing_tags_stay_void() {
        assert_eq!(normalize("<p>a<br/>b</p>"), "<!DOCTYPE html><p>a<br/>b</p>");
        assert!(repair_errors("<p>a<br/>b</p>").is_empty());
    }

    #[test]
    fn existing_doctype_is_kept() {
        let doc = "<!-- lead --><!doctype html><title>t</title>";
        assert_eq!(normalize(doc), doc);
    }

    #[test]
    fn mismatched_end_tag_is_reported() {
        assert!(!repair_errors("<p>unclosed</div>").is_empty());
    }
}
