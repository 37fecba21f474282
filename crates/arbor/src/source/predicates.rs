// ABOUTME: Total, side-effect-free predicates used to classify textual input.
// ABOUTME: Decides whether a string is a URL, a filesystem path, or carries a markup extension.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use url::{Host, Url};

use super::path::names_match_prefix;

/// Extensions recognized as markup documents (compared case-insensitively).
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "xml"];

// File extensions that look like TLDs but are never treated as a bare host.
const NON_HOST_SUFFIXES: &[&str] = &["html", "htm", "xhtml", "xml"];

static INVALID_PATH_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>"|?*\x00-\x1F]"#).unwrap());

static TLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]{2,63}$").unwrap());

/// Returns true if `name` ends in `.html` or `.xml`, ignoring case.
pub fn is_markup_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKUP_EXTENSIONS
                .iter()
                .any(|m| ext.eq_ignore_ascii_case(m))
        })
        .unwrap_or(false)
}

/// Returns true if `s` is an absolute http(s) URL, or a scheme-less host
/// that becomes one once `https://` is prepended.
pub fn is_url(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || s.contains(char::is_whitespace) || s.contains('<') {
        return false;
    }

    if let Ok(url) = Url::parse(s) {
        if matches!(url.scheme(), "http" | "https") {
            return url.host_str().is_some_and(|h| !h.is_empty());
        }
    }

    if s.contains("://") || s.contains('@') {
        return false;
    }

    match Url::parse(&format!("https://{}", s)) {
        Ok(url) => match url.host() {
            Some(Host::Domain(domain)) => looks_like_domain(domain),
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
            None => false,
        },
        Err(_) => false,
    }
}

fn looks_like_domain(domain: &str) -> bool {
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }
    let tld = labels[labels.len() - 1];
    TLD_RE.is_match(tld)
        && !NON_HOST_SUFFIXES
            .iter()
            .any(|suffix| tld.eq_ignore_ascii_case(suffix))
}

/// Returns true if `s` should be treated as a filesystem path relative to
/// `base`.
///
/// The string must be a single line free of characters that are invalid in
/// paths on any platform, and it must look like a path: contain a separator,
/// start with `.`, carry a markup extension, exist on disk, or name a
/// markup file by its stem (`page` for `page.html`).
pub fn is_path(s: &str, base: &Path) -> bool {
    let s = s.trim();
    if s.is_empty() || INVALID_PATH_CHARS.is_match(s) {
        return false;
    }

    if s.contains('/') || s.contains('\\') || s.starts_with('.') {
        return true;
    }
    if is_markup_extension(s) {
        return true;
    }

    let candidate = base.join(s);
    if candidate.exists() {
        return true;
    }

    match std::fs::read_dir(base) {
        Ok(entries) => entries.flatten().any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            is_markup_extension(&name) && names_match_prefix(&name, s)
        }),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn markup_extension_is_case_insensitive() {
        assert!(is_markup_extension("index.html"));
        assert!(is_markup_extension("INDEX.HTML"));
        assert!(is_markup_extension("feed.Xml"));
        assert!(!is_markup_extension("notes.txt"));
        assert!(!is_markup_extension("html"));
    }

    #[test]
    fn absolute_urls() {
        assert!(is_url("https://example.com"));
        assert!(is_url("http://example.com/path?q=1"));
        assert!(is_url("http://127.0.0.1:8080/x"));
        assert!(!is_url("ftp://example.com/file"));
        assert!(!is_url("file:///etc/hosts"));
    }

    #[test]
    fn scheme_less_urls() {
        assert!(is_url("example.com"));
        assert!(is_url("www.example.co.uk/some/page"));
        assert!(is_url("localhost:3000"));
        assert!(is_url("10.0.0.1/status"));
    }

    #[test]
    fn strings_that_are_not_urls() {
        assert!(!is_url(""));
        assert!(!is_url("<p>hello</p>"));
        assert!(!is_url("hello world"));
        assert!(!is_url("page.html"));
        assert!(!is_url("./docs/page.html"));
        assert!(!is_url("docs/page"));
        assert!(!is_url("user@example.com"));
    }

    #[test]
    fn markup_is_never_a_path() {
        let dir = TempDir::new().unwrap();
        assert!(!is_path("<div>hi</div>", dir.path()));
        assert!(!is_path("line one\nline two", dir.path()));
        assert!(!is_path("", dir.path()));
    }

    #[test]
    fn path_shapes() {
        let dir = TempDir::new().unwrap();
        assert!(is_path("docs/page", dir.path()));
        assert!(is_path("./page", dir.path()));
        assert!(is_path("page.html", dir.path()));
        assert!(!is_path("hello", dir.path()));
    }

    #[test]
    fn leading_tilde_alone_is_not_a_path() {
        let dir = TempDir::new().unwrap();
        assert!(!is_path("~tilde", dir.path()));
    }

    #[test]
    fn bare_name_is_a_path_when_something_matches_on_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("about.html"), "<p>about</p>").unwrap();
        fs::create_dir(dir.path().join("blog")).unwrap();

        assert!(is_path("about", dir.path()));
        assert!(is_path("blog", dir.path()));
        assert!(!is_path("contact", dir.path()));
    }
}
