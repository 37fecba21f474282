// ABOUTME: The Minifier capability and its default implementation backed by minify-html.
// ABOUTME: Maps arbor's MinifyConfig onto minify-html's Cfg.

use std::fmt;

use crate::error::{Error, Result};
use crate::options::MinifyConfig;

/// Capability that turns serialized markup into minified markup.
///
/// Implementations run on a blocking worker thread.
pub trait Minifier: Send + Sync + fmt::Debug {
    fn minify(&self, markup: &str, config: &MinifyConfig) -> Result<String>;
}

/// `Minifier` backed by the `minify-html` crate.
///
/// `minify-html` always collapses whitespace, so a config with
/// `collapse_whitespace: false` is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMinifier;

impl HtmlMinifier {
    fn cfg(config: &MinifyConfig) -> minify_html::Cfg {
        let conservative = !config.html5;
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_comments = !config.remove_comments;
        cfg.minify_css = config.minify_css;
        cfg.minify_js = config.minify_js;
        // Without HTML5 omission rules every tag is kept explicit.
        cfg.keep_closing_tags = conservative;
        cfg.keep_html_and_head_opening_tags = conservative;
        cfg.do_not_minify_doctype = conservative;
        cfg.ensure_spec_compliant_unquoted_attribute_values = conservative;
        cfg.keep_spaces_between_attributes = conservative;
        cfg
    }
}

impl Minifier for HtmlMinifier {
    fn minify(&self, markup: &str, config: &MinifyConfig) -> Result<String> {
        if !config.collapse_whitespace {
            return Err(Error::invalid_argument(
                "collapse_whitespace",
                "Minify",
                Some(anyhow::anyhow!(
                    "the built-in minifier always collapses whitespace; supply a custom Minifier"
                )),
            ));
        }

        let out = minify_html::minify(markup.as_bytes(), &Self::cfg(config));
        String::from_utf8(out)
            .map_err(|e| Error::minify("", "Minify", Some(anyhow::Error::new(e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MinifyOptions;

    fn defaults() -> MinifyConfig {
        MinifyOptions::default().resolve()
    }

    #[test]
    fn collapses_whitespace_between_blocks() {
        let out = HtmlMinifier
            .minify("<div>\n    <p>hi</p>\n    <p>bye</p>\n</div>", &defaults())
            .unwrap();
        assert!(!out.contains('\n'), "got {out}");
        assert!(out.contains("hi"));
        assert!(out.contains("bye"));
    }

    #[test]
    fn conservative_mode_keeps_closing_tags() {
        let out = HtmlMinifier.minify("<ul><li>a</li><li>b</li></ul>", &defaults()).unwrap();
        assert!(out.contains("</li>"), "got {out}");
    }

    #[test]
    fn comments_are_kept_unless_removed() {
        let markup = "<div><!-- note --><p>x</p></div>";
        let kept = HtmlMinifier.minify(markup, &defaults()).unwrap();
        assert!(kept.contains("note"), "got {kept}");

        let config = MinifyOptions::default().remove_comments(true).resolve();
        let removed = HtmlMinifier.minify(markup, &config).unwrap();
        assert!(!removed.contains("note"), "got {removed}");
    }

    #[test]
    fn refuses_to_preserve_whitespace() {
        let config = MinifyOptions::default().collapse_whitespace(false).resolve();
        let err = HtmlMinifier.minify("<p> x </p>", &config).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
