// ABOUTME: Configuration for arbor: loader Options, ParseOptions, MinifyOptions, and LoaderBuilder.
// ABOUTME: LoaderBuilder provides a fluent API for constructing Loader instances with custom settings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::dom::minify::Minifier;
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::resource::{Fetcher, HttpFetcher};

/// Options handed to the markup parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Fail with a parse error when the parser reports recoverable errors.
    pub strict: bool,
}

/// Caller-facing minification options.
///
/// Every field is optional; unset fields take the defaults documented on
/// `MinifyConfig`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinifyOptions {
    /// `Some(false)` needs a custom `Minifier`: the default `HtmlMinifier`
    /// always collapses whitespace and rejects it with `InvalidArgument`.
    pub collapse_whitespace: Option<bool>,
    pub html5: Option<bool>,
    pub remove_comments: Option<bool>,
    #[serde(rename = "minifyCSS")]
    pub minify_css: Option<bool>,
    #[serde(rename = "minifyJS")]
    pub minify_js: Option<bool>,
}

/// Fully resolved minification settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinifyConfig {
    /// Defaults to `true`.
    pub collapse_whitespace: bool,
    /// Allow HTML5 tag omission rules. Defaults to `false`.
    pub html5: bool,
    /// Defaults to `false`.
    pub remove_comments: bool,
    pub minify_css: bool,
    pub minify_js: bool,
}

impl MinifyOptions {
    /// Parse options from a JSON object such as `{"collapseWhitespace": false}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::invalid_argument(json, "MinifyOptions", Some(anyhow::Error::new(e)))
        })
    }

    /// See the field docs: `false` is only honoured by custom minifiers.
    pub fn collapse_whitespace(mut self, on: bool) -> Self {
        self.collapse_whitespace = Some(on);
        self
    }

    pub fn html5(mut self, on: bool) -> Self {
        self.html5 = Some(on);
        self
    }

    pub fn remove_comments(mut self, on: bool) -> Self {
        self.remove_comments = Some(on);
        self
    }

    /// Fill unset fields with their defaults.
    pub fn resolve(&self) -> MinifyConfig {
        MinifyConfig {
            collapse_whitespace: self.collapse_whitespace.unwrap_or(true),
            html5: self.html5.unwrap_or(false),
            remove_comments: self.remove_comments.unwrap_or(false),
            minify_css: self.minify_css.unwrap_or(false),
            minify_js: self.minify_js.unwrap_or(false),
        }
    }
}

/// Configuration options for a `Loader`.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory relative paths are resolved against. `None` means the
    /// process working directory at load time.
    pub base_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub http_client: Option<reqwest::Client>,
    pub parse: ParseOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_dir: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("arbor/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
            http_client: None,
            parse: ParseOptions::default(),
        }
    }
}

/// Builder for constructing Loader instances with custom configuration.
#[derive(Debug, Clone)]
pub struct LoaderBuilder {
    opts: Options,
    minifier: Option<Arc<dyn Minifier>>,
}

impl LoaderBuilder {
    /// Create a new LoaderBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
            minifier: None,
        }
    }

    /// Set the directory relative paths are resolved against.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.opts.base_dir = Some(dir.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Reject documents the parser had to repair.
    pub fn strict(mut self, strict: bool) -> Self {
        self.opts.parse.strict = strict;
        self
    }

    /// Use a custom minifier for every document this loader produces.
    pub fn minifier(mut self, minifier: Arc<dyn Minifier>) -> Self {
        self.minifier = Some(minifier);
        self
    }

    /// Build a Loader that fetches with reqwest.
    pub fn build(self) -> Loader {
        let fetcher = HttpFetcher::new(&self.opts);
        self.build_with_fetcher(fetcher)
    }

    /// Build a Loader around any `Fetcher`.
    pub fn build_with_fetcher<F: Fetcher>(self, fetcher: F) -> Loader<F> {
        Loader::from_parts(self.opts, fetcher, self.minifier)
    }
}

impl Default for LoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
