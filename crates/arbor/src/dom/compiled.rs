// ABOUTME: Pre-compiled CSS selector cache keyed by query text.
// ABOUTME: Avoids re-parsing the same selector on every select call.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

use crate::error::{Error, Result};

/// Compiled selectors, or the parse failure message for invalid queries.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Result<Selector, String>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the outcome.
///
/// An invalid query is an `InvalidArgument` error; the failure is cached too.
pub fn get_or_compile(css: &str) -> Result<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return to_result(css, cached);
        }
    }

    let compiled = Selector::parse(css).map_err(|e| e.to_string());
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    let entry = cache.entry(css.to_string()).or_insert(compiled);
    to_result(css, entry)
}

fn to_result(css: &str, cached: &Result<Selector, String>) -> Result<Selector> {
    cached.clone().map_err(|msg| {
        Error::invalid_argument(
            css,
            "Select",
            Some(anyhow::anyhow!("invalid selector: {}", msg)),
        )
    })
}
