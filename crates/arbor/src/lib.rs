// ABOUTME: Main library entry point for arbor, a loader and query layer for HTML/XML documents.
// ABOUTME: Re-exports the public API: Loader, LoaderBuilder, Node, Collection, Input, Error, and options.

//! arbor - load markup from anywhere and walk it with CSS selectors.
//!
//! Input may be literal markup, bytes, a URL (with or without a scheme), a
//! filesystem path, or a tree already parsed by `scraper`. The result is a
//! [`Node`] (or a [`Collection`] for multi-node input) with navigation,
//! selection, serialization, and minification.
//!
//! # Example
//!
//! ```no_run
//! use arbor::{Item, Loader, Error};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let loader = Loader::builder().build();
//!     if let Item::Node(doc) = loader.load("https://example.com").await? {
//!         println!("{}", doc.select_one("title", 0)?.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod dom;
pub mod error;
pub mod input;
pub mod loader;
pub mod options;
pub mod resource;
pub mod source;

pub use crate::dom::{Collection, Dom, HtmlMinifier, Item, Mapped, Minifier, Node, NodeKind};
pub use crate::error::{Error, ErrorCode, Result};
pub use crate::input::{classify, AcquisitionPlan, Input, TextSource};
pub use crate::loader::Loader;
pub use crate::options::{LoaderBuilder, MinifyConfig, MinifyOptions, Options, ParseOptions};
pub use crate::resource::{FetchFailure, Fetcher, HttpFetcher};

/// Load `input` with a default `Loader`.
pub async fn load(input: impl Into<Input>) -> Result<Item> {
    Loader::default().load(input).await
}

/// Parse `markup` into a document node with default options.
pub fn parse(markup: &str) -> Result<Node> {
    Node::parse(markup)
}
