// ABOUTME: Node and collection wrappers over scraper's parsed document tree.
// ABOUTME: Provides traversal, CSS selection, serialization, and minification helpers.

//! DOM wrappers.
//!
//! A parsed document lives in a [`Dom`] shared by every [`Node`] that points
//! into it. A [`Collection`] broadcasts node operations over its members.
//!
//! Submodules:
//! - `compiled`: process-wide cache of compiled CSS selectors.
//! - `minify`: the `Minifier` capability and its `minify-html` implementation.
//! - `strict`: repair detection behind `ParseOptions::strict`.

pub mod collection;
pub mod compiled;
pub mod minify;
pub mod node;
mod strict;

pub use collection::{Collection, Item, Mapped};
pub use minify::{HtmlMinifier, Minifier};
pub use node::{Dom, Node, NodeKind};
