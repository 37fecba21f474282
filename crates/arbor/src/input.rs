// ABOUTME: Input sources accepted by the loader and their classification into acquisition plans.
// ABOUTME: Text is checked as a URL, then a filesystem path, and otherwise treated as literal markup.

use std::path::{Path, PathBuf};

use ego_tree::NodeId;
use scraper::Html;

use crate::resource::decode_body;
use crate::source::predicates::{is_path, is_url};

/// Anything the loader can turn into a node or collection.
#[derive(Debug, Clone)]
pub enum Input {
    /// Markup, a URL, or a path, decided by classification.
    Markup(String),
    /// Raw bytes, decoded to text and then classified like `Markup`.
    Bytes(Vec<u8>),
    /// A filesystem path. Never treated as a URL.
    Path(PathBuf),
    /// An already parsed document.
    Html(Html),
    /// Elements previously selected from `html`.
    Selection { html: Html, ids: Vec<NodeId> },
    /// One document or element node of `html`.
    Node { html: Html, id: NodeId },
    /// Several document or element nodes of `html`.
    NodeList { html: Html, ids: Vec<NodeId> },
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Markup(s.to_string())
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Input::Markup(s)
    }
}

impl From<&String> for Input {
    fn from(s: &String) -> Self {
        Input::Markup(s.clone())
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Input::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::Path(path.to_path_buf())
    }
}

impl From<Html> for Input {
    fn from(html: Html) -> Self {
        Input::Html(html)
    }
}

/// Where textual input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    Url(String),
    /// A path given as `Input::Path`.
    Path(PathBuf),
    /// Text shaped like a path. Parsed as markup when no document is found
    /// there.
    PathOrMarkup(String),
    Markup(String),
}

/// How an `Input` will be turned into wrappers.
#[derive(Debug, Clone)]
pub enum AcquisitionPlan {
    AlreadyParsedSingle(Html),
    AlreadyParsedMany(Html, Vec<NodeId>),
    RawNodeSingle(Html, NodeId),
    RawNodeList(Html, Vec<NodeId>),
    TextOrBinary(TextSource),
    /// Nothing usable; loads as the empty node.
    Unrecognized,
}

impl AcquisitionPlan {
    fn label(&self) -> &'static str {
        match self {
            AcquisitionPlan::AlreadyParsedSingle(_) => "already-parsed",
            AcquisitionPlan::AlreadyParsedMany(..) => "selection",
            AcquisitionPlan::RawNodeSingle(..) => "node",
            AcquisitionPlan::RawNodeList(..) => "node-list",
            AcquisitionPlan::TextOrBinary(TextSource::Url(_)) => "url",
            AcquisitionPlan::TextOrBinary(TextSource::Path(_)) => "path",
            AcquisitionPlan::TextOrBinary(TextSource::PathOrMarkup(_)) => "path-or-markup",
            AcquisitionPlan::TextOrBinary(TextSource::Markup(_)) => "markup",
            AcquisitionPlan::Unrecognized => "unrecognized",
        }
    }
}

fn is_document_or_element(html: &Html, id: NodeId) -> bool {
    html.tree
        .get(id)
        .is_some_and(|node| node.value().is_document() || node.value().is_element())
}

fn is_element(html: &Html, id: NodeId) -> bool {
    html.tree
        .get(id)
        .is_some_and(|node| node.value().is_element())
}

/// Classify text as a URL, a path relative to `base`, or literal markup.
pub fn classify_text(text: String, base: &Path) -> TextSource {
    if is_url(&text) {
        TextSource::Url(text.trim().to_string())
    } else if is_path(&text, base) {
        TextSource::PathOrMarkup(text)
    } else {
        TextSource::Markup(text)
    }
}

/// Decide how `input` is acquired. Relative paths are judged against `base`.
pub fn classify(input: Input, base: &Path) -> AcquisitionPlan {
    let plan = match input {
        Input::Html(html) => {
            if html.tree.root().value().is_document() {
                AcquisitionPlan::AlreadyParsedSingle(html)
            } else {
                AcquisitionPlan::Unrecognized
            }
        }
        Input::Selection { html, ids } => {
            let ids = ids.into_iter().filter(|id| is_element(&html, *id)).collect();
            AcquisitionPlan::AlreadyParsedMany(html, ids)
        }
        Input::Node { html, id } => {
            if is_document_or_element(&html, id) {
                AcquisitionPlan::RawNodeSingle(html, id)
            } else {
                AcquisitionPlan::Unrecognized
            }
        }
        Input::NodeList { html, ids } => {
            if ids.iter().all(|id| is_document_or_element(&html, *id)) {
                AcquisitionPlan::RawNodeList(html, ids)
            } else {
                AcquisitionPlan::Unrecognized
            }
        }
        Input::Markup(text) => AcquisitionPlan::TextOrBinary(classify_text(text, base)),
        Input::Bytes(bytes) => {
            AcquisitionPlan::TextOrBinary(classify_text(decode_body(&bytes, None), base))
        }
        Input::Path(path) => AcquisitionPlan::TextOrBinary(TextSource::Path(path)),
    };
    tracing::debug!(plan = plan.label(), "classified input");
    plan
}
