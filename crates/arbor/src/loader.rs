// ABOUTME: The Loader entry point that turns any Input into node and collection wrappers.
// ABOUTME: Classifies input, then fetches, reads from disk, or wraps an existing tree before parsing.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use ego_tree::NodeId;
use scraper::Html;

use crate::dom::minify::{HtmlMinifier, Minifier};
use crate::dom::{Collection, Dom, Item, Node};
use crate::error::{Error, Result};
use crate::input::{classify, AcquisitionPlan, Input, TextSource};
use crate::options::{LoaderBuilder, Options};
use crate::resource::{fetch_markup, Fetcher, HttpFetcher};
use crate::source::load::load_document;
use crate::source::path::resolve;

/// Loads documents from markup, bytes, URLs, paths, or parsed trees.
#[derive(Debug)]
pub struct Loader<F = HttpFetcher> {
    opts: Options,
    fetcher: F,
    minifier: Arc<dyn Minifier>,
}

impl Loader {
    /// Create a new LoaderBuilder for configuring the loader.
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::new()
    }

    /// Create a new Loader with the given options.
    pub fn new(opts: Options) -> Self {
        let fetcher = HttpFetcher::new(&opts);
        Self::from_parts(opts, fetcher, None)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl<F: Fetcher> Loader<F> {
    /// Assemble a loader from its parts. `None` selects `HtmlMinifier`.
    pub fn from_parts(opts: Options, fetcher: F, minifier: Option<Arc<dyn Minifier>>) -> Self {
        Self {
            opts,
            fetcher,
            minifier: minifier.unwrap_or_else(|| Arc::new(HtmlMinifier)),
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    fn base_dir(&self) -> Result<PathBuf> {
        match &self.opts.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|e| {
                Error::filesystem(".", "CurrentDir", Some(anyhow::Error::new(e)))
            }),
        }
    }

    fn adopt(&self, html: Html) -> Rc<Dom> {
        Dom::new(html, Arc::clone(&self.minifier))
    }

    /// Parse `markup` into a document node.
    pub fn parse(&self, markup: &str) -> Result<Node> {
        let dom = Dom::parse(markup, self.opts.parse, Arc::clone(&self.minifier))?;
        Ok(Node::document(&dom))
    }

    /// Load `input` into a node or a collection.
    ///
    /// Missing or ambiguous documents and unusable input yield the empty
    /// node rather than an error. Text that only looks like a path is parsed
    /// as markup when no document is found there.
    pub async fn load(&self, input: impl Into<Input>) -> Result<Item> {
        let base = self.base_dir()?;
        match classify(input.into(), &base) {
            AcquisitionPlan::AlreadyParsedSingle(html) => {
                Ok(Item::Node(Node::document(&self.adopt(html))))
            }
            AcquisitionPlan::AlreadyParsedMany(html, ids)
            | AcquisitionPlan::RawNodeList(html, ids) => {
                self.wrap_many(html, &ids).map(Item::Collection)
            }
            AcquisitionPlan::RawNodeSingle(html, id) => {
                Node::new(&self.adopt(html), id).map(Item::Node)
            }
            AcquisitionPlan::TextOrBinary(TextSource::Url(url)) => {
                tracing::debug!(url = %url, "loading remote document");
                let markup = fetch_markup(&self.fetcher, &url).await?;
                self.parse(&markup).map(Item::Node)
            }
            AcquisitionPlan::TextOrBinary(TextSource::Path(path)) => {
                match self.read_local(&path, &base)? {
                    Some(markup) => self.parse(&markup).map(Item::Node),
                    None => Ok(Item::Node(Node::empty())),
                }
            }
            AcquisitionPlan::TextOrBinary(TextSource::PathOrMarkup(text)) => {
                match self.read_local(Path::new(text.trim()), &base)? {
                    Some(markup) => self.parse(&markup).map(Item::Node),
                    None => {
                        tracing::debug!("no document at path-like input, parsing it as markup");
                        self.parse(&text).map(Item::Node)
                    }
                }
            }
            AcquisitionPlan::TextOrBinary(TextSource::Markup(markup)) => {
                self.parse(&markup).map(Item::Node)
            }
            AcquisitionPlan::Unrecognized => Ok(Item::Node(Node::empty())),
        }
    }

    fn read_local(&self, path: &Path, base: &Path) -> Result<Option<String>> {
        let resolved = resolve(path, base)?;
        tracing::debug!(
            path = %resolved.absolute_path.display(),
            kind = ?resolved.kind,
            "loading local document"
        );
        load_document(&resolved)
    }

    fn wrap_many(&self, html: Html, ids: &[NodeId]) -> Result<Collection> {
        let dom = self.adopt(html);
        let nodes = ids
            .iter()
            .map(|id| Node::new(&dom, *id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Collection::from(nodes))
    }
}
