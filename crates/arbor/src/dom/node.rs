// ABOUTME: Node wrapper over a single document or element of a scraper-parsed tree.
// ABOUTME: Provides navigation, identity, serialization, CSS selection, and minification for one node.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Selector};

use crate::dom::collection::Collection;
use crate::dom::compiled::get_or_compile;
use crate::dom::minify::{HtmlMinifier, Minifier};
use crate::dom::strict::repair_errors;
use crate::error::{Error, Result};
use crate::options::{MinifyOptions, ParseOptions};

type TreeNode<'a> = NodeRef<'a, scraper::Node>;

/// A parsed document and the minifier its nodes use.
#[derive(Debug)]
pub struct Dom {
    html: Html,
    minifier: Arc<dyn Minifier>,
}

impl Dom {
    pub fn new(html: Html, minifier: Arc<dyn Minifier>) -> Rc<Self> {
        Rc::new(Self { html, minifier })
    }

    /// Parse `markup` as a full document.
    ///
    /// With `opts.strict`, markup the parser had to restructure (stray end
    /// tags, misnested or unclosed elements) is returned as a parse error. A
    /// missing doctype, XML declarations, and self-closing tags are accepted.
    pub fn parse(
        markup: &str,
        opts: ParseOptions,
        minifier: Arc<dyn Minifier>,
    ) -> Result<Rc<Self>> {
        if opts.strict {
            let errors = repair_errors(markup);
            if !errors.is_empty() {
                return Err(Error::parse(
                    "",
                    "Parse",
                    Some(anyhow::anyhow!("{}", errors.join("; "))),
                ));
            }
        }
        Ok(Self::new(Html::parse_document(markup), minifier))
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn minifier(&self) -> &Arc<dyn Minifier> {
        &self.minifier
    }
}

/// Node wrapped by the tree root, an element, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Empty,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Document => "document",
            NodeKind::Element => "element",
            NodeKind::Empty => "empty",
        };
        write!(f, "{}", s)
    }
}

fn is_recognized(node: &scraper::Node) -> bool {
    node.is_document() || node.is_element()
}

fn is_element(node: &TreeNode<'_>) -> bool {
    node.value().is_element()
}

/// A single document or element node, or the empty placeholder.
///
/// Nodes are cheap to clone; clones share the underlying document. Two nodes
/// are equal when they point at the same node of the same document, or are
/// both empty.
#[derive(Clone, Default)]
pub struct Node {
    handle: Option<(Rc<Dom>, NodeId)>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (&self.handle, &other.handle) {
            (Some((a, x)), Some((b, y))) => Rc::ptr_eq(a, b) && x == y,
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("id", &self.id())
            .finish()
    }
}

impl Node {
    /// Wrap node `id` of `dom`.
    ///
    /// Fails with `InvalidArgument` when `id` is not part of the document or
    /// names something other than the document root or an element.
    pub fn new(dom: &Rc<Dom>, id: NodeId) -> Result<Self> {
        match dom.html.tree.get(id) {
            Some(node) if is_recognized(node.value()) => Ok(Self {
                handle: Some((Rc::clone(dom), id)),
            }),
            Some(_) => Err(Error::invalid_argument(
                format!("{:?}", id),
                "Node",
                Some(anyhow::anyhow!("invalid node type")),
            )),
            None => Err(Error::invalid_argument(
                format!("{:?}", id),
                "Node",
                Some(anyhow::anyhow!("node is not part of the document")),
            )),
        }
    }

    /// The empty placeholder.
    pub fn empty() -> Self {
        Self { handle: None }
    }

    /// The root node of `dom`.
    pub fn document(dom: &Rc<Dom>) -> Self {
        Self {
            handle: Some((Rc::clone(dom), dom.html.tree.root().id())),
        }
    }

    /// Parse `markup` with the default minifier and wrap its root.
    pub fn parse(markup: &str) -> Result<Self> {
        let dom = Dom::parse(markup, ParseOptions::default(), Arc::new(HtmlMinifier))?;
        Ok(Self::document(&dom))
    }

    // Ids handed out by the tree itself are always document or element nodes.
    fn adopt(&self, id: NodeId) -> Self {
        Self {
            handle: self.handle.as_ref().map(|(dom, _)| (Rc::clone(dom), id)),
        }
    }

    fn tree_node(&self) -> Option<TreeNode<'_>> {
        let (dom, id) = self.handle.as_ref()?;
        dom.html.tree.get(*id)
    }

    fn element(&self) -> Option<ElementRef<'_>> {
        self.tree_node().and_then(ElementRef::wrap)
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    pub fn id(&self) -> Option<NodeId> {
        self.handle.as_ref().map(|(_, id)| *id)
    }

    /// The shared document this node belongs to.
    pub fn dom(&self) -> Option<&Rc<Dom>> {
        self.handle.as_ref().map(|(dom, _)| dom)
    }

    /// The underlying parsed document.
    pub fn html(&self) -> Option<&Html> {
        self.dom().map(|dom| dom.html())
    }

    pub fn kind(&self) -> NodeKind {
        match self.tree_node() {
            None => NodeKind::Empty,
            Some(node) if node.value().is_document() => NodeKind::Document,
            Some(_) => NodeKind::Element,
        }
    }

    /// Tag name, or `""` for anything that is not an element.
    pub fn name(&self) -> &str {
        self.element().map(|el| el.value().name()).unwrap_or("")
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.element()
            .map(|el| {
                el.value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element().and_then(|el| el.value().attr(name))
    }

    pub fn parent(&self) -> Option<Node> {
        let parent = self.tree_node()?.parent()?;
        is_recognized(parent.value()).then(|| self.adopt(parent.id()))
    }

    fn element_children(&self) -> Vec<Node> {
        match self.tree_node() {
            Some(node) => node
                .children()
                .filter(is_element)
                .map(|c| self.adopt(c.id()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Element children in order, `None` when there are none.
    pub fn children(&self) -> Option<Collection> {
        let children = self.element_children();
        (!children.is_empty()).then(|| Collection::from(children))
    }

    pub fn first_child(&self) -> Option<Node> {
        let child = self.tree_node()?.children().find(is_element)?;
        Some(self.adopt(child.id()))
    }

    pub fn last_child(&self) -> Option<Node> {
        let child = self.tree_node()?.children().rev().find(is_element)?;
        Some(self.adopt(child.id()))
    }

    /// The next element sibling, skipping text and comments.
    pub fn next_sibling(&self) -> Option<Node> {
        let sibling = self.tree_node()?.next_siblings().find(is_element)?;
        Some(self.adopt(sibling.id()))
    }

    /// The previous element sibling, skipping text and comments.
    pub fn previous_sibling(&self) -> Option<Node> {
        let sibling = self.tree_node()?.prev_siblings().find(is_element)?;
        Some(self.adopt(sibling.id()))
    }

    /// Element siblings including this node, in document order.
    pub fn siblings(&self) -> Collection {
        let Some(node) = self.tree_node() else {
            return Collection::default();
        };
        match node.parent() {
            Some(parent) => parent
                .children()
                .filter(is_element)
                .map(|c| self.adopt(c.id()))
                .collect::<Vec<_>>()
                .into(),
            None if is_element(&node) => Collection::from(vec![self.clone()]),
            None => Collection::default(),
        }
    }

    /// The document root this node hangs from.
    pub fn root(&self) -> Node {
        match self.tree_node().and_then(|node| node.ancestors().last()) {
            Some(top) => self.adopt(top.id()),
            None => self.clone(),
        }
    }

    /// Concatenated text of all descendant text nodes. Comments are skipped.
    pub fn text(&self) -> String {
        match self.tree_node() {
            Some(node) => node
                .descendants()
                .filter_map(|d| d.value().as_text())
                .map(|t| &**t)
                .collect(),
            None => String::new(),
        }
    }

    /// Serialized markup of this node.
    pub fn markup(&self) -> String {
        match (self.dom(), self.tree_node()) {
            (Some(dom), Some(node)) => match ElementRef::wrap(node) {
                Some(el) => el.html(),
                None => dom.html.html(),
            },
            _ => String::new(),
        }
    }

    /// Serialized markup of this node's element children, concatenated.
    ///
    /// Text and comments directly under the node are left out.
    pub fn inner_markup(&self) -> String {
        match self.tree_node() {
            Some(node) => node
                .children()
                .filter_map(ElementRef::wrap)
                .map(|el| el.html())
                .collect(),
            None => String::new(),
        }
    }

    fn matches(&self, selector: &Selector) -> Vec<Node> {
        let Some(node) = self.tree_node() else {
            return Vec::new();
        };
        node.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .map(|el| self.adopt(el.id()))
            .collect()
    }

    /// Descendant elements matching `query`, in document order.
    ///
    /// `limit` of `Some(n)` keeps the first `n` matches; `None` or `Some(0)`
    /// keeps all of them.
    pub fn select(&self, query: &str, limit: Option<usize>) -> Result<Collection> {
        let selector = get_or_compile(query)?;
        let mut found = self.matches(&selector);
        if let Some(n) = limit {
            if n > 0 && n < found.len() {
                found.truncate(n);
            }
        }
        Ok(Collection::from(found))
    }

    /// The `nth` (1-based) match of `query`.
    ///
    /// `nth` of 0 or past the last match picks the first match; no match at
    /// all gives the empty node.
    pub fn select_one(&self, query: &str, nth: usize) -> Result<Node> {
        let selector = get_or_compile(query)?;
        let found = self.matches(&selector);
        let index = if nth > 0 && nth <= found.len() { nth - 1 } else { 0 };
        Ok(found.into_iter().nth(index).unwrap_or_default())
    }

    /// The element child at 1-based `position`.
    pub fn nth_child(&self, position: i64) -> Result<Option<Node>> {
        if position < 1 {
            return Err(Error::invalid_argument(
                position.to_string(),
                "NthChild",
                Some(anyhow::anyhow!("expected position to be >= 1")),
            ));
        }
        let Ok(index) = usize::try_from(position - 1) else {
            return Ok(None);
        };
        Ok(self
            .tree_node()
            .and_then(|node| node.children().filter(is_element).nth(index))
            .map(|c| self.adopt(c.id())))
    }

    /// Minify this node's markup.
    pub async fn minify(&self, options: &MinifyOptions) -> Result<String> {
        self.run_minifier(self.markup(), options).await
    }

    /// Minify the markup of this node's children.
    pub async fn inner_minify(&self, options: &MinifyOptions) -> Result<String> {
        self.run_minifier(self.inner_markup(), options).await
    }

    async fn run_minifier(&self, markup: String, options: &MinifyOptions) -> Result<String> {
        let config = options.resolve();
        let minifier: Arc<dyn Minifier> = match self.dom() {
            Some(dom) => Arc::clone(&dom.minifier),
            None => Arc::new(HtmlMinifier),
        };
        tokio::task::spawn_blocking(move || minifier.minify(&markup, &config))
            .await
            .map_err(|e| Error::minify("", "Minify", Some(anyhow::Error::new(e))))?
    }
}
