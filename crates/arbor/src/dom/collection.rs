// ABOUTME: Ordered collection of nodes and nested collections that broadcasts node operations.
// ABOUTME: Navigation keeps positions with Absent placeholders; value getters return Mapped results.

use std::collections::BTreeMap;

use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;

use crate::dom::node::{Node, NodeKind};
use crate::error::{Error, Result};
use crate::options::MinifyOptions;

/// One member of a `Collection`.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(Node),
    Collection(Collection),
    /// Placeholder for a member that produced no result.
    Absent,
}

impl Item {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Item::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Item::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Item::Absent)
    }
}

impl From<Node> for Item {
    fn from(node: Node) -> Self {
        Item::Node(node)
    }
}

impl From<Collection> for Item {
    fn from(collection: Collection) -> Self {
        Item::Collection(collection)
    }
}

impl From<Option<Node>> for Item {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Item::Absent, Item::Node)
    }
}

impl From<Option<Collection>> for Item {
    fn from(collection: Option<Collection>) -> Self {
        collection.map_or(Item::Absent, Item::Collection)
    }
}

/// Result of a value getter applied to one collection member.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapped<T> {
    Value(T),
    Nested(Vec<Mapped<T>>),
    Absent,
}

impl<T> Mapped<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Mapped::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Flatten results depth-first, dropping absent entries.
    pub fn values(results: Vec<Mapped<T>>) -> Vec<T> {
        let mut out = Vec::new();
        for result in results {
            match result {
                Mapped::Value(v) => out.push(v),
                Mapped::Nested(nested) => out.extend(Mapped::values(nested)),
                Mapped::Absent => {}
            }
        }
        out
    }
}

/// Ordered, possibly nested, set of nodes.
///
/// Node operations called on a collection are applied to every member in
/// order. Nested collections receive the call recursively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    items: Vec<Item>,
}

impl From<Vec<Node>> for Collection {
    fn from(nodes: Vec<Node>) -> Self {
        Self {
            items: nodes.into_iter().map(Item::Node).collect(),
        }
    }
}

impl From<Vec<Item>> for Collection {
    fn from(items: Vec<Item>) -> Self {
        Self { items }
    }
}

impl FromIterator<Item> for Collection {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Collection {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Build from optional members, dropping the `None` ones.
    pub fn from_options(items: impl IntoIterator<Item = Option<Item>>) -> Self {
        items.into_iter().flatten().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Member at `index`; negative indices count from the end.
    pub fn pick(&self, index: isize) -> Option<&Item> {
        let position = if index < 0 {
            self.items.len().checked_sub(index.unsigned_abs())?
        } else {
            index.unsigned_abs()
        };
        self.items.get(position)
    }

    fn broadcast<T>(&self, f: &impl Fn(&Node) -> T) -> Vec<Mapped<T>> {
        self.items
            .iter()
            .map(|item| match item {
                Item::Node(node) => Mapped::Value(f(node)),
                Item::Collection(nested) => Mapped::Nested(nested.broadcast(f)),
                Item::Absent => Mapped::Absent,
            })
            .collect()
    }

    fn spread(&self, f: &impl Fn(&Node) -> Item) -> Collection {
        self.items
            .iter()
            .map(|item| match item {
                Item::Node(node) => f(node),
                Item::Collection(nested) => Item::Collection(nested.spread(f)),
                Item::Absent => Item::Absent,
            })
            .collect()
    }

    fn try_spread(&self, f: &impl Fn(&Node) -> Result<Item>) -> Result<Collection> {
        self.items
            .iter()
            .map(|item| match item {
                Item::Node(node) => f(node),
                Item::Collection(nested) => nested.try_spread(f).map(Item::Collection),
                Item::Absent => Ok(Item::Absent),
            })
            .collect()
    }

    pub fn name(&self) -> Vec<Mapped<String>> {
        self.broadcast(&|node| node.name().to_string())
    }

    pub fn kind(&self) -> Vec<Mapped<NodeKind>> {
        self.broadcast(&Node::kind)
    }

    pub fn attributes(&self) -> Vec<Mapped<BTreeMap<String, String>>> {
        self.broadcast(&Node::attributes)
    }

    pub fn attr(&self, name: &str) -> Vec<Mapped<Option<String>>> {
        self.broadcast(&|node| node.attr(name).map(str::to_string))
    }

    pub fn text(&self) -> Vec<Mapped<String>> {
        self.broadcast(&Node::text)
    }

    pub fn markup(&self) -> Vec<Mapped<String>> {
        self.broadcast(&Node::markup)
    }

    pub fn inner_markup(&self) -> Vec<Mapped<String>> {
        self.broadcast(&Node::inner_markup)
    }

    pub fn parent(&self) -> Collection {
        self.spread(&|node| Item::from(node.parent()))
    }

    pub fn children(&self) -> Collection {
        self.spread(&|node| Item::from(node.children()))
    }

    pub fn first_child(&self) -> Collection {
        self.spread(&|node| Item::from(node.first_child()))
    }

    pub fn last_child(&self) -> Collection {
        self.spread(&|node| Item::from(node.last_child()))
    }

    pub fn next_sibling(&self) -> Collection {
        self.spread(&|node| Item::from(node.next_sibling()))
    }

    pub fn previous_sibling(&self) -> Collection {
        self.spread(&|node| Item::from(node.previous_sibling()))
    }

    pub fn siblings(&self) -> Collection {
        self.spread(&|node| Item::Collection(node.siblings()))
    }

    pub fn root(&self) -> Collection {
        self.spread(&|node| Item::Node(node.root()))
    }

    pub fn select(&self, query: &str, limit: Option<usize>) -> Result<Collection> {
        self.try_spread(&|node| node.select(query, limit).map(Item::Collection))
    }

    pub fn select_one(&self, query: &str, nth: usize) -> Result<Collection> {
        self.try_spread(&|node| node.select_one(query, nth).map(Item::Node))
    }

    /// Fails up front for `position < 1`, even on an empty collection.
    pub fn nth_child(&self, position: i64) -> Result<Collection> {
        if position < 1 {
            return Err(Error::invalid_argument(
                position.to_string(),
                "NthChild",
                Some(anyhow::anyhow!("expected position to be >= 1")),
            ));
        }
        self.try_spread(&|node| node.nth_child(position).map(Item::from))
    }

    /// Call `f` with each member and its index.
    pub fn each(&self, mut f: impl FnMut(&Item, usize)) -> &Self {
        for (i, item) in self.items.iter().enumerate() {
            f(item, i);
        }
        self
    }

    /// Call `f` with each member.
    pub fn for_each(&self, mut f: impl FnMut(&Item)) -> &Self {
        self.items.iter().for_each(&mut f);
        self
    }

    /// New collection of the results of `f`; `None` results are dropped.
    pub fn map(&self, mut f: impl FnMut(&Item, usize) -> Option<Item>) -> Collection {
        Collection::from_options(self.items.iter().enumerate().map(|(i, item)| f(item, i)))
    }

    /// New collection of the members `f` keeps.
    pub fn sift(&self, mut f: impl FnMut(&Item, usize) -> bool) -> Collection {
        self.items
            .iter()
            .enumerate()
            .filter(|(i, item)| f(item, *i))
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Minify every member concurrently. The first failure is returned.
    pub async fn minify(&self, options: &MinifyOptions) -> Result<Vec<Mapped<String>>> {
        self.minify_all(options, false).await
    }

    /// Minify the children of every member concurrently.
    pub async fn inner_minify(&self, options: &MinifyOptions) -> Result<Vec<Mapped<String>>> {
        self.minify_all(options, true).await
    }

    fn minify_all<'a>(
        &'a self,
        options: &'a MinifyOptions,
        inner: bool,
    ) -> LocalBoxFuture<'a, Result<Vec<Mapped<String>>>> {
        let pending = self.items.iter().map(move |item| match item {
            Item::Node(node) => async move {
                let out = if inner {
                    node.inner_minify(options).await?
                } else {
                    node.minify(options).await?
                };
                Ok::<_, Error>(Mapped::Value(out))
            }
            .boxed_local(),
            Item::Collection(nested) => async move {
                Ok::<_, Error>(Mapped::Nested(nested.minify_all(options, inner).await?))
            }
            .boxed_local(),
            Item::Absent => future::ready(Ok(Mapped::Absent)).boxed_local(),
        });
        future::try_join_all(pending).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><body>
<div id="a"><p>hi</p><p>bye</p></div>
<div id="b"><span>x</span></div>
<div id="c"></div>
</body></html>"#;

    fn divs() -> Collection {
        Node::parse(PAGE).unwrap().select("div", None).unwrap()
    }

    #[test]
    fn pick_supports_negative_indices() {
        let divs = divs();
        let last = divs.pick(-1).and_then(Item::as_node).unwrap();
        assert_eq!(last.attr("id"), Some("c"));
        let first = divs.pick(0).and_then(Item::as_node).unwrap();
        assert_eq!(first.attr("id"), Some("a"));
        assert!(divs.pick(3).is_none());
        assert!(divs.pick(-4).is_none());
    }

    #[test]
    fn value_getters_broadcast_by_position() {
        let divs = divs();
        let texts = divs.text();
        for (i, result) in texts.iter().enumerate() {
            let node = divs.pick(i as isize).and_then(Item::as_node).unwrap();
            assert_eq!(result, &Mapped::Value(node.text()));
        }
        assert_eq!(Mapped::values(divs.name()), vec!["div", "div", "div"]);
    }

    #[test]
    fn navigation_keeps_length_with_absent_members() {
        let divs = divs();
        let first = divs.first_child();
        assert_eq!(first.len(), divs.len());
        assert_eq!(
            first.name(),
            vec![
                Mapped::Value("p".to_string()),
                Mapped::Value("span".to_string()),
                Mapped::Absent,
            ]
        );
        assert!(first.pick(2).unwrap().is_absent());
    }

    #[test]
    fn children_nest_collections() {
        let children = divs().children();
        let nested = children.pick(0).and_then(Item::as_collection).unwrap();
        assert_eq!(nested.len(), 2);
        assert!(children.pick(2).unwrap().is_absent());
        assert_eq!(Mapped::values(children.text()), vec!["hi", "bye", "x"]);
    }

    #[test]
    fn select_broadcasts_and_nests() {
        let found = divs().select("p, span", None).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found.pick(0).and_then(Item::as_collection).unwrap().len(), 2);
        assert!(found.pick(2).and_then(Item::as_collection).unwrap().is_empty());
    }

    #[test]
    fn select_propagates_invalid_query() {
        assert!(divs().select("::::", None).unwrap_err().is_invalid_argument());
        assert!(divs().select_one("::::", 0).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn nth_child_validates_position_up_front() {
        assert!(Collection::default().nth_child(0).unwrap_err().is_invalid_argument());
        let second = divs().nth_child(2).unwrap();
        assert_eq!(
            second.text(),
            vec![Mapped::Value("bye".to_string()), Mapped::Absent, Mapped::Absent]
        );
    }

    #[test]
    fn nested_members_receive_calls_recursively() {
        let divs = divs();
        let mixed = Collection::new(vec![
            Item::Collection(divs.clone()),
            Item::Absent,
            divs.pick(1).cloned().unwrap(),
        ]);
        let names = mixed.attr("id");
        assert_eq!(
            names,
            vec![
                Mapped::Nested(vec![
                    Mapped::Value(Some("a".to_string())),
                    Mapped::Value(Some("b".to_string())),
                    Mapped::Value(Some("c".to_string())),
                ]),
                Mapped::Absent,
                Mapped::Value(Some("b".to_string())),
            ]
        );
    }

    #[test]
    fn from_options_drops_none() {
        let divs = divs();
        let built = Collection::from_options(vec![
            divs.pick(0).cloned(),
            None,
            divs.pick(2).cloned(),
        ]);
        assert_eq!(built.len(), 2);
    }

    #[test]
    fn each_visits_in_order_and_chains() {
        let divs = divs();
        let mut seen = Vec::new();
        let same = divs.each(|item, i| {
            seen.push((i, item.as_node().unwrap().attr("id").unwrap().to_string()));
        });
        assert_eq!(same.len(), 3);
        assert_eq!(
            seen,
            vec![(0, "a".to_string()), (1, "b".to_string()), (2, "c".to_string())]
        );

        let mut count = 0;
        divs.for_each(|_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn map_and_sift_build_new_collections() {
        let divs = divs();
        let firsts = divs.map(|item, _| item.as_node().and_then(Node::first_child).map(Item::Node));
        assert_eq!(Mapped::values(firsts.name()), vec!["p", "span"]);

        let odd = divs.sift(|_, i| i % 2 == 1);
        assert_eq!(odd.len(), 1);
        assert_eq!(
            odd.pick(0).and_then(Item::as_node).unwrap().attr("id"),
            Some("b")
        );
    }

    #[tokio::test]
    async fn minify_runs_every_member() {
        let divs = divs();
        let mixed = Collection::new(vec![Item::Collection(divs.clone()), Item::Absent]);
        let out = mixed.minify(&MinifyOptions::default()).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], Mapped::Absent);
        let Mapped::Nested(nested) = &out[0] else {
            panic!("expected nested results, got {out:?}");
        };
        assert_eq!(nested.len(), 3);
        assert!(nested[0].value().unwrap().contains("<p>hi</p>"));

        let inner = divs.inner_minify(&MinifyOptions::default()).await.unwrap();
        assert_eq!(inner[2], Mapped::Value(String::new()));
    }

    #[tokio::test]
    async fn minify_reports_first_failure() {
        let options = MinifyOptions::default().collapse_whitespace(false);
        let err = divs().minify(&options).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
