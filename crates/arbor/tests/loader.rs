// ABOUTME: Integration tests for the arbor Loader against real files and a mock HTTP server.
// ABOUTME: Covers remote loading, path discovery, selection, navigation, and minification end to end.

use arbor::{Item, Loader, Mapped, MinifyOptions, Node, NodeKind};
use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn node(item: Item) -> Node {
    match item {
        Item::Node(node) => node,
        other => panic!("expected a node, got {other:?}"),
    }
}

#[tokio::test]
async fn loads_remote_document() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/page");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html><head><title>Remote</title></head><body><p>Hello</p></body></html>");
    });

    let loader = Loader::builder().build();
    let doc = node(loader.load(server.url("/page")).await.unwrap());

    mock.assert();
    assert_eq!(doc.kind(), NodeKind::Document);
    assert_eq!(doc.select_one("title", 0).unwrap().text(), "Remote");
    assert_eq!(doc.select_one("p", 0).unwrap().text(), "Hello");
}

#[tokio::test]
async fn sends_configured_headers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/private")
            .header("authorization", "Bearer token")
            .header("user-agent", "arbor-tests");
        then.status(200).body("<p>ok</p>");
    });

    let loader = Loader::builder()
        .header("authorization", "Bearer token")
        .user_agent("arbor-tests")
        .build();
    let doc = node(loader.load(server.url("/private")).await.unwrap());

    mock.assert();
    assert_eq!(doc.select_one("p", 0).unwrap().text(), "ok");
}

#[tokio::test]
async fn error_status_is_a_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gone");
        then.status(404).body("not found");
    });

    let err = Loader::builder()
        .build()
        .load(server.url("/gone"))
        .await
        .unwrap_err();
    assert!(err.is_fetch());
    assert!(err.to_string().contains("/gone"), "got {err}");
}

#[tokio::test]
async fn directory_colliding_with_markup_file_loads_the_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("guide")).unwrap();
    fs::write(dir.path().join("guide").join("index.html"), "<h1>Folder</h1>").unwrap();
    fs::write(dir.path().join("guide.v2.html"), "<h1>File</h1>").unwrap();

    let loader = Loader::builder().base_dir(dir.path()).build();
    let doc = node(loader.load("guide").await.unwrap());
    assert_eq!(doc.select_one("h1", 0).unwrap().text(), "File");
}

#[tokio::test]
async fn nested_discovery_and_missing_documents() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("blog")).unwrap();
    fs::write(dir.path().join("blog").join("Index.HTML"), "<h1>Blog</h1>").unwrap();
    fs::write(dir.path().join("blog").join("post.html"), "<h1>Post</h1>").unwrap();

    let loader = Loader::builder().base_dir(dir.path()).build();

    let blog = node(loader.load("./blog").await.unwrap());
    assert_eq!(blog.select_one("h1", 0).unwrap().text(), "Blog");

    let post = node(loader.load("blog/post").await.unwrap());
    assert_eq!(post.select_one("h1", 0).unwrap().text(), "Post");

    let missing = node(loader.load(dir.path().join("nowhere/page.html")).await.unwrap());
    assert!(missing.is_empty());

    let as_text = node(loader.load("./nowhere/page.html").await.unwrap());
    assert_eq!(as_text.text(), "./nowhere/page.html");
}

#[tokio::test]
async fn select_and_navigate_end_to_end() {
    let doc = node(arbor::load(r#"<div id="a"><p>hi</p><p>bye</p></div>"#).await.unwrap());

    let paragraphs = doc.select("p", None).unwrap();
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(Mapped::values(paragraphs.text()), vec!["hi", "bye"]);
    assert_eq!(doc.select("p", Some(1)).unwrap().len(), 1);

    let first = doc.select_one("p", 0).unwrap();
    assert_eq!(first.text(), "hi");
    assert_eq!(first.parent().unwrap().attr("id"), Some("a"));
    assert_eq!(first.next_sibling().unwrap().text(), "bye");
    assert_eq!(first.root(), doc);

    let div = doc.select_one("#a", 0).unwrap();
    assert!(div.nth_child(0).unwrap_err().is_invalid_argument());
    assert!(div.nth_child(-1).unwrap_err().is_invalid_argument());
    assert!(div.nth_child(3).unwrap().is_none());

    let parents = paragraphs.parent();
    assert_eq!(
        Mapped::values(parents.attr("id")),
        vec![Some("a".to_string()), Some("a".to_string())]
    );
}

#[tokio::test]
async fn minify_loaded_markup() {
    let doc = arbor::parse("<div>\n  <p>hi</p>\n  <!-- note -->\n</div>").unwrap();
    let div = doc.select_one("div", 0).unwrap();

    let kept = div.minify(&MinifyOptions::default()).await.unwrap();
    assert!(kept.contains("<p>hi</p>"), "got {kept}");
    assert!(kept.contains("note"), "got {kept}");

    let options = MinifyOptions::from_json(r#"{"removeComments": true}"#).unwrap();
    let stripped = div.minify(&options).await.unwrap();
    assert!(!stripped.contains("note"), "got {stripped}");

    let keep_spaces = MinifyOptions::from_json(r#"{"collapseWhitespace": false}"#).unwrap();
    let err = div.minify(&keep_spaces).await.unwrap_err();
    assert!(err.is_invalid_argument(), "got {err}");
}
