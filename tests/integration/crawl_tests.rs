//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! link discovery and sitemap construction end-to-end.

use site_recce::config::CrawlerConfig;
use site_recce::crawler::{crawl, LinkCrawler};
use site_recce::sitemap::build_tree;
use site_recce::same_origin;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration bounded to `max_pages`
fn create_test_config(max_pages: usize) -> CrawlerConfig {
    CrawlerConfig {
        max_pages,
        request_timeout_secs: 2,
        user_agent: "TestBot/1.0".to_string(),
    }
}

/// Mounts an HTML page at `route`
async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

/// Mocks HEAD requests for every page as HTML
async fn mount_html_heads(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_nested_paths() {
    // Start a mock server
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_heads(&mock_server).await;

    // Index links to /a, /a links to /a/b, /a/b links back home
    mount_html(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/a">A</a></body></html>"#
            .to_string(),
    )
    .await;
    mount_html(
        &mock_server,
        "/a",
        r#"<html><body><a href="a/b">relative to /a</a><a href="/a/b">B</a></body></html>"#
            .to_string(),
    )
    .await;
    mount_html(
        &mock_server,
        "/a/b",
        format!(r#"<html><body><a href="{}/">Home</a></body></html>"#, base_url),
    )
    .await;

    let result = crawl(&create_test_config(10), &format!("{}/", base_url))
        .await
        .expect("Crawl failed");

    assert_eq!(
        result.addresses(),
        &[
            format!("{}/", base_url),
            format!("{}/a", base_url),
            format!("{}/a/b", base_url),
        ]
    );

    // Tree: root -> a -> b
    let tree = build_tree(result.addresses());
    assert_eq!(tree.children().len(), 1);
    let a = tree.child("a").expect("missing node a");
    assert_eq!(a.full_url(), Some(format!("{}/a", base_url).as_str()));
    let b = a.child("b").expect("missing node b");
    assert_eq!(b.full_url(), Some(format!("{}/a/b", base_url).as_str()));
    assert!(b.is_leaf());
}

#[tokio::test]
async fn test_seed_fetch_error_yields_seed_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", mock_server.uri());
    let result = crawl(&create_test_config(10), &seed).await.expect("Crawl failed");

    assert_eq!(result.addresses(), &[seed]);
}

#[tokio::test]
async fn test_bound_and_origin_hold_for_large_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_heads(&mock_server).await;

    // Every page links to 5 more pages and to an external host
    for i in 0..30 {
        let links: String = (1..=5)
            .map(|j| format!(r#"<a href="/p{}">P</a>"#, i * 5 + j))
            .chain(std::iter::once(
                r#"<a href="https://external.example.org/">Out</a>"#.to_string(),
            ))
            .collect();
        let route = if i == 0 { "/".to_string() } else { format!("/p{}", i) };
        mount_html(&mock_server, &route, links).await;
    }

    let crawler = LinkCrawler::new(&create_test_config(7)).expect("Failed to build crawler");
    let seed = format!("{}/", base_url);
    let result = crawler.crawl(&seed).await.expect("Crawl failed");

    assert_eq!(result.len(), 7);
    assert_eq!(result.addresses()[0], seed);

    let seed_url = url::Url::parse(&seed).unwrap();
    for address in result.addresses() {
        let address = url::Url::parse(address).unwrap();
        assert!(same_origin(&seed_url, &address), "left origin: {}", address);
    }

    // No address appears twice
    let mut unique = result.addresses().to_vec();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), result.len());
}

#[tokio::test]
async fn test_non_html_pages_are_dead_ends() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(&mock_server)
        .await;
    // Would add /hidden if it were ever parsed
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"<a href="/hidden">x</a>"#, "application/pdf"),
        )
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        "/",
        r#"<a href="/report.pdf">Report</a>"#.to_string(),
    )
    .await;

    let base_url = mock_server.uri();
    let result = crawl(&create_test_config(10), &format!("{}/", base_url))
        .await
        .expect("Crawl failed");

    assert_eq!(
        result.addresses(),
        &[format!("{}/", base_url), format!("{}/report.pdf", base_url)]
    );
}

#[tokio::test]
async fn test_tracking_params_and_fragments_collapse() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/a?utm_source=mail">A</a><a href="/a#section">A</a><a href="/a/">A</a>"#
            .to_string(),
    )
    .await;
    mount_html(&mock_server, "/a", "<p>leaf</p>".to_string()).await;

    let result = crawl(&create_test_config(10), &format!("{}/", base_url))
        .await
        .expect("Crawl failed");

    assert_eq!(
        result.addresses(),
        &[format!("{}/", base_url), format!("{}/a", base_url)]
    );
}

#[tokio::test]
async fn test_invalid_seed_is_an_error() {
    assert!(crawl(&create_test_config(10), "mailto:someone@example.com")
        .await
        .is_err());
}
