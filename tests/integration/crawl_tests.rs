//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::path::Path;
use vitrine::config::Config;
use vitrine::crawler::crawl;
use vitrine::VitrineError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server
fn create_test_config(base_url: &str, csv_path: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.workers = 4;
    config.crawler.request_timeout_secs = 5;
    config.site.domain = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();
    config.site.seed_url = base_url.to_string();
    config.output.csv_path = csv_path.display().to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn product_page(title: &str, name: &str) -> ResponseTemplate {
    html(&format!(
        r#"<html><head><title>{}</title></head><body>
        <h1 class="productName">{}</h1>
        <a href="/">Home</a>
        </body></html>"#,
        title, name
    ))
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_writes_product_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("data").join("products.csv");

    mount_get(
        &mock_server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        1,
    )
    .await;

    mount_get(
        &mock_server,
        "/",
        html(
            r#"<html><head><title>Home</title></head><body>
            <a href="/perfume-x/p">Perfume X</a>
            <a href="/cat">Category</a>
            <a href="/private/p">Private</a>
            <a href="/checkout/cart/add?sku=1">Add to cart</a>
            <a href="/gone/p">Gone</a>
            <a href="http://elsewhere.example/p">Elsewhere</a>
            </body></html>"#,
        ),
        1,
    )
    .await;

    mount_get(
        &mock_server,
        "/cat",
        html(r#"<a href="/creme/p">Creme</a><a href="/perfume-x/p">Perfume X</a>"#),
        1,
    )
    .await;

    mount_get(
        &mock_server,
        "/perfume-x/p",
        product_page("Perfume X - Shop", "Perfume X"),
        1,
    )
    .await;
    mount_get(&mock_server, "/creme/p", product_page("Creme - Shop", "Creme"), 1).await;

    // Unknown product: the store redirects to its "not found" search page
    mount_get(
        &mock_server,
        "/gone/p",
        ResponseTemplate::new(302)
            .insert_header("location", "/Sistema/buscavazia?ProductLinkNotFound=gone"),
        1,
    )
    .await;
    mount_get(
        &mock_server,
        "/Sistema/buscavazia",
        product_page("Nothing here", "Suggested product"),
        1,
    )
    .await;

    mount_get(&mock_server, "/private/p", product_page("Private", "Private"), 0).await;
    mount_get(&mock_server, "/checkout/cart/add", html("added"), 0).await;

    let config = create_test_config(&base_url, &csv_path);
    let report = crawl(&config).await.expect("Crawl failed");

    // /, /cat, /perfume-x/p, /creme/p, /gone/p
    assert_eq!(report.discovered, 5);
    assert_eq!(report.visited, report.discovered);
    assert_eq!(report.records, 2);
    assert_eq!(report.fetch_errors, 0);
    assert!(!report.cancelled);

    let content = std::fs::read_to_string(&csv_path).expect("Output not written");
    let mut lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.remove(0), "product_name,page_title,page_url");
    lines.sort();
    assert_eq!(
        lines,
        vec![
            format!("\"Creme\",\"Creme - Shop\",\"{}/creme/p\"", base_url),
            format!("\"Perfume X\",\"Perfume X - Shop\",\"{}/perfume-x/p\"", base_url),
        ]
    );
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("out.csv");

    mount_get(
        &mock_server,
        "/robots.txt",
        ResponseTemplate::new(404),
        1,
    )
    .await;
    mount_get(&mock_server, "/", html(r#"<a href="/private/p">P</a>"#), 1).await;
    mount_get(&mock_server, "/private/p", product_page("P", "P"), 1).await;

    let config = create_test_config(&base_url, &csv_path);
    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.visited, 2);
    assert_eq!(report.records, 1);
}

#[tokio::test]
async fn test_robots_server_error_without_fallback_aborts() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("out.csv");

    mount_get(&mock_server, "/robots.txt", ResponseTemplate::new(503), 1).await;
    mount_get(&mock_server, "/", html("<title>Home</title>"), 0).await;

    let config = create_test_config(&base_url, &csv_path);
    let result = crawl(&config).await;

    assert!(matches!(result, Err(VitrineError::Robots(_))));
    // Startup failed before the output was created
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_robots_server_error_uses_fallback_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("out.csv");
    let fallback = dir.path().join("robots.txt");
    std::fs::write(&fallback, "User-agent: *\nDisallow: /secret\n").unwrap();

    mount_get(&mock_server, "/robots.txt", ResponseTemplate::new(500), 1).await;
    mount_get(
        &mock_server,
        "/",
        html(r#"<a href="/secret/p">Secret</a><a href="/open/p">Open</a>"#),
        1,
    )
    .await;
    mount_get(&mock_server, "/open/p", product_page("Open - Shop", "Open"), 1).await;
    mount_get(&mock_server, "/secret/p", product_page("Secret", "Secret"), 0).await;

    let mut config = create_test_config(&base_url, &csv_path);
    config.site.robots_fallback_path = Some(fallback.display().to_string());
    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.discovered, 2);
    assert_eq!(report.records, 1);
}

#[tokio::test]
async fn test_server_errors_do_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("out.csv");

    mount_get(&mock_server, "/robots.txt", ResponseTemplate::new(404), 1).await;
    mount_get(
        &mock_server,
        "/",
        html(r#"<a href="/flaky/p">Flaky</a><a href="/ok/p">Ok</a>"#),
        1,
    )
    .await;
    mount_get(&mock_server, "/flaky/p", ResponseTemplate::new(500), 1).await;
    mount_get(&mock_server, "/ok/p", product_page("Ok - Shop", "Ok"), 1).await;

    let config = create_test_config(&base_url, &csv_path);
    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.visited, 3);
    assert_eq!(report.non_success, 1);
    assert_eq!(report.records, 1);
}

#[tokio::test]
async fn test_sitemap_seeded_crawl_without_link_following() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("out.csv");

    mount_get(&mock_server, "/robots.txt", ResponseTemplate::new(404), 1).await;
    mount_get(
        &mock_server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
<sitemap><loc>{0}/sitemap-produtos-0.xml</loc></sitemap>
<sitemap><loc>{0}/sitemap-categorias-0.xml</loc></sitemap>
</sitemapindex>"#,
            base_url
        )),
        1,
    )
    .await;
    mount_get(
        &mock_server,
        "/sitemap-produtos-0.xml",
        ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
<url><loc>{0}/perfume-x/p</loc></url>
<url><loc>{0}/old-product/p</loc></url>
</urlset>"#,
            base_url
        )),
        1,
    )
    .await;
    mount_get(&mock_server, "/sitemap-categorias-0.xml", html(""), 0).await;

    mount_get(&mock_server, "/", html(r#"<a href="/linked/p">Linked</a>"#), 1).await;
    mount_get(
        &mock_server,
        "/perfume-x/p",
        product_page("Perfume X - Shop", "Perfume X"),
        1,
    )
    .await;
    // Outdated sitemap entry
    mount_get(
        &mock_server,
        "/old-product/p",
        ResponseTemplate::new(302)
            .insert_header("location", "/Sistema/buscavazia?ProductLinkNotFound=old"),
        1,
    )
    .await;
    mount_get(&mock_server, "/Sistema/buscavazia", html("<title>Search</title>"), 1).await;
    mount_get(&mock_server, "/linked/p", product_page("Linked", "Linked"), 0).await;

    let mut config = create_test_config(&base_url, &csv_path);
    config.crawler.follow_links = false;
    config.site.sitemap_url = Some(format!("{}/sitemap.xml", base_url));
    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.discovered, 3);
    assert_eq!(report.records, 1);

    let content = std::fs::read_to_string(&csv_path).expect("Output not written");
    assert_eq!(
        content,
        format!(
            "product_name,page_title,page_url\n\"Perfume X\",\"Perfume X - Shop\",\"{}/perfume-x/p\"\n",
            base_url
        )
    );
}
