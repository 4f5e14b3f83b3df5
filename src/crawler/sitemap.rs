//! Sitemap seeding
//!
//! Reads the site's root sitemap, keeps the child sitemaps that list
//! product pages and returns every page URL they contain. The URLs go
//! through the frontier like any discovered link, so the policy still
//! applies to them.

use crate::{Result, VitrineError};
use regex::Regex;
use reqwest::Client;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;
use url::Url;

/// Locations listed in one sitemap document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SitemapEntries {
    /// `<url><loc>` entries
    pub pages: Vec<Url>,
    /// `<sitemap><loc>` entries of a sitemap index
    pub sitemaps: Vec<Url>,
}

/// Parses a sitemap or sitemap index
///
/// Entries whose location is not an absolute URL are skipped.
pub fn parse_sitemap(xml: &[u8]) -> SitemapEntries {
    let mut entries = SitemapEntries::default();

    for entity in SiteMapReader::new(Cursor::new(xml)) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    entries.pages.push(url);
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    entries.sitemaps.push(url);
                }
            }
            SiteMapEntity::Err(e) => {
                tracing::warn!("Malformed sitemap entry: {:?}", e);
            }
        }
    }

    entries
}

async fn fetch_sitemap(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let http_error = |source| VitrineError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url.clone()).send().await.map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(VitrineError::Sitemap(format!(
            "{} answered HTTP {}",
            url,
            status.as_u16()
        )));
    }

    Ok(response.bytes().await.map_err(http_error)?.to_vec())
}

/// Collects product page URLs from the sitemaps under `root`
///
/// If `root` is a sitemap index, only child sitemaps whose URL matches
/// `product_sitemaps` are read; a child that cannot be fetched is skipped.
/// If `root` is a plain sitemap, its pages are returned as they are.
///
/// # Returns
///
/// * `Ok(Vec<Url>)` - Page URLs, in sitemap order
/// * `Err(VitrineError)` - The root sitemap could not be fetched
pub async fn sitemap_seeds(
    client: &Client,
    root: &Url,
    product_sitemaps: &Regex,
) -> Result<Vec<Url>> {
    tracing::info!("Extracting product sitemaps from {}", root);
    let index = parse_sitemap(&fetch_sitemap(client, root).await?);

    if index.sitemaps.is_empty() {
        tracing::info!("{} lists {} pages", root, index.pages.len());
        return Ok(index.pages);
    }

    let mut pages = Vec::new();
    for child in index
        .sitemaps
        .iter()
        .filter(|url| product_sitemaps.is_match(url.as_str()))
    {
        match fetch_sitemap(client, child).await {
            Ok(xml) => {
                let entries = parse_sitemap(&xml);
                tracing::info!("Extracting product urls from [{}]: {}", child, entries.pages.len());
                pages.extend(entries.pages);
            }
            Err(e) => tracing::warn!("Skipping sitemap {}: {}", child, e),
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn index(children: &[String]) -> String {
        let entries: String = children
            .iter()
            .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
            entries
        )
    }

    fn urlset(pages: &[String]) -> String {
        let entries: String = pages
            .iter()
            .map(|loc| format!("<url><loc>{}</loc></url>", loc))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
            entries
        )
    }

    fn pattern() -> Regex {
        Regex::new(r"sitemap-produtos.*\.xml").unwrap()
    }

    #[test]
    fn test_parse_urlset() {
        let xml = urlset(&[
            "http://test.com/a/p".to_string(),
            "http://test.com/b/p".to_string(),
        ]);

        let entries = parse_sitemap(xml.as_bytes());
        assert_eq!(
            entries.pages,
            vec![
                Url::parse("http://test.com/a/p").unwrap(),
                Url::parse("http://test.com/b/p").unwrap(),
            ]
        );
        assert!(entries.sitemaps.is_empty());
    }

    #[test]
    fn test_parse_index() {
        let xml = index(&["http://test.com/sitemap-produtos-0.xml".to_string()]);

        let entries = parse_sitemap(xml.as_bytes());
        assert!(entries.pages.is_empty());
        assert_eq!(entries.sitemaps.len(), 1);
    }

    #[tokio::test]
    async fn test_only_product_sitemaps_are_read() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index(&[
                format!("{}/sitemap-produtos-0.xml", base),
                format!("{}/sitemap-produtos-1.xml", base),
                format!("{}/sitemap-categorias.xml", base),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap-produtos-0.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&[
                format!("{}/a/p", base),
                format!("{}/b/p", base),
            ])))
            .mount(&server)
            .await;
        // A missing child is skipped
        Mock::given(method("GET"))
            .and(path("/sitemap-produtos-1.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap-categorias.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let root = Url::parse(&format!("{}/sitemap.xml", base)).unwrap();
        let pages = sitemap_seeds(&Client::new(), &root, &pattern()).await.unwrap();

        assert_eq!(
            pages,
            vec![
                Url::parse(&format!("{}/a/p", base)).unwrap(),
                Url::parse(&format!("{}/b/p", base)).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_plain_sitemap_root() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(urlset(&[format!("{}/a/p", base)])),
            )
            .mount(&server)
            .await;

        let root = Url::parse(&format!("{}/sitemap.xml", base)).unwrap();
        let pages = sitemap_seeds(&Client::new(), &root, &pattern()).await.unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let server = MockServer::start().await;
        let root = Url::parse(&format!("{}/sitemap.xml", server.uri())).unwrap();

        let result = sitemap_seeds(&Client::new(), &root, &pattern()).await;
        assert!(matches!(result, Err(VitrineError::Sitemap(_))));
    }
}
