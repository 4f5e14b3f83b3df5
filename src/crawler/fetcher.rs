//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `Fetcher` capability consumed by the worker pool
//! - Building HTTP clients with proper user agent strings
//! - GET requests that follow redirects and report the final URL

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::VitrineError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// A fetched response, whatever its status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Response body (empty for non-success responses)
    pub body: String,
}

impl FetchedPage {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Fetches pages for the worker pool
///
/// `Err` means the transport failed (DNS, connect, timeout, body read);
/// HTTP error statuses come back as `Ok` with their status code.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, VitrineError>;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops) so that the final URL can be
/// checked for the "not found" marker.
///
/// # Example
///
/// ```no_run
/// use vitrine::config::{CrawlerConfig, UserAgentConfig};
/// use vitrine::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(crawler.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetcher` backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, VitrineError> {
        let http_error = |source| VitrineError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        let final_url = response.url().clone();

        // Non-success bodies are never parsed, so don't download them
        let body = if status.is_success() {
            response.text().await.map_err(http_error)?
        } else {
            String::new()
        };

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
        })
    }
}
