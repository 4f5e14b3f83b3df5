//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Admission policy and the deduplicated frontier
//! - HTTP fetching and HTML parsing
//! - Product extraction, link discovery and sitemap seeding
//! - The worker pool that drives a crawl to completion

mod coordinator;
mod discovery;
mod extractor;
mod fetcher;
mod frontier;
mod parser;
mod policy;
mod sitemap;

pub use coordinator::Crawler;
pub use discovery::discover_links;
pub use extractor::{CrawlRecord, Extractor};
pub use fetcher::{build_http_client, FetchedPage, Fetcher, HttpFetcher};
pub use frontier::{Frontier, FrontierStats};
pub use parser::{Document, HtmlDocument};
pub use policy::{PolicyGate, Rejection};
pub use sitemap::{parse_sitemap, sitemap_seeds, SitemapEntries};

use crate::config::validation::compile_pattern;
use crate::config::Config;
use crate::output::{CrawlReport, RecordWriter};
use crate::robots::fetch_robots;
use crate::url::parse_seed;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Fetch the site's robots.txt (or its fallback copy)
/// 3. Read the product sitemaps, when a sitemap URL is configured
/// 4. Create the output file
/// 5. Run the worker pool until the frontier drains
///
/// Ctrl-C closes the frontier; records already extracted are still written.
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (or was cancelled)
/// * `Err(VitrineError)` - Setup failed, or the output could not be written
pub async fn crawl(config: &Config) -> Result<CrawlReport> {
    let seed = parse_seed(&config.site.seed_url)?;
    let client = build_http_client(&config.user_agent, &config.crawler)?;

    let fallback = config.site.robots_fallback_path.as_deref().map(Path::new);
    let robots = fetch_robots(&client, &seed, fallback).await?;

    let seeds = match &config.site.sitemap_url {
        Some(sitemap) => {
            let root = parse_seed(sitemap)?;
            let pattern =
                compile_pattern("product_sitemap_pattern", &config.site.product_sitemap_pattern)?;
            sitemap_seeds(&client, &root, &pattern).await?
        }
        None => Vec::new(),
    };

    let writer = RecordWriter::create(Path::new(&config.output.csv_path))?;
    let crawler = Crawler::new(config, robots, HttpFetcher::new(client))?.with_seeds(seeds);

    let _interrupt = InterruptGuard::spawn(crawler.frontier());
    crawler.run(writer).await
}

/// Closes the frontier on Ctrl-C for as long as the guard is alive
struct InterruptGuard(JoinHandle<()>);

impl InterruptGuard {
    fn spawn(frontier: Arc<Frontier>) -> Self {
        Self(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping after in-flight pages");
                frontier.close();
            }
        }))
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
