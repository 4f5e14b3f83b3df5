//! Crawler coordinator - the worker pool
//!
//! This module contains the crawl driver and the worker loop:
//! - Seeding the frontier with the entry point
//! - Running N symmetric workers that fetch, extract and expand
//! - Waiting for quiescence, then shutting the workers and the sink down

use crate::config::{Config, LinkBase};
use crate::crawler::discovery::discover_links;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::HtmlDocument;
use crate::crawler::policy::PolicyGate;
use crate::output::{spawn_sink, CrawlReport, RecordSender, RecordWriter};
use crate::robots::ParsedRobots;
use crate::url::parse_seed;
use crate::{ConfigError, Result};
use futures::FutureExt;
use std::any::Any;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Main crawler structure
pub struct Crawler<F: Fetcher> {
    frontier: Arc<Frontier>,
    fetcher: Arc<F>,
    extractor: Arc<Extractor>,
    seed: Url,
    extra_seeds: Vec<Url>,
    link_base: LinkBase,
    follow_links: bool,
    workers: usize,
}

/// Shared, read-mostly state handed to every worker
struct WorkerContext<F: Fetcher> {
    frontier: Arc<Frontier>,
    fetcher: Arc<F>,
    extractor: Arc<Extractor>,
    site_base: Url,
    link_base: LinkBase,
    follow_links: bool,
    records: RecordSender,
    fetch_errors: AtomicU64,
    non_success: AtomicU64,
}

/// Marks the dequeued URL done when dropped, on every exit path
struct DoneGuard<'a>(&'a Frontier);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_done();
    }
}

impl<F: Fetcher + 'static> Crawler<F> {
    /// Creates a crawler for the configured site
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `robots` - The robots.txt snapshot for this run
    /// * `fetcher` - How pages are fetched
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(VitrineError)` - Invalid seed URL or patterns
    pub fn new(config: &Config, robots: ParsedRobots, fetcher: F) -> Result<Self> {
        let seed = parse_seed(&config.site.seed_url)?;
        let gate = PolicyGate::from_config(&config.site, robots)?;
        let extractor = Extractor::from_config(&config.extraction)?;

        Ok(Self {
            frontier: Arc::new(Frontier::new(gate)),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            seed,
            extra_seeds: Vec::new(),
            link_base: config.crawler.link_base,
            follow_links: config.crawler.follow_links,
            workers: config.crawler.workers.max(1),
        })
    }

    /// Adds entry points admitted right after the seed (e.g. from sitemaps)
    ///
    /// Unlike the seed, these may be refused by the policy; they are then
    /// skipped.
    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = Url>) -> Self {
        self.extra_seeds.extend(seeds);
        self
    }

    /// Returns the frontier, e.g. to `close` it from a signal handler
    pub fn frontier(&self) -> Arc<Frontier> {
        Arc::clone(&self.frontier)
    }

    /// Runs the crawl to quiescence (or until the frontier is closed)
    ///
    /// 1. Admit the seed URL, then any extra seeds
    /// 2. Start the sink and N workers
    /// 3. Wait for `join`
    /// 4. Close the frontier so idle workers exit, then drain the sink
    pub async fn run<W: Write + Send + 'static>(
        self,
        writer: RecordWriter<W>,
    ) -> Result<CrawlReport> {
        let started = Instant::now();

        if !self.frontier.try_admit(&self.seed) {
            return Err(ConfigError::Validation(format!(
                "Seed URL {} is refused by the crawl policy",
                self.seed
            ))
            .into());
        }

        if !self.extra_seeds.is_empty() {
            let admitted = self
                .extra_seeds
                .iter()
                .filter(|url| self.frontier.try_admit(url))
                .count();
            tracing::info!(
                "Admitted {} of {} extra seed URLs",
                admitted,
                self.extra_seeds.len()
            );
        }

        tracing::info!(
            "Crawler has been started: {} workers, seed {}",
            self.workers,
            self.seed
        );

        let (records, sink) = spawn_sink(writer);
        let ctx = Arc::new(WorkerContext {
            frontier: Arc::clone(&self.frontier),
            fetcher: self.fetcher,
            extractor: self.extractor,
            site_base: self.seed,
            link_base: self.link_base,
            follow_links: self.follow_links,
            records,
            fetch_errors: AtomicU64::new(0),
            non_success: AtomicU64::new(0),
        });

        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(run_worker(id, Arc::clone(&ctx)));
        }

        self.frontier.join().await;
        let cancelled = self.frontier.is_closed();
        self.frontier.close();

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let fetch_errors = ctx.fetch_errors.load(Ordering::Relaxed);
        let non_success = ctx.non_success.load(Ordering::Relaxed);
        // Last sender goes with the context; the sink then drains and stops
        drop(ctx);
        let writer = sink.wait().await?;

        let stats = self.frontier.stats();
        let report = CrawlReport {
            discovered: stats.discovered,
            visited: stats.visited,
            fetch_errors,
            non_success,
            records: writer.written(),
            cancelled,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Crawler finished: {} discovered, {} visited, {} products in {:?}",
            report.discovered,
            report.visited,
            report.records,
            report.elapsed
        );

        Ok(report)
    }
}

/// One worker: dequeue, process, mark done, until the frontier closes
async fn run_worker<F: Fetcher>(id: usize, ctx: Arc<WorkerContext<F>>) {
    loop {
        let stats = ctx.frontier.stats();
        tracing::info!(
            "links: [{}] pending, [{}] discovered, [{}] visited",
            stats.pending,
            stats.discovered,
            stats.visited
        );

        let Some(url) = ctx.frontier.dequeue().await else {
            break;
        };
        let _done = DoneGuard(&ctx.frontier);
        tracing::info!("Worker [{}] took [{}] from queue", id, url);

        match AssertUnwindSafe(process_url(&ctx, &url)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                ctx.fetch_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Error processing {}: {}", url, e);
            }
            Err(panic) => {
                ctx.fetch_errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    "Worker [{}] panicked on {}: {}",
                    id,
                    url,
                    panic_message(panic.as_ref())
                );
            }
        }
    }

    tracing::debug!("Worker [{}] stopped", id);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Fetches one URL, emits its record if it is a product page, and admits
/// its links
///
/// Every link is admitted before this returns, which is before the
/// caller's `DoneGuard` marks the URL done.
async fn process_url<F: Fetcher>(ctx: &WorkerContext<F>, url: &Url) -> Result<()> {
    let page = ctx.fetcher.fetch(url).await?;
    ctx.frontier.record_visit(url);

    if !page.is_success() {
        ctx.non_success.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("Response not ok for [{}]: HTTP {}", url, page.status_code);
        return Ok(());
    }

    let base = match ctx.link_base {
        LinkBase::Site => &ctx.site_base,
        LinkBase::Page => &page.final_url,
    };

    // The parsed document is not Send; it must be gone before any await
    let (record, links) = {
        let document = HtmlDocument::parse(&page.body);

        let record = if ctx
            .extractor
            .is_product_page(page.final_url.as_str(), url.as_str())
        {
            tracing::info!("Grabbing product details from [{}]", url);
            let record = ctx.extractor.extract(&document, url);
            if record.is_none() {
                tracing::warn!("No title or product name on [{}], skipping", url);
            }
            record
        } else {
            None
        };

        let links: Vec<Url> = if ctx.follow_links {
            tracing::debug!("Discovering links for [{}]", url);
            discover_links(base, &document).collect()
        } else {
            Vec::new()
        };
        (record, links)
    };

    if let Some(record) = record {
        if !ctx.records.send(record) {
            tracing::error!("Output writer has stopped, cancelling crawl");
            ctx.frontier.close();
        }
    }

    let mut admitted = 0;
    for link in &links {
        if ctx.frontier.try_admit(link) {
            tracing::debug!("Adding new url to the queue [{}]", link);
            admitted += 1;
        }
    }
    tracing::debug!(
        "[{}]: {} links found, {} new",
        url,
        links.len(),
        admitted
    );

    Ok(())
}
