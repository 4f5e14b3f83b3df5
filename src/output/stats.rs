//! End-of-run statistics
//!
//! This module provides the crawl report returned by the worker pool and
//! a printer for it.

use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlReport {
    /// URLs admitted to the frontier (the seed included)
    pub discovered: usize,

    /// URLs fetched, whatever the response status
    pub visited: usize,

    /// Fetches that failed at the transport level
    pub fetch_errors: u64,

    /// Responses with a non-2xx status
    pub non_success: u64,

    /// Records written to the output file
    pub records: u64,

    /// The crawl was stopped before the frontier drained
    pub cancelled: bool,

    pub elapsed: Duration,
}

impl CrawlReport {
    /// Pages per second over the whole run
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.visited as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    if report.cancelled {
        println!("Status: cancelled (frontier not drained)");
    } else {
        println!("Status: complete");
    }
    println!(
        "Elapsed: {:.1}s ({:.2} pages/sec)",
        report.elapsed.as_secs_f64(),
        report.rate()
    );
    println!();

    println!("Links:");
    println!("  Discovered: {}", report.discovered);
    println!("  Visited: {}", report.visited);
    println!("  Fetch errors: {}", report.fetch_errors);
    println!("  Non-success responses: {}", report.non_success);
    println!();

    println!("Products written: {}", report.records);
}
