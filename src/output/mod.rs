//! Output module for crawl results
//!
//! This module handles:
//! - Serializing product records to CSV
//! - Funnelling records from every worker through a single writer
//! - Reporting crawl statistics

mod csv_writer;
mod sink;
pub mod stats;

pub use csv_writer::{RecordWriter, CSV_HEADER};
pub use sink::{spawn_sink, RecordSender, SinkTask};
pub use stats::{print_report, CrawlReport};
