//! CSV serialization of crawl records
//!
//! Layout: a fixed header line, then one line per record with every value
//! double-quoted. Embedded quotes are doubled (RFC 4180).

use crate::crawler::CrawlRecord;
use crate::{Result, VitrineError};
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Header line written before any record
pub const CSV_HEADER: &str = "product_name,page_title,page_url\n";

/// Writes crawl records to any `Write` destination
pub struct RecordWriter<W: Write> {
    inner: Writer<W>,
    written: u64,
}

impl RecordWriter<File> {
    /// Creates the output file (and its parent directories) and writes the header
    ///
    /// # Returns
    ///
    /// * `Ok(RecordWriter)` - Ready to accept records
    /// * `Err(VitrineError::Io)` - The file could not be created
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        tracing::info!("Writing records to {}", path.display());
        Self::new(file)
    }
}

impl<W: Write> RecordWriter<W> {
    /// Writes the header to `out` and wraps it
    pub fn new(mut out: W) -> Result<Self> {
        out.write_all(CSV_HEADER.as_bytes())?;

        let inner = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);

        Ok(Self { inner, written: 0 })
    }

    /// Appends one record as `product_name,page_title,page_url`
    pub fn write_record(&mut self, record: &CrawlRecord) -> Result<()> {
        self.inner.write_record([
            record.product_name.as_str(),
            record.page_title.as_str(),
            record.page_url.as_str(),
        ])?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying destination
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| VitrineError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}
