//! Single-writer record sink
//!
//! Workers never touch the output file. They send records over a channel;
//! one blocking task owns the `RecordWriter` and appends them in arrival
//! order.

use crate::crawler::CrawlRecord;
use crate::output::csv_writer::RecordWriter;
use crate::{Result, VitrineError};
use std::io::Write;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

/// Cloneable producer side of the sink
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: UnboundedSender<CrawlRecord>,
}

impl RecordSender {
    /// Queues a record for writing
    ///
    /// Returns false if the writer task has stopped (it hit a write error).
    pub fn send(&self, record: CrawlRecord) -> bool {
        self.tx.send(record).is_ok()
    }
}

/// The consumer task; resolves once every sender is dropped
pub struct SinkTask<W: Write> {
    handle: JoinHandle<Result<RecordWriter<W>>>,
}

impl<W: Write + Send + 'static> SinkTask<W> {
    /// Waits for the writer to drain the channel and flush
    pub async fn wait(self) -> Result<RecordWriter<W>> {
        self.handle
            .await
            .map_err(|e| VitrineError::Sink(format!("writer task failed: {}", e)))?
    }
}

/// Starts the writer task for `writer`
pub fn spawn_sink<W: Write + Send + 'static>(
    mut writer: RecordWriter<W>,
) -> (RecordSender, SinkTask<W>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<CrawlRecord>();

    let handle = tokio::task::spawn_blocking(move || {
        while let Some(record) = rx.blocking_recv() {
            // Each record reaches the destination before the next is taken
            if let Err(e) = writer.write_record(&record).and_then(|()| writer.flush()) {
                tracing::error!("Could not write record for {}: {}", record.page_url, e);
                return Err(e);
            }
            tracing::debug!("Wrote record for {}", record.page_url);
        }

        Ok(writer)
    });

    (RecordSender { tx }, SinkTask { handle })
}
