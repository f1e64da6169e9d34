//! Row buffering and periodic flushing.
//!
//! [`BatchAccumulator`] collects flattened rows and, every `flush_interval`
//! rows, converts them to a [`RecordBatch`](arrow::record_batch::RecordBatch)
//! of the dataset schema and appends it to a [`DatasetSink`]. Buffered rows
//! are released after each flush, so memory stays bounded by one batch.

mod convert;
mod error;


use std::collections::HashSet;

use arrow::datatypes::SchemaRef;
use log::{debug, warn};

use crate::value::Row;
use crate::writer::DatasetSink;

pub use convert::rows_to_record_batch;
pub use error::BatchError;

/// Counters kept by a [`BatchAccumulator`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Number of batches appended to the sink
    pub batches_flushed: usize,
    /// Number of rows in those batches
    pub rows_flushed: usize,
}

/// Buffers rows and flushes them to a sink in fixed-size batches
pub struct BatchAccumulator<S> {
    schema: SchemaRef,
    sink: S,
    flush_interval: usize,
    buffer: Vec<Row>,
    dropped_columns: HashSet<String>,
    stats: BatchStats,
}

impl<S: DatasetSink> BatchAccumulator<S> {
    /// Create an accumulator that flushes every `flush_interval` rows.
    ///
    /// A zero interval is treated as one.
    pub fn new(schema: SchemaRef, sink: S, flush_interval: usize) -> Self {
        let flush_interval = flush_interval.max(1);
        Self {
            schema,
            sink,
            flush_interval,
            buffer: Vec::with_capacity(flush_interval),
            dropped_columns: HashSet::new(),
            stats: BatchStats::default(),
        }
    }

    /// Buffer one row, flushing if the buffer reached the interval
    pub fn push(&mut self, row: Row) -> Result<(), BatchError> {
        for key in row.keys() {
            if self.schema.index_of(key).is_err() && self.dropped_columns.insert(key.to_string()) {
                warn!("Column '{}' is not in the dataset schema and will be dropped", key);
            }
        }

        self.buffer.push(row);
        if self.buffer.len() >= self.flush_interval {
            self.flush()?;
        }
        Ok(())
    }

    /// Append buffered rows to the sink as one batch. No-op when empty.
    pub fn flush(&mut self) -> Result<(), BatchError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let batch = rows_to_record_batch(&self.schema, &self.buffer)?;
        self.sink.append(&batch)?;

        self.stats.batches_flushed += 1;
        self.stats.rows_flushed += batch.num_rows();
        debug!(
            "Flushed batch {} ({} rows)",
            self.stats.batches_flushed,
            batch.num_rows()
        );
        self.buffer.clear();
        Ok(())
    }

    /// Rows waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Counters so far
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Flush the remainder and hand back the sink
    pub fn finish(mut self) -> Result<(S, BatchStats), BatchError> {
        self.flush()?;
        Ok((self.sink, self.stats))
    }
}
