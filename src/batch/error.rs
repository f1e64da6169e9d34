use crate::schema::SchemaError;
use crate::writer::WriterError;

/// Errors raised while buffering and flushing rows
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Rows could not be assembled into a batch of the dataset schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The sink rejected a flushed batch
    #[error(transparent)]
    Writer(#[from] WriterError),
}
