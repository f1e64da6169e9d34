/// Errors that can occur while appending to the output dataset
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the Arrow library during array operations
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Error from the Parquet library during file writing
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Codec name not supported by the Parquet writer
    #[error("Unsupported compression algorithm: {0}")]
    UnsupportedCompression(String),

    /// Codec level not valid for the chosen codec
    #[error("Invalid compression level: {0}")]
    InvalidCompressionLevel(String),

    /// Batch does not match the dataset schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}
