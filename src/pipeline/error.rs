use crate::batch::BatchError;
use crate::config::ConfigError;
use crate::flatten::FlattenError;
use crate::resolver::ResolveError;
use crate::schema::SchemaError;
use crate::writer::WriterError;

/// Errors that abort a conversion run
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Invalid settings
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// A scene or sample record could not be resolved
    #[error("Resolve error: {0}")]
    ResolveError(#[from] ResolveError),

    /// A sample could not be flattened
    #[error("Flatten error: {0}")]
    FlattenError(#[from] FlattenError),

    /// The schema could not be inferred from the first row
    #[error("Schema error: {0}")]
    SchemaError(#[from] SchemaError),

    /// Rows could not be flushed
    #[error("Batch error: {0}")]
    BatchError(#[from] BatchError),

    /// The output dataset could not be opened or finished
    #[error("Writer error: {0}")]
    WriterError(#[from] WriterError),

    /// A scene's sample chain revisits a sample
    #[error("scene {scene}: sample chain revisits sample {sample}")]
    CycleDetected {
        /// Scene whose chain loops
        scene: String,
        /// First sample seen twice
        sample: String,
    },
}
