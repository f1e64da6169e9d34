use std::path::PathBuf;

use crate::resolver::ResolveError;

/// Errors that abort flattening a sample
#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    /// A record in the sample's graph could not be resolved
    #[error("Resolve error: {0}")]
    ResolveError(#[from] ResolveError),

    /// A sensor file could not be read
    #[error("failed to read sensor file {}: {source}", path.display())]
    FileRead {
        /// Absolute path of the sensor file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
