use std::fmt;

/// Statistics from a completed dataset write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Number of fragments appended
    pub fragments_written: usize,
    /// Total number of rows written
    pub rows_written: usize,
    /// Total size of the written fragments in bytes
    pub bytes_written: u64,
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} rows in {} fragment(s), {} bytes",
            self.rows_written, self.fragments_written, self.bytes_written
        )
    }
}
