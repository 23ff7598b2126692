//! Error types for dataset generation

use thiserror::Error;

/// Errors that can occur while generating the Parquet dataset
#[derive(Debug, Error)]
pub enum DatagenError {
    /// Failed to spawn the dbgen subprocess
    #[error("failed to run dbgen: {0}")]
    Spawn(String),

    /// dbgen exited with a non-zero status
    #[error("dbgen failed ({status}): {stderr}")]
    Generator { status: String, stderr: String },

    /// Failed to decode a .tbl file into Arrow batches
    #[error("tbl decode failed: {0}")]
    Decode(String),

    /// Failed to write Parquet output
    #[error("storage write failed: {0}")]
    Storage(String),

    /// Generated dataset failed validation
    #[error("dataset validation failed: {0}")]
    Validation(String),
}

impl From<std::io::Error> for DatagenError {
    fn from(e: std::io::Error) -> Self {
        DatagenError::Storage(e.to_string())
    }
}
