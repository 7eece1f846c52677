//! Error types for hypercube construction

use std::path::PathBuf;
use thiserror::Error;

/// Error type for all library operations
#[derive(Error, Debug)]
pub enum HypercubeError {
    /// Invalid configuration (bad option combination, pre-existing output path)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An input file does not exist or cannot be opened
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    /// A genotype, change token, or hypercube line could not be parsed
    #[error("malformed record {record:?}: {reason}")]
    MalformedRecord {
        /// The offending token or line
        record: String,
        /// Why it could not be parsed
        reason: String,
    },

    /// A delta was requested between identical genotypes
    #[error("delta is undefined for identical genotypes")]
    IncomparableGenotypes,

    /// The open-file budget is too small to merge anything
    #[error("open-file budget must be at least 2, got {0}")]
    ResourceExceeded(usize),

    /// An underlying I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HypercubeError {
    /// Build a `MalformedRecord` error from a token and a reason
    pub(crate) fn malformed(record: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.to_string(),
            reason: reason.into(),
        }
    }
}
