//! Common error types for the metadata pipeline

use thiserror::Error;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the readers, summarizers and exporters
#[derive(Error, Debug)]
pub enum Error {
    /// Missing file, empty filename or unsupported extension
    #[error("Invalid input: {0}")]
    Validation(String),

    /// External executable could not be located or spawned
    #[error("{tool} not found")]
    ToolMissing { tool: String, hint: String },

    /// External executable exited with a non-zero status
    #[error("{tool} command failed (exit code {code:?})")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// External executable exceeded the configured timeout and was killed
    #[error("{tool} timed out after {seconds}s")]
    ToolTimedOut { tool: String, seconds: u64 },

    /// A reader rejected the file content
    #[error("Parse error: {0}")]
    Parse(String),

    /// The ALE reader returned an invalid result
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// No file of a batch could be converted
    #[error("No valid files could be processed")]
    EmptyBatch,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by the client's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::InvalidFile(_) | Error::EmptyBatch
        )
    }
}
