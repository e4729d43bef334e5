//! Error types for file loading.

use markowitz_portfolio::OptimizerError;
use thiserror::Error;

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors raised while reading a table file.
#[derive(Error, Debug)]
pub enum FileError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A cell or header could not be interpreted.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the file.
        line: u64,
        /// What went wrong.
        message: String,
    },

    /// The parsed table violates a container invariant.
    #[error(transparent)]
    Table(#[from] OptimizerError),
}

impl FileError {
    /// Create a parse error.
    #[must_use]
    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
