//! Error types for the enquire library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the [`EnquireError`] enum. Each failure is reported at the operation
//! that caused it; nothing is retried or silently downgraded.
//!
//! # Examples
//!
//! ```
//! use enquire::analysis::stem::Stem;
//! use enquire::error::EnquireError;
//!
//! match Stem::new("klingon") {
//!     Err(EnquireError::UnsupportedLanguage(lang)) => assert_eq!(lang, "klingon"),
//!     _ => panic!("expected an unsupported language error"),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for enquire operations.
#[derive(Error, Debug)]
pub enum EnquireError {
    /// The stemmer language code is not known.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A query operator was given the wrong number of subqueries.
    #[error("Invalid arity: {0}")]
    InvalidArity(String),

    /// A database could not be opened (missing, invalid or corrupt).
    #[error("Database opening error: {0}")]
    DatabaseOpening(String),

    /// A database is already locked by another writer.
    #[error("Database lock error: {0}")]
    DatabaseLock(String),

    /// Out-of-bounds access into a result set.
    #[error("Index out of range: {index} (size {size})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of elements available.
        size: usize,
    },

    /// The requested document does not exist.
    #[error("Document not found: {0}")]
    DocNotFound(u32),

    /// An argument was outside its permitted range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Binary snapshot encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with EnquireError.
pub type Result<T> = std::result::Result<T, EnquireError>;

impl EnquireError {
    /// Create a new unsupported language error.
    pub fn unsupported_language<S: Into<String>>(language: S) -> Self {
        EnquireError::UnsupportedLanguage(language.into())
    }

    /// Create a new invalid arity error.
    pub fn invalid_arity<S: Into<String>>(msg: S) -> Self {
        EnquireError::InvalidArity(msg.into())
    }

    /// Create a new database opening error.
    pub fn database_opening<S: Into<String>>(msg: S) -> Self {
        EnquireError::DatabaseOpening(msg.into())
    }

    /// Create a new database lock error.
    pub fn database_lock<S: Into<String>>(msg: S) -> Self {
        EnquireError::DatabaseLock(msg.into())
    }

    /// Create a new index out of range error.
    pub fn index_out_of_range(index: usize, size: usize) -> Self {
        EnquireError::IndexOutOfRange { index, size }
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        EnquireError::InvalidArgument(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        EnquireError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        EnquireError::Other(msg.into())
    }
}

impl From<bincode::Error> for EnquireError {
    fn from(err: bincode::Error) -> Self {
        EnquireError::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = EnquireError::unsupported_language("xx");
        assert_eq!(error.to_string(), "Unsupported language: xx");

        let error = EnquireError::invalid_arity("AND_NOT needs exactly 2 subqueries");
        assert_eq!(
            error.to_string(),
            "Invalid arity: AND_NOT needs exactly 2 subqueries"
        );

        let error = EnquireError::index_out_of_range(3, 1);
        assert_eq!(error.to_string(), "Index out of range: 3 (size 1)");

        let error = EnquireError::DocNotFound(7);
        assert_eq!(error.to_string(), "Document not found: 7");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = EnquireError::from(io_error);

        match error {
            EnquireError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
