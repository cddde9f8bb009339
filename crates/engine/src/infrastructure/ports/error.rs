//! Error types for port operations.

use std::path::PathBuf;

/// Pack store errors with context for debugging.
///
/// Every variant is fatal for the pack being migrated.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be serialized for writing.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A stored line or value is not a usable document.
    #[error("Corrupt record in {} at line {line}: {message}", .path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Nothing at the path looks like a pack store.
    #[error("No pack store found at {}", .0.display())]
    UnknownBackend(PathBuf),
}

impl StoreError {
    /// Create an Io error with the path that was being accessed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Corrupt error for a 1-based line (or row) number.
    pub fn corrupt(path: impl Into<PathBuf>, line: usize, message: impl ToString) -> Self {
        Self::Corrupt {
            path: path.into(),
            line,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = StoreError::database("replace_record", "disk I/O error");
        assert_eq!(
            err.to_string(),
            "Database error in replace_record: disk I/O error"
        );

        let err = StoreError::corrupt("packs/adventures.db", 3, "expected value");
        assert_eq!(
            err.to_string(),
            "Corrupt record in packs/adventures.db at line 3: expected value"
        );

        let err = StoreError::UnknownBackend(PathBuf::from("packs/missing"));
        assert_eq!(err.to_string(), "No pack store found at packs/missing");
    }
}
