//! Unified error types for the domain layer
//!
//! Rule tables are plain configuration data, so the only failures here are
//! tables that cannot drive a conversion.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A rule table is structurally unusable
    #[error("Invalid rule table `{table}`: {message}")]
    InvalidRuleTable {
        table: &'static str,
        message: String,
    },

    /// Lookup into a rule table failed
    #[error("No `{table}` entry for `{key}`")]
    Unmapped { table: &'static str, key: String },
}

impl DomainError {
    /// Creates an invalid rule table error.
    ///
    /// Use this from [`crate::RuleTables::validate`] when a table is empty
    /// or missing an entry the converters depend on.
    pub fn invalid_table(table: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRuleTable {
            table,
            message: message.into(),
        }
    }

    /// Create an unmapped lookup error
    pub fn unmapped(table: &'static str, key: impl Into<String>) -> Self {
        Self::Unmapped {
            table,
            key: key.into(),
        }
    }
}
