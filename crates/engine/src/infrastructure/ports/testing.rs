//! Testability port for injecting document ids.

// =============================================================================
// Testability Ports
// =============================================================================

/// Source of ids for documents the migration creates (derived skills and abilities).
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> String;
}
