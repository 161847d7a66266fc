/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for synchronization and collection operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Recoverable errors reported by primitives and collections
///
/// None of these are fatal: the failing call aborts without side effects and
/// the error goes to the immediate caller only.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Condition variable is bound to another lock (bound {bound:#x}, given {given:#x})")]
    #[diagnostic(
        code(sync::condvar_binding_mismatch),
        help("A condition variable must always be waited on with the same lock.")
    )]
    CondvarBindingMismatch { bound: usize, given: usize },

    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    #[diagnostic(
        code(sync::unsupported_operation),
        help("Reader-writer backends use read_acquire/write_acquire/unlock instead of acquire/release.")
    )]
    UnsupportedOperation {
        operation: String,
        backend: String,
    },

    #[error("Arithmetic overflow in {0}")]
    #[diagnostic(
        code(collections::overflow),
        help("The value is at its maximum. Use OverflowPolicy::Wrap to allow wraparound.")
    )]
    Overflow(String),

    #[error("Arithmetic underflow in {0}")]
    #[diagnostic(
        code(collections::underflow),
        help("The value is at its minimum. Use OverflowPolicy::Wrap to allow wraparound.")
    )]
    Underflow(String),

    #[error("Key {0} not found")]
    #[diagnostic(
        code(collections::key_not_found),
        help("Use MissingKeyPolicy::Ignore to treat deleting an absent key as a no-op.")
    )]
    KeyNotFound(u32),

    #[error("Node allocation failed for key {key}: {reason}")]
    #[diagnostic(
        code(collections::allocation_failed),
        help("System memory or the configured collection capacity is exhausted.")
    )]
    AllocationFailed { key: u32, reason: String },

    #[error("Invalid bucket count: {0}")]
    #[diagnostic(
        code(collections::invalid_bucket_count),
        help("A hash table needs at least one bucket.")
    )]
    InvalidBucketCount(usize),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(sync::invalid_config),
        help("Check SYNC_* environment variables and SyncConfig fields.")
    )]
    InvalidConfig(String),
}

impl SyncError {
    /// Whether the error came from an arithmetic range check
    pub fn is_range_error(&self) -> bool {
        matches!(self, SyncError::Overflow(_) | SyncError::Underflow(_))
    }
}
