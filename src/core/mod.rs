/*!
 * Core Module
 * Error handling and synchronization primitives
 */

pub mod errors;
pub mod sync;

// Re-export for convenience
pub use errors::*;
