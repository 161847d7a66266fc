/*!
 * Futex Sync Library
 * Futex-based locks, condition variables and lock-protected collections
 */

pub mod collections;
pub mod core;
pub mod monitoring;

// Re-exports
pub use collections::{ConcurrentHashTable, ConcurrentList, Counter, Node};
pub use core::errors::{SyncError, SyncResult};
pub use core::sync::{
    Condvar, Guarded, Lock, LockKind, Mutex, RwLock, Spinlock, SyncConfig, TwoPhaseLock,
};
pub use monitoring::init_tracing;
