/*!
 * Lock Primitives
 *
 * Word-based locks built on the atomic and futex layers:
 * - Spinlock (pure busy wait)
 * - Mutex (futex, wake on every release)
 * - TwoPhaseLock (bounded spin, then futex with waiter tracking)
 * - RwLock (writer-preferring, internal lock + two condvars)
 */

mod mutex;
mod rwlock;
mod spin;
mod twophase;

// Re-export public API
pub use mutex::Mutex;
pub use rwlock::{RwLock, RwLockState};
pub use spin::Spinlock;
pub use twophase::{TwoPhaseLock, TwoPhaseState};
