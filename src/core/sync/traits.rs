/*!
 * Lock Traits
 *
 * Seams between the primitives and the layers built on them.
 */

use std::sync::atomic::AtomicU32;

/// A mutual-exclusion lock with no associated data
///
/// Releasing a lock the calling thread does not hold breaks mutual exclusion
/// for everyone else but is memory-safe for the word-based primitives here.
pub trait RawLock: Send + Sync {
    /// Block (or spin) until the lock is held by the caller
    fn acquire(&self);

    /// Take the lock only if it is free right now
    fn try_acquire(&self) -> bool;

    /// Release a lock held by the caller
    fn release(&self);

    /// Whether some thread currently holds the lock (diagnostics only)
    fn is_locked(&self) -> bool;

    /// Backend name for debugging
    fn name(&self) -> &'static str;
}

/// A lock whose waiters sleep on a futex word
///
/// Condition variables bind to a `BlockingLock` and, on broadcast, requeue
/// their waiters onto [`BlockingLock::futex_word`] so they are woken by the
/// lock's own release path one at a time.
pub trait BlockingLock: RawLock {
    /// Word that contended acquirers park on
    fn futex_word(&self) -> &AtomicU32;

    /// Acquire after returning from a condvar wait
    ///
    /// The caller may have been requeued onto the futex word, so this must
    /// leave the lock in a state whose release wakes the next sleeper.
    fn acquire_contended(&self) {
        self.acquire();
    }
}
