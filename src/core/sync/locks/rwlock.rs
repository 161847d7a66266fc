/*!
 * Reader-Writer Lock
 *
 * Bookkeeping guarded by an internal two-phase lock, with one condvar per
 * waiting class. Writer preference: a reader arriving while any writer holds
 * or waits for the lock queues behind it, which bounds writer starvation at
 * the cost of read throughput.
 */

use super::super::condvar::Condvar;
use super::super::config::{DEFAULT_HANDOFF_BUDGET, DEFAULT_SPIN_BUDGET};
use super::twophase::TwoPhaseLock;
use std::cell::UnsafeCell;
use tracing::error;

/// Snapshot of the reader-writer bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RwLockState {
    pub readers: u32,
    pub writer: bool,
    pub read_waiters: u32,
    pub write_waiters: u32,
}

/// Writer-preferring reader-writer lock
///
/// Invariant: `writer` and `readers > 0` never hold at the same time.
pub struct RwLock {
    inner: TwoPhaseLock,
    read_ready: Condvar,
    write_ready: Condvar,
    state: UnsafeCell<RwLockState>,
}

// SAFETY: `state` is only read or written while `inner` is held
unsafe impl Sync for RwLock {}

impl RwLock {
    pub const fn new() -> Self {
        Self::with_budgets(DEFAULT_SPIN_BUDGET, DEFAULT_HANDOFF_BUDGET)
    }

    /// Create with explicit budgets for the internal two-phase lock
    pub const fn with_budgets(spin_budget: u32, handoff_budget: u32) -> Self {
        Self {
            inner: TwoPhaseLock::with_budgets(spin_budget, handoff_budget),
            read_ready: Condvar::new(),
            write_ready: Condvar::new(),
            state: UnsafeCell::new(RwLockState {
                readers: 0,
                writer: false,
                read_waiters: 0,
                write_waiters: 0,
            }),
        }
    }

    /// Acquire shared access
    pub fn read_acquire(&self) {
        self.inner.acquire();
        let state = self.state.get();

        // SAFETY: `inner` is held for every access below; `wait_on` drops and
        // re-takes it, so no reference to `state` lives across the wait.
        unsafe {
            while (*state).writer || (*state).write_waiters > 0 {
                (*state).read_waiters += 1;
                self.wait_on(&self.read_ready);
                (*state).read_waiters -= 1;
            }
            (*state).readers += 1;
        }

        self.inner.release();
    }

    /// Acquire exclusive access
    pub fn write_acquire(&self) {
        self.inner.acquire();
        let state = self.state.get();

        // SAFETY: as in `read_acquire`
        unsafe {
            while (*state).readers > 0 || (*state).writer {
                (*state).write_waiters += 1;
                self.wait_on(&self.write_ready);
                (*state).write_waiters -= 1;
            }
            (*state).writer = true;
        }

        self.inner.release();
    }

    /// Release shared or exclusive access
    ///
    /// A pending writer is signalled first; otherwise all queued readers are
    /// released together.
    pub fn unlock(&self) {
        self.inner.acquire();
        let state = self.state.get();

        // SAFETY: `inner` is held
        unsafe {
            if (*state).readers > 0 {
                (*state).readers -= 1;
            } else {
                (*state).writer = false;
            }

            if (*state).write_waiters > 0 {
                self.write_ready.signal();
            } else if (*state).read_waiters > 0 {
                self.read_ready.broadcast();
            }
        }

        self.inner.release();
    }

    #[inline]
    pub fn read_unlock(&self) {
        self.unlock()
    }

    #[inline]
    pub fn write_unlock(&self) {
        self.unlock()
    }

    /// Consistent copy of the bookkeeping
    pub fn snapshot(&self) -> RwLockState {
        self.inner.acquire();
        // SAFETY: `inner` is held
        let snapshot = unsafe { *self.state.get() };
        self.inner.release();
        snapshot
    }

    pub fn is_locked(&self) -> bool {
        let snapshot = self.snapshot();
        snapshot.writer || snapshot.readers > 0
    }

    pub fn is_write_locked(&self) -> bool {
        self.snapshot().writer
    }

    fn wait_on(&self, cv: &Condvar) {
        // Both condvars are private and only ever see `inner`
        if let Err(err) = cv.wait(&self.inner) {
            error!(%err, "rwlock condvar rejected the internal lock");
        }
    }
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RwLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RwLock")
            .field("state", &self.snapshot())
            .finish()
    }
}
