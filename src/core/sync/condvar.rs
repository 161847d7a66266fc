/*!
 * Condition Variable
 *
 * Sequence-counter condvar over the futex layer. A waiter snapshots the
 * sequence, drops its lock and sleeps until the sequence moves; signal and
 * broadcast bump the sequence before waking, so a notification issued
 * between the unlock and the sleep is never lost.
 *
 * # Binding
 *
 * The first `wait` binds the condvar to the lock it was given (by futex word
 * address). Waiting later with any other lock is a usage error reported as
 * [`SyncError::CondvarBindingMismatch`], with the caller's lock still held.
 *
 * # Broadcast
 *
 * Broadcast wakes a single waiter and requeues the rest onto the bound
 * lock's futex word. They are then released one at a time by the lock's own
 * release path instead of all stampeding the lock at once.
 */

use super::futex::{key_of, Futex, ParkingFutex, RequeueResult, WakeResult};
use super::traits::BlockingLock;
use crate::core::errors::{SyncError, SyncResult};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use tracing::{debug, warn};

const UNBOUND: usize = 0;

/// Condition variable bound lazily to one [`BlockingLock`]
///
/// Wakeups are at-least-once: always re-check the guarded condition in a
/// loop (or use [`Condvar::wait_while`]).
pub struct Condvar<F: Futex = ParkingFutex> {
    seq: AtomicU32,
    /// Futex word address of the bound lock; compared and used as a queue
    /// key only, never dereferenced
    bound: AtomicUsize,
    _futex: PhantomData<F>,
}

impl<F: Futex> Condvar<F> {
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
            bound: AtomicUsize::new(UNBOUND),
            _futex: PhantomData,
        }
    }

    /// Atomically release `lock` and sleep until notified, then re-acquire
    ///
    /// `lock` must be held by the caller. On a binding mismatch nothing
    /// happens: the lock stays held and the call returns immediately.
    pub fn wait<L>(&self, lock: &L) -> SyncResult<()>
    where
        L: BlockingLock + ?Sized,
    {
        let observed = self.seq.load(Ordering::SeqCst);
        self.bind(lock)?;

        lock.release();
        F::wait(&self.seq, observed);
        lock.acquire_contended();

        Ok(())
    }

    /// Wait until `condition` returns false
    pub fn wait_while<L, P>(&self, lock: &L, mut condition: P) -> SyncResult<()>
    where
        L: BlockingLock + ?Sized,
        P: FnMut() -> bool,
    {
        while condition() {
            self.wait(lock)?;
        }
        Ok(())
    }

    /// Wake one waiter
    pub fn signal(&self) -> WakeResult {
        self.seq.fetch_add(1, Ordering::SeqCst);
        F::wake(&self.seq, 1)
    }

    /// Wake every waiter, moving all but one onto the bound lock's queue
    pub fn broadcast(&self) -> RequeueResult {
        self.seq.fetch_add(1, Ordering::SeqCst);

        let target = self.bound.load(Ordering::SeqCst);
        if target == UNBOUND {
            // Never waited on, so nobody can be asleep here
            return RequeueResult::default();
        }

        F::requeue(&self.seq, 1, target)
    }

    /// Whether a lock has been bound by a previous wait
    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Relaxed) != UNBOUND
    }

    fn bind<L>(&self, lock: &L) -> SyncResult<()>
    where
        L: BlockingLock + ?Sized,
    {
        let given = key_of(lock.futex_word());

        match self
            .bound
            .compare_exchange(UNBOUND, given, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                debug!(lock = lock.name(), futex = F::name(), "condvar bound to lock");
                Ok(())
            }
            Err(bound) if bound == given => Ok(()),
            Err(bound) => {
                warn!(bound, given, "condvar waited on with a second lock");
                Err(SyncError::CondvarBindingMismatch { bound, given })
            }
        }
    }
}

impl<F: Futex> Default for Condvar<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Futex> fmt::Debug for Condvar<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condvar")
            .field("seq", &self.seq.load(Ordering::Relaxed))
            .field("bound", &self.is_bound())
            .field("futex", &F::name())
            .finish()
    }
}
