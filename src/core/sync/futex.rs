/*!
 * Futex Wait/Wake/Requeue
 *
 * Kernel-style wait queues keyed by the address of a 32-bit word.
 * Uses parking_lot_core for futex-like operations on all platforms.
 *
 * # Design
 *
 * - `wait(word, expected)` blocks only if `*word == expected` at the moment
 *   the thread is queued; the check runs under the queue bucket lock, so a
 *   store-then-wake on another thread can never slip in between
 * - `wake(word, n)` unblocks up to `n` waiters
 * - `requeue(word, n, target)` wakes `n` and moves the rest onto `target`
 *   without waking them (used by condvar broadcast)
 * - Spurious returns are allowed; every caller re-checks its word
 */

use parking_lot_core::{
    park, unpark_all, unpark_filter, unpark_one, unpark_requeue, FilterOp, ParkResult, ParkToken,
    RequeueOp, UnparkToken,
};
use std::sync::atomic::{AtomicU32, Ordering};

/// Wait-queue key for a futex word (its address)
#[inline(always)]
pub fn key_of(word: &AtomicU32) -> usize {
    word as *const AtomicU32 as usize
}

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    #[inline(always)]
    fn from_count(n: usize) -> Self {
        if n == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(n)
        }
    }

    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Result of a requeue operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequeueResult {
    /// Waiters unblocked directly
    pub woken: usize,
    /// Waiters moved to the target queue, still blocked
    pub requeued: usize,
}

/// Platform wait/wake/requeue mechanism
///
/// Implementations are zero-sized markers; all operations are associated
/// functions so primitives can select a backend through a type parameter.
pub trait Futex: Send + Sync + 'static {
    /// Block while `*word == expected`
    ///
    /// Returns `true` if the thread actually slept and was woken, `false` if
    /// the value had already changed.
    fn wait(word: &AtomicU32, expected: u32) -> bool;

    /// Wake up to `count` waiters blocked on `word`
    fn wake(word: &AtomicU32, count: usize) -> WakeResult;

    /// Wake `count` waiters on `word` and move the remaining ones to the
    /// queue keyed by `target`
    fn requeue(word: &AtomicU32, count: usize, target: usize) -> RequeueResult;

    /// Whether `requeue` really moves waiters (as opposed to waking them)
    fn supports_requeue() -> bool;

    /// Backend name for debugging
    fn name() -> &'static str;
}

/// Futex backend on top of parking_lot_core's global parking table
#[derive(Debug, Clone, Copy, Default)]
pub struct ParkingFutex;

impl Futex for ParkingFutex {
    fn wait(word: &AtomicU32, expected: u32) -> bool {
        let key = key_of(word);

        // SAFETY: the key is the address of an AtomicU32 the caller borrows for
        // the whole call, and the validate callback only performs an atomic load.
        let result = unsafe {
            park(
                key,
                || word.load(Ordering::SeqCst) == expected,
                || {},
                |_key, _was_last| {},
                ParkToken(0),
                None,
            )
        };

        matches!(result, ParkResult::Unparked(_))
    }

    fn wake(word: &AtomicU32, count: usize) -> WakeResult {
        let key = key_of(word);

        let woken = match count {
            0 => 0,
            // SAFETY: key is derived from a live futex word; callbacks do not re-enter parking_lot.
            1 => unsafe { unpark_one(key, |_| UnparkToken(0)) }.unparked_threads,
            usize::MAX => unsafe { unpark_all(key, UnparkToken(0)) },
            _ => {
                let mut remaining = count;
                // SAFETY: as above; the filter only touches a local counter.
                unsafe {
                    unpark_filter(
                        key,
                        |_| {
                            if remaining == 0 {
                                FilterOp::Stop
                            } else {
                                remaining -= 1;
                                FilterOp::Unpark
                            }
                        },
                        |_| UnparkToken(0),
                    )
                }
                .unparked_threads
            }
        };

        WakeResult::from_count(woken)
    }

    fn requeue(word: &AtomicU32, count: usize, target: usize) -> RequeueResult {
        let key = key_of(word);

        // parking_lot_core can wake at most one thread during a requeue
        let mut woken = 0;
        if count > 1 {
            woken = Self::wake(word, count - 1).count();
        }

        let op = if count == 0 {
            RequeueOp::RequeueAll
        } else {
            RequeueOp::UnparkOneRequeueRest
        };

        // SAFETY: both keys are futex word addresses; callbacks are trivial.
        let result = unsafe { unpark_requeue(key, target, || op, |_, _| UnparkToken(0)) };

        RequeueResult {
            woken: woken + result.unparked_threads,
            requeued: result.requeued_threads,
        }
    }

    fn supports_requeue() -> bool {
        true
    }

    fn name() -> &'static str {
        "parking"
    }
}

/// Backend for platforms without a requeue operation
///
/// `requeue` degrades to waking every waiter on the source word. Correct, but
/// a broadcast then lets all woken threads stampede the lock at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRequeueFutex;

impl Futex for NoRequeueFutex {
    fn wait(word: &AtomicU32, expected: u32) -> bool {
        ParkingFutex::wait(word, expected)
    }

    fn wake(word: &AtomicU32, count: usize) -> WakeResult {
        ParkingFutex::wake(word, count)
    }

    fn requeue(word: &AtomicU32, _count: usize, _target: usize) -> RequeueResult {
        RequeueResult {
            woken: ParkingFutex::wake(word, usize::MAX).count(),
            requeued: 0,
        }
    }

    fn supports_requeue() -> bool {
        false
    }

    fn name() -> &'static str {
        "no-requeue"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_futex_wake_one() {
        let word = Arc::new(AtomicU32::new(0));
        let word_clone = word.clone();

        let handle = thread::spawn(move || ParkingFutex::wait(&word_clone, 0));

        // Give thread time to park
        thread::sleep(Duration::from_millis(50));

        let result = ParkingFutex::wake(&word, 1);
        assert_eq!(result, WakeResult::Woken(1));

        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_wait_returns_on_value_mismatch() {
        let word = AtomicU32::new(7);
        // Value already differs from expected: must not block
        assert!(!ParkingFutex::wait(&word, 3));
    }

    #[test]
    fn test_wake_without_waiters() {
        let word = AtomicU32::new(0);
        assert_eq!(ParkingFutex::wake(&word, 1), WakeResult::NoWaiters);
        assert_eq!(ParkingFutex::wake(&word, usize::MAX).count(), 0);
    }

    #[test]
    fn test_wake_bounded_count() {
        let word = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let word = word.clone();
                thread::spawn(move || ParkingFutex::wait(&word, 0))
            })
            .collect();

        thread::sleep(Duration::from_millis(100));

        assert_eq!(ParkingFutex::wake(&word, 2), WakeResult::Woken(2));
        assert_eq!(ParkingFutex::wake(&word, usize::MAX), WakeResult::Woken(2));

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_requeue_moves_waiters() {
        let source = Arc::new(AtomicU32::new(0));
        let target = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let source = source.clone();
                thread::spawn(move || ParkingFutex::wait(&source, 0))
            })
            .collect();

        thread::sleep(Duration::from_millis(100));

        // Late arrivals must not block once the value moved on
        source.store(1, Ordering::SeqCst);
        let result = ParkingFutex::requeue(&source, 1, key_of(&target));
        assert_eq!(result.woken, 1);
        assert_eq!(result.requeued, 2);

        // Requeued threads now sleep on the target word
        assert_eq!(ParkingFutex::wake(&target, usize::MAX), WakeResult::Woken(2));

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_no_requeue_wakes_everyone() {
        let source = Arc::new(AtomicU32::new(0));
        let target = AtomicU32::new(0);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let source = source.clone();
                thread::spawn(move || NoRequeueFutex::wait(&source, 0))
            })
            .collect();

        thread::sleep(Duration::from_millis(100));

        source.store(1, Ordering::SeqCst);
        let result = NoRequeueFutex::requeue(&source, 1, key_of(&target));
        assert_eq!(result.woken, 3);
        assert_eq!(result.requeued, 0);
        assert!(!NoRequeueFutex::supports_requeue());

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
