/*!
 * Futex Mutex
 *
 * Binary-word blocking lock. Contended acquirers sleep on the word with
 * expected value 1 and retry the exchange on every wake, so spurious wakeups
 * are harmless. Release always issues one wake; there is no waiter tracking.
 */

use super::super::atomic::exchange;
use super::super::futex::{Futex, ParkingFutex};
use super::super::traits::{BlockingLock, RawLock};
use std::sync::atomic::{AtomicU32, Ordering};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// Kernel-assisted blocking lock
///
/// No FIFO guarantee: a freshly arriving thread can beat a woken sleeper.
#[derive(Debug)]
pub struct Mutex {
    word: AtomicU32,
}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(UNLOCKED),
        }
    }

    pub fn acquire(&self) {
        while exchange(&self.word, LOCKED) != UNLOCKED {
            ParkingFutex::wait(&self.word, LOCKED);
        }
    }

    #[inline]
    pub fn try_acquire(&self) -> bool {
        exchange(&self.word, LOCKED) == UNLOCKED
    }

    pub fn release(&self) {
        exchange(&self.word, UNLOCKED);
        ParkingFutex::wake(&self.word, 1);
    }

    pub fn is_locked(&self) -> bool {
        self.word.load(Ordering::Relaxed) != UNLOCKED
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for Mutex {
    fn acquire(&self) {
        Mutex::acquire(self)
    }

    fn try_acquire(&self) -> bool {
        Mutex::try_acquire(self)
    }

    fn release(&self) {
        Mutex::release(self)
    }

    fn is_locked(&self) -> bool {
        Mutex::is_locked(self)
    }

    fn name(&self) -> &'static str {
        "mutex"
    }
}

impl BlockingLock for Mutex {
    fn futex_word(&self) -> &AtomicU32 {
        &self.word
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_uncontended_cycle() {
        let lock = Mutex::new();
        lock.acquire();
        assert!(lock.is_locked());
        assert!(!lock.try_acquire());
        lock.release();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_blocked_acquirer_wakes_on_release() {
        let lock = Arc::new(Mutex::new());
        let entered = Arc::new(AtomicU64::new(0));

        lock.acquire();

        let lock_clone = lock.clone();
        let entered_clone = entered.clone();
        let handle = thread::spawn(move || {
            lock_clone.acquire();
            entered_clone.store(1, Ordering::SeqCst);
            lock_clone.release();
        });

        // Give the waiter time to park on the word
        thread::sleep(Duration::from_millis(50));
        assert_eq!(entered.load(Ordering::SeqCst), 0);

        lock.release();
        handle.join().unwrap();
        assert_eq!(entered.load(Ordering::SeqCst), 1);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_critical_section_is_exclusive() {
        let lock = Arc::new(Mutex::new());
        let inside = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        lock.acquire();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                        lock.release();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
