/*!
 * Spinlock
 *
 * Exchange-based test-and-set lock. Never sleeps, never yields; meant for
 * critical sections a few instructions long. No fairness: a waiter can in
 * principle starve forever under contention.
 */

use super::super::atomic::{exchange, pause};
use super::super::traits::RawLock;
use std::sync::atomic::{AtomicU32, Ordering};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

/// Busy-waiting lock
#[derive(Debug)]
pub struct Spinlock {
    flag: AtomicU32,
}

impl Spinlock {
    pub const fn new() -> Self {
        Self {
            flag: AtomicU32::new(UNLOCKED),
        }
    }

    #[inline]
    pub fn acquire(&self) {
        while exchange(&self.flag, LOCKED) != UNLOCKED {
            pause();
        }
    }

    #[inline]
    pub fn try_acquire(&self) -> bool {
        exchange(&self.flag, LOCKED) == UNLOCKED
    }

    #[inline]
    pub fn release(&self) {
        self.flag.store(UNLOCKED, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed) != UNLOCKED
    }
}

impl Default for Spinlock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for Spinlock {
    fn acquire(&self) {
        Spinlock::acquire(self)
    }

    fn try_acquire(&self) -> bool {
        Spinlock::try_acquire(self)
    }

    fn release(&self) {
        Spinlock::release(self)
    }

    fn is_locked(&self) -> bool {
        Spinlock::is_locked(self)
    }

    fn name(&self) -> &'static str {
        "spin"
    }
}
