/*!
 * Two-Phase (Hybrid) Lock
 *
 * Spins for a bounded number of CAS attempts, then sleeps on the futex.
 * The word is a three-state machine:
 *
 * - `0` unlocked
 * - `1` locked, no waiter ever recorded
 * - `2` locked, some thread is (or was) sleeping
 *
 * An uncontended acquire/release pair is one CAS plus one exchange and never
 * enters the kernel. Release from state `1` returns immediately; release from
 * state `2` tries, for a bounded number of iterations, to hand the "has
 * waiters" mark to whichever thread grabbed the lock next, and only issues a
 * wake if nobody did.
 */

use super::super::atomic::{compare_and_swap, exchange, pause};
use super::super::config::{DEFAULT_HANDOFF_BUDGET, DEFAULT_SPIN_BUDGET};
use super::super::futex::{Futex, ParkingFutex};
use super::super::traits::{BlockingLock, RawLock};
use std::sync::atomic::{AtomicU32, Ordering};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// Observable state of a [`TwoPhaseLock`] word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoPhaseState {
    Unlocked,
    Locked,
    Contended,
}

/// Spin-then-block lock
#[derive(Debug)]
pub struct TwoPhaseLock {
    word: AtomicU32,
    spin_budget: u32,
    handoff_budget: u32,
}

impl TwoPhaseLock {
    pub const fn new() -> Self {
        Self::with_budgets(DEFAULT_SPIN_BUDGET, DEFAULT_HANDOFF_BUDGET)
    }

    /// Create with explicit spin (acquire) and hand-off (release) budgets
    ///
    /// Budgets only trade CPU time for latency; any value, including zero,
    /// is correct.
    pub const fn with_budgets(spin_budget: u32, handoff_budget: u32) -> Self {
        Self {
            word: AtomicU32::new(UNLOCKED),
            spin_budget,
            handoff_budget,
        }
    }

    pub fn acquire(&self) {
        let mut observed = LOCKED;

        for _ in 0..self.spin_budget {
            observed = compare_and_swap(&self.word, UNLOCKED, LOCKED);
            if observed == UNLOCKED {
                return;
            }
            pause();
        }

        if observed == LOCKED {
            observed = exchange(&self.word, CONTENDED);
        }

        while observed != UNLOCKED {
            ParkingFutex::wait(&self.word, CONTENDED);
            observed = exchange(&self.word, CONTENDED);
        }
    }

    /// Acquire straight into the contended state, skipping the spin phase
    pub fn acquire_contended(&self) {
        while exchange(&self.word, CONTENDED) != UNLOCKED {
            ParkingFutex::wait(&self.word, CONTENDED);
        }
    }

    #[inline]
    pub fn try_acquire(&self) -> bool {
        compare_and_swap(&self.word, UNLOCKED, LOCKED) == UNLOCKED
    }

    pub fn release(&self) {
        if self.word.load(Ordering::SeqCst) == CONTENDED {
            // Sleepers re-check the word when they wake
            self.word.store(UNLOCKED, Ordering::SeqCst);
        } else if exchange(&self.word, UNLOCKED) == LOCKED {
            return;
        }

        for _ in 0..self.handoff_budget {
            // A nonzero CAS result means another thread owns the lock now; its
            // release sees CONTENDED and takes over the wake.
            if self.word.load(Ordering::SeqCst) != UNLOCKED
                && compare_and_swap(&self.word, LOCKED, CONTENDED) != UNLOCKED
            {
                return;
            }
            pause();
        }

        ParkingFutex::wake(&self.word, 1);
    }

    pub fn is_locked(&self) -> bool {
        self.word.load(Ordering::Relaxed) != UNLOCKED
    }

    pub fn state(&self) -> TwoPhaseState {
        match self.word.load(Ordering::SeqCst) {
            UNLOCKED => TwoPhaseState::Unlocked,
            LOCKED => TwoPhaseState::Locked,
            _ => TwoPhaseState::Contended,
        }
    }

    pub fn spin_budget(&self) -> u32 {
        self.spin_budget
    }

    pub fn handoff_budget(&self) -> u32 {
        self.handoff_budget
    }
}

impl Default for TwoPhaseLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLock for TwoPhaseLock {
    fn acquire(&self) {
        TwoPhaseLock::acquire(self)
    }

    fn try_acquire(&self) -> bool {
        TwoPhaseLock::try_acquire(self)
    }

    fn release(&self) {
        TwoPhaseLock::release(self)
    }

    fn is_locked(&self) -> bool {
        TwoPhaseLock::is_locked(self)
    }

    fn name(&self) -> &'static str {
        "twophase"
    }
}

impl BlockingLock for TwoPhaseLock {
    fn futex_word(&self) -> &AtomicU32 {
        &self.word
    }

    fn acquire_contended(&self) {
        TwoPhaseLock::acquire_contended(self)
    }
}
