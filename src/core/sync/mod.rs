/*!
 * Synchronization Primitives
 *
 * Locks and condition variables built directly on atomic words and a
 * futex-style wait/wake/requeue layer:
 * - Spinlock for critical sections a few instructions long
 * - Futex mutex and a two-phase (spin-then-block) hybrid lock
 * - Condition variable with requeue-based broadcast
 * - Writer-preferring reader-writer lock
 * - A facade selecting one backend from configuration
 *
 * # Architecture
 *
 * ```text
 * atomic -> futex -> {Spinlock, Mutex, TwoPhaseLock} -> Condvar -> RwLock
 *                                                     \-> Lock facade -> Guarded<T>
 * ```
 *
 * # Performance
 *
 * - Uncontended acquire/release never enters the futex layer (except the
 *   plain Mutex release, which always wakes)
 * - Broadcast wakes one waiter and requeues the rest, avoiding a stampede
 */

pub mod atomic;
mod condvar;
mod config;
mod facade;
pub mod futex;
mod guard;
pub mod locks;
mod traits;

pub use condvar::Condvar;
pub use config::{
    AllocPolicy, LockKind, MissingKeyPolicy, OverflowPolicy, SyncConfig, DEFAULT_HANDOFF_BUDGET,
    DEFAULT_SPIN_BUDGET,
};
pub use facade::Lock;
pub use futex::{Futex, NoRequeueFutex, ParkingFutex, RequeueResult, WakeResult};
pub use guard::{Guarded, ReadGuard, WriteGuard};
pub use locks::{Mutex, RwLock, RwLockState, Spinlock, TwoPhaseLock, TwoPhaseState};
pub use traits::{BlockingLock, RawLock};
