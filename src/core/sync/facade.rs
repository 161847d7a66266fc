/*!
 * Lock Facade
 *
 * One lock type over every backend, chosen once at construction from an
 * explicit [`LockKind`]. Exclusive backends offer `acquire`/`release`;
 * reader-writer backends offer `read_acquire`/`write_acquire`/`unlock` and
 * reject the plain pair with [`SyncError::UnsupportedOperation`].
 *
 * `read_acquire`/`write_acquire`/`unlock` also work on exclusive backends
 * (both map to `acquire`), so clients can always be written against the
 * reader-writer vocabulary.
 */

use super::config::{LockKind, SyncConfig};
use super::locks::{Mutex, RwLock, Spinlock, TwoPhaseLock};
use crate::core::errors::{SyncError, SyncResult};
use parking_lot::lock_api::{RawMutex as _, RawRwLock as _};
use tracing::trace;

/// Backend-selected lock
pub enum Lock {
    Spin(Spinlock),
    Blocking(Mutex),
    Hybrid(TwoPhaseLock),
    ReaderWriter(RwLock),
    PlatformMutex(parking_lot::RawMutex),
    PlatformRw(parking_lot::RawRwLock),
}

impl Lock {
    /// Create a lock of the given kind with default spin budgets
    pub fn new(kind: LockKind) -> Self {
        Self::from_config(&SyncConfig::with_lock(kind))
    }

    /// Create the lock described by `config`
    pub fn from_config(config: &SyncConfig) -> Self {
        trace!(kind = %config.lock, "creating lock");

        match config.lock {
            LockKind::Spin => Lock::Spin(Spinlock::new()),
            LockKind::Blocking => Lock::Blocking(Mutex::new()),
            LockKind::Hybrid => Lock::Hybrid(TwoPhaseLock::with_budgets(
                config.spin_budget,
                config.handoff_budget,
            )),
            LockKind::ReaderWriter => Lock::ReaderWriter(RwLock::with_budgets(
                config.spin_budget,
                config.handoff_budget,
            )),
            LockKind::PlatformMutex => Lock::PlatformMutex(parking_lot::RawMutex::INIT),
            LockKind::PlatformRw => Lock::PlatformRw(parking_lot::RawRwLock::INIT),
        }
    }

    pub fn kind(&self) -> LockKind {
        match self {
            Lock::Spin(_) => LockKind::Spin,
            Lock::Blocking(_) => LockKind::Blocking,
            Lock::Hybrid(_) => LockKind::Hybrid,
            Lock::ReaderWriter(_) => LockKind::ReaderWriter,
            Lock::PlatformMutex(_) => LockKind::PlatformMutex,
            Lock::PlatformRw(_) => LockKind::PlatformRw,
        }
    }

    /// Acquire exclusive ownership (exclusive backends only)
    pub fn acquire(&self) -> SyncResult<()> {
        match self {
            Lock::Spin(lock) => lock.acquire(),
            Lock::Blocking(lock) => lock.acquire(),
            Lock::Hybrid(lock) => lock.acquire(),
            Lock::PlatformMutex(lock) => lock.lock(),
            Lock::ReaderWriter(_) | Lock::PlatformRw(_) => {
                return Err(self.unsupported("acquire"))
            }
        }
        Ok(())
    }

    /// Acquire only if free right now (exclusive backends only)
    pub fn try_acquire(&self) -> SyncResult<bool> {
        match self {
            Lock::Spin(lock) => Ok(lock.try_acquire()),
            Lock::Blocking(lock) => Ok(lock.try_acquire()),
            Lock::Hybrid(lock) => Ok(lock.try_acquire()),
            Lock::PlatformMutex(lock) => Ok(lock.try_lock()),
            Lock::ReaderWriter(_) | Lock::PlatformRw(_) => Err(self.unsupported("try_acquire")),
        }
    }

    /// Release exclusive ownership (exclusive backends only)
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock through [`Lock::acquire`].
    pub unsafe fn release(&self) -> SyncResult<()> {
        match self {
            Lock::Spin(lock) => lock.release(),
            Lock::Blocking(lock) => lock.release(),
            Lock::Hybrid(lock) => lock.release(),
            // SAFETY: forwarded to the caller
            Lock::PlatformMutex(lock) => unsafe { lock.unlock() },
            Lock::ReaderWriter(_) | Lock::PlatformRw(_) => {
                return Err(self.unsupported("release"))
            }
        }
        Ok(())
    }

    /// Acquire shared ownership (exclusive on exclusive backends)
    pub fn read_acquire(&self) {
        match self {
            Lock::Spin(lock) => lock.acquire(),
            Lock::Blocking(lock) => lock.acquire(),
            Lock::Hybrid(lock) => lock.acquire(),
            Lock::ReaderWriter(lock) => lock.read_acquire(),
            Lock::PlatformMutex(lock) => lock.lock(),
            Lock::PlatformRw(lock) => lock.lock_shared(),
        }
    }

    /// Acquire exclusive ownership on any backend
    pub fn write_acquire(&self) {
        match self {
            Lock::Spin(lock) => lock.acquire(),
            Lock::Blocking(lock) => lock.acquire(),
            Lock::Hybrid(lock) => lock.acquire(),
            Lock::ReaderWriter(lock) => lock.write_acquire(),
            Lock::PlatformMutex(lock) => lock.lock(),
            Lock::PlatformRw(lock) => lock.lock_exclusive(),
        }
    }

    /// Release whatever ownership the caller holds
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock, shared or exclusive.
    pub unsafe fn unlock(&self) {
        match self {
            Lock::Spin(lock) => lock.release(),
            Lock::Blocking(lock) => lock.release(),
            Lock::Hybrid(lock) => lock.release(),
            Lock::ReaderWriter(lock) => lock.unlock(),
            // SAFETY: forwarded to the caller
            Lock::PlatformMutex(lock) => unsafe { lock.unlock() },
            // SAFETY: the caller holds the lock, so an exclusive holder can only be the caller
            Lock::PlatformRw(lock) => unsafe {
                if lock.is_locked_exclusive() {
                    lock.unlock_exclusive()
                } else {
                    lock.unlock_shared()
                }
            },
        }
    }

    /// Release shared ownership taken with [`Lock::read_acquire`]
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock through `read_acquire`.
    pub(crate) unsafe fn read_unlock(&self) {
        match self {
            // SAFETY: forwarded to the caller
            Lock::PlatformRw(lock) => unsafe { lock.unlock_shared() },
            _ => unsafe { self.unlock() },
        }
    }

    /// Release exclusive ownership taken with [`Lock::write_acquire`]
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock through `write_acquire`.
    pub(crate) unsafe fn write_unlock(&self) {
        match self {
            // SAFETY: forwarded to the caller
            Lock::PlatformRw(lock) => unsafe { lock.unlock_exclusive() },
            _ => unsafe { self.unlock() },
        }
    }

    /// Whether any thread holds the lock (diagnostics only)
    pub fn is_locked(&self) -> bool {
        match self {
            Lock::Spin(lock) => lock.is_locked(),
            Lock::Blocking(lock) => lock.is_locked(),
            Lock::Hybrid(lock) => lock.is_locked(),
            Lock::ReaderWriter(lock) => lock.is_locked(),
            Lock::PlatformMutex(lock) => lock.is_locked(),
            Lock::PlatformRw(lock) => lock.is_locked(),
        }
    }

    fn unsupported(&self, operation: &str) -> SyncError {
        SyncError::UnsupportedOperation {
            operation: operation.to_string(),
            backend: self.kind().as_str().to_string(),
        }
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl std::fmt::Debug for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("kind", &self.kind())
            .field("locked", &self.is_locked())
            .finish()
    }
}
