/*!
 * Guarded Data
 *
 * Pairs a facade [`Lock`] with the data it protects and hands out RAII
 * guards, so clients never touch the raw acquire/unlock calls.
 */

use super::config::{LockKind, SyncConfig};
use super::facade::Lock;
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Data protected by a backend-selected lock
pub struct Guarded<T> {
    lock: Lock,
    data: UnsafeCell<T>,
}

// SAFETY: shared access only happens under `read()` (T: Sync, several readers
// may see `&T` at once on reader-writer backends) and mutable access only under
// `write()`, which every backend makes exclusive.
unsafe impl<T: Send + Sync> Sync for Guarded<T> {}
unsafe impl<T: Send> Send for Guarded<T> {}

impl<T> Guarded<T> {
    pub fn new(data: T, kind: LockKind) -> Self {
        Self::from_config(data, &SyncConfig::with_lock(kind))
    }

    pub fn from_config(data: T, config: &SyncConfig) -> Self {
        Self {
            lock: Lock::from_config(config),
            data: UnsafeCell::new(data),
        }
    }

    /// Shared access; exclusive on backends without a shared mode
    pub fn read(&self) -> ReadGuard<'_, T> {
        self.lock.read_acquire();
        ReadGuard { guarded: self }
    }

    /// Exclusive access
    pub fn write(&self) -> WriteGuard<'_, T> {
        self.lock.write_acquire();
        WriteGuard { guarded: self }
    }

    /// Mutable access through a unique borrow, no locking needed
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    pub fn kind(&self) -> LockKind {
        self.lock.kind()
    }
}

impl<T: Default> Default for Guarded<T> {
    fn default() -> Self {
        Self::from_config(T::default(), &SyncConfig::default())
    }
}

impl<T> fmt::Debug for Guarded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded").field("lock", &self.lock).finish()
    }
}

/// Shared access to guarded data; unlocks on drop
pub struct ReadGuard<'a, T> {
    guarded: &'a Guarded<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: a read acquisition is held for the guard's lifetime
        unsafe { &*self.guarded.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: acquired in `Guarded::read`
        unsafe { self.guarded.lock.read_unlock() }
    }
}

/// Exclusive access to guarded data; unlocks on drop
pub struct WriteGuard<'a, T> {
    guarded: &'a Guarded<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: a write acquisition is held for the guard's lifetime
        unsafe { &*self.guarded.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: a write acquisition is held, so this is the only access
        unsafe { &mut *self.guarded.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: acquired in `Guarded::write`
        unsafe { self.guarded.lock.write_unlock() }
    }
}
