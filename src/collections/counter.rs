/*!
 * Concurrent Counter
 *
 * A signed 32-bit value behind a configurable lock. Reads take the shared
 * side of reader-writer backends, updates the exclusive side.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::{Guarded, LockKind, OverflowPolicy, SyncConfig};
use tracing::trace;

/// Lock-protected counter
#[derive(Debug)]
pub struct Counter {
    value: Guarded<i32>,
    overflow: OverflowPolicy,
}

impl Counter {
    /// Counter starting at zero
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_value(0, config)
    }

    pub fn with_value(initial: i32, config: &SyncConfig) -> Self {
        Self {
            value: Guarded::from_config(initial, config),
            overflow: config.overflow,
        }
    }

    pub fn get_value(&self) -> i32 {
        *self.value.read()
    }

    /// Add one
    ///
    /// Under [`OverflowPolicy::Report`] an increment at `i32::MAX` fails with
    /// [`SyncError::Overflow`] and leaves the value untouched.
    pub fn increment(&self) -> SyncResult<()> {
        let mut value = self.value.write();
        *value = match value.checked_add(1) {
            Some(next) => next,
            None => match self.overflow {
                OverflowPolicy::Wrap => {
                    trace!("counter wrapped past i32::MAX");
                    value.wrapping_add(1)
                }
                OverflowPolicy::Report => return Err(SyncError::Overflow("counter".into())),
            },
        };
        Ok(())
    }

    /// Subtract one
    ///
    /// Under [`OverflowPolicy::Report`] a decrement at `i32::MIN` fails with
    /// [`SyncError::Underflow`] and leaves the value untouched.
    pub fn decrement(&self) -> SyncResult<()> {
        let mut value = self.value.write();
        *value = match value.checked_sub(1) {
            Some(next) => next,
            None => match self.overflow {
                OverflowPolicy::Wrap => {
                    trace!("counter wrapped past i32::MIN");
                    value.wrapping_sub(1)
                }
                OverflowPolicy::Report => return Err(SyncError::Underflow("counter".into())),
            },
        };
        Ok(())
    }

    pub fn lock_kind(&self) -> LockKind {
        self.value.kind()
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}
