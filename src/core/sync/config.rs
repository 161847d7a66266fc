/*!
 * Synchronization Configuration
 *
 * Backend selection and client-side policies, fixed once at construction
 */

use crate::core::errors::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CAS attempts a [`TwoPhaseLock`](super::TwoPhaseLock) makes before sleeping
pub const DEFAULT_SPIN_BUDGET: u32 = 1_000;

/// Iterations a releasing [`TwoPhaseLock`](super::TwoPhaseLock) spends trying
/// to hand the waiter mark to the next owner before issuing a wake
pub const DEFAULT_HANDOFF_BUDGET: u32 = 1_000;

/// Lock backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockKind {
    /// Busy-waiting exchange lock
    #[serde(rename = "spin", alias = "spinlock")]
    Spin,
    /// Futex mutex, wakes on every release
    #[serde(rename = "mutex", alias = "blocking")]
    Blocking,
    /// Two-phase spin-then-block lock
    #[serde(rename = "twophase", alias = "two-phase", alias = "hybrid")]
    Hybrid,
    /// Writer-preferring reader-writer lock built on condvars
    #[serde(rename = "rwlock", alias = "reader-writer")]
    ReaderWriter,
    /// parking_lot's mutex
    #[serde(rename = "platform-mutex", alias = "pthread")]
    PlatformMutex,
    /// parking_lot's reader-writer lock
    #[serde(rename = "platform-rwlock", alias = "platform-rw", alias = "prwlock")]
    PlatformRw,
}

impl LockKind {
    /// Every backend, in declaration order
    pub const ALL: [LockKind; 6] = [
        LockKind::Spin,
        LockKind::Blocking,
        LockKind::Hybrid,
        LockKind::ReaderWriter,
        LockKind::PlatformMutex,
        LockKind::PlatformRw,
    ];

    /// Backends that only offer shared/exclusive acquisition
    pub const fn is_reader_writer(self) -> bool {
        matches!(self, LockKind::ReaderWriter | LockKind::PlatformRw)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LockKind::Spin => "spin",
            LockKind::Blocking => "mutex",
            LockKind::Hybrid => "twophase",
            LockKind::ReaderWriter => "rwlock",
            LockKind::PlatformMutex => "platform-mutex",
            LockKind::PlatformRw => "platform-rwlock",
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spin" | "spinlock" => Ok(LockKind::Spin),
            "mutex" | "blocking" => Ok(LockKind::Blocking),
            "twophase" | "two-phase" | "hybrid" => Ok(LockKind::Hybrid),
            "rwlock" | "reader-writer" => Ok(LockKind::ReaderWriter),
            "platform-mutex" | "pthread" => Ok(LockKind::PlatformMutex),
            "platform-rwlock" | "platform-rw" | "prwlock" => Ok(LockKind::PlatformRw),
            other => Err(SyncError::InvalidConfig(format!("unknown lock kind '{}'", other))),
        }
    }
}

/// What arithmetic on counters and aggregates does at the integer boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Two's-complement wraparound
    Wrap,
    /// Refuse the operation and return an overflow/underflow error
    Report,
}

impl FromStr for OverflowPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrap" => Ok(OverflowPolicy::Wrap),
            "report" => Ok(OverflowPolicy::Report),
            other => Err(SyncError::InvalidConfig(format!(
                "unknown overflow policy '{}'",
                other
            ))),
        }
    }
}

/// What an insert does when its node cannot be allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocPolicy {
    /// Log and silently skip the insert
    Drop,
    /// Return an allocation error
    Report,
}

/// What a delete does when the key is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// No-op, `Ok(false)`
    Ignore,
    /// Return a key-not-found error
    Report,
}

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Lock backend guarding each structure
    pub lock: LockKind,
    /// Two-phase lock spin attempts before sleeping
    pub spin_budget: u32,
    /// Two-phase lock hand-off attempts before waking
    pub handoff_budget: u32,
    pub overflow: OverflowPolicy,
    pub alloc: AllocPolicy,
    pub missing_key: MissingKeyPolicy,
    /// Maximum nodes per list (`None` = limited by memory only)
    pub capacity: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lock: LockKind::Hybrid,
            spin_budget: DEFAULT_SPIN_BUDGET,
            handoff_budget: DEFAULT_HANDOFF_BUDGET,
            overflow: OverflowPolicy::Report,
            alloc: AllocPolicy::Drop,
            missing_key: MissingKeyPolicy::Ignore,
            capacity: None,
        }
    }
}

impl SyncConfig {
    /// Default policies with the given lock backend
    pub fn with_lock(lock: LockKind) -> Self {
        Self {
            lock,
            ..Self::default()
        }
    }

    /// Silent wraparound, silently dropped inserts, ignored missing deletes
    pub fn baseline() -> Self {
        Self {
            overflow: OverflowPolicy::Wrap,
            alloc: AllocPolicy::Drop,
            missing_key: MissingKeyPolicy::Ignore,
            ..Self::default()
        }
    }

    /// Every boundary condition is reported to the caller
    pub fn hardened() -> Self {
        Self {
            overflow: OverflowPolicy::Report,
            alloc: AllocPolicy::Report,
            missing_key: MissingKeyPolicy::Report,
            ..Self::default()
        }
    }

    /// Overlay `SYNC_*` environment variables on the defaults
    ///
    /// Environment variables:
    /// - SYNC_LOCK_KIND: backend name (default: twophase)
    /// - SYNC_SPIN_BUDGET / SYNC_HANDOFF_BUDGET: two-phase budgets
    /// - SYNC_OVERFLOW_POLICY: wrap | report
    pub fn from_env() -> SyncResult<Self> {
        let mut config = Self::default();

        if let Ok(kind) = std::env::var("SYNC_LOCK_KIND") {
            config.lock = kind.parse()?;
        }
        if let Ok(budget) = std::env::var("SYNC_SPIN_BUDGET") {
            config.spin_budget = parse_budget("SYNC_SPIN_BUDGET", &budget)?;
        }
        if let Ok(budget) = std::env::var("SYNC_HANDOFF_BUDGET") {
            config.handoff_budget = parse_budget("SYNC_HANDOFF_BUDGET", &budget)?;
        }
        if let Ok(policy) = std::env::var("SYNC_OVERFLOW_POLICY") {
            config.overflow = policy.parse()?;
        }

        Ok(config)
    }
}

fn parse_budget(name: &str, value: &str) -> SyncResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|e| SyncError::InvalidConfig(format!("{}='{}': {}", name, value, e)))
}
