/*!
 * Concurrent Hash Table
 *
 * Fixed array of independently guarded lists; `key % bucket_count` picks the
 * bucket. There is no table-wide lock: every operation touches exactly one
 * bucket, and aggregates visit the buckets one at a time. The bucket count
 * never changes after construction.
 */

use super::list::{add_sums, narrow_count, ConcurrentList, Node};
use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::{OverflowPolicy, SyncConfig};
use tracing::debug;

/// Bucket hash table of `u32` keys
#[derive(Debug)]
pub struct ConcurrentHashTable {
    buckets: Box<[ConcurrentList]>,
    config: SyncConfig,
}

impl ConcurrentHashTable {
    /// Create a table with `bucket_count` buckets, each guarded by the lock
    /// backend in `config`
    pub fn new(bucket_count: usize, config: &SyncConfig) -> SyncResult<Self> {
        if bucket_count == 0 {
            return Err(SyncError::InvalidBucketCount(bucket_count));
        }

        let buckets = (0..bucket_count)
            .map(|_| ConcurrentList::new(config))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        debug!(bucket_count, lock = %config.lock, "hash table created");

        Ok(Self {
            buckets,
            config: config.clone(),
        })
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket index for `key`
    #[inline]
    pub fn bucket_of(&self, key: u32) -> usize {
        key as usize % self.buckets.len()
    }

    #[inline]
    fn bucket(&self, key: u32) -> &ConcurrentList {
        &self.buckets[self.bucket_of(key)]
    }

    /// Insert `key` (duplicates are kept)
    pub fn insert(&self, key: u32) -> SyncResult<()> {
        self.bucket(key).insert(key)
    }

    /// Remove one occurrence of `key`; see [`ConcurrentList::delete`]
    pub fn delete(&self, key: u32) -> SyncResult<bool> {
        self.bucket(key).delete(key)
    }

    pub fn lookup(&self, key: u32) -> Option<u32> {
        self.bucket(key).lookup(key)
    }

    pub fn lookup_with<F, R>(&self, key: u32, f: F) -> Option<R>
    where
        F: FnOnce(&Node) -> R,
    {
        self.bucket(key).lookup_with(key, f)
    }

    pub fn contains(&self, key: u32) -> bool {
        self.bucket(key).contains(key)
    }

    /// Total number of keys
    ///
    /// Buckets are counted one after another, so under concurrent mutation
    /// the result is a sum of per-bucket snapshots.
    pub fn count(&self) -> SyncResult<i32> {
        total_count(
            self.buckets.iter().map(ConcurrentList::len),
            self.config.overflow,
        )
    }

    /// Sum of all keys
    pub fn sum(&self) -> SyncResult<i64> {
        self.buckets.iter().try_fold(0i64, |acc, bucket| {
            add_sums(acc, bucket.sum()?, self.config.overflow, "hash sum")
        })
    }

    /// Free every node in every bucket; the table stays usable
    pub fn destroy(&self) {
        for bucket in self.buckets.iter() {
            bucket.destroy();
        }
    }
}

/// Add per-bucket lengths at full width and narrow once
fn total_count(lengths: impl Iterator<Item = usize>, policy: OverflowPolicy) -> SyncResult<i32> {
    let total = lengths.fold(0usize, usize::saturating_add);
    narrow_count(total, policy, "hash count")
}
