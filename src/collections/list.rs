/*!
 * Concurrent List
 *
 * Singly linked list behind one configurable lock. Head insert (iteration
 * order is reverse insertion order), duplicates allowed, delete removes the
 * first match only. Every operation holds the list's guard for its whole
 * duration and never touches another structure's guard.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::{AllocPolicy, Guarded, MissingKeyPolicy, OverflowPolicy, SyncConfig};
use std::alloc::{alloc, Layout};
use tracing::{debug, warn};

/// List node
#[derive(Debug)]
pub struct Node {
    key: u32,
    next: Option<Box<Node>>,
}

impl Node {
    pub fn key(&self) -> u32 {
        self.key
    }

    /// Allocate a detached node, reporting allocation failure instead of
    /// aborting the process
    fn try_boxed(key: u32) -> Option<Box<Node>> {
        let layout = Layout::new::<Node>();
        // SAFETY: `Node` is not zero-sized
        let ptr = unsafe { alloc(layout) } as *mut Node;
        if ptr.is_null() {
            return None;
        }
        // SAFETY: `ptr` is a fresh, properly aligned allocation of
        // `Layout::new::<Node>()`, which is what `Box` expects to free
        unsafe {
            ptr.write(Node { key, next: None });
            Some(Box::from_raw(ptr))
        }
    }
}

#[derive(Debug, Default)]
struct Chain {
    head: Option<Box<Node>>,
    len: usize,
}

impl Chain {
    fn iter(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.head.as_deref(), |node| node.next.as_deref())
    }

    /// Free every node without recursing down the chain
    fn clear(&mut self) -> usize {
        let mut freed = 0;
        let mut cursor = self.head.take();
        while let Some(mut node) = cursor {
            cursor = node.next.take();
            freed += 1;
        }
        self.len = 0;
        freed
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Lock-protected singly linked list of `u32` keys
#[derive(Debug)]
pub struct ConcurrentList {
    chain: Guarded<Chain>,
    config: SyncConfig,
}

impl ConcurrentList {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            chain: Guarded::from_config(Chain::default(), config),
            config: config.clone(),
        }
    }

    /// Insert `key` at the head
    ///
    /// When no node can be allocated (memory or the configured capacity is
    /// exhausted) the insert is skipped, silently under
    /// [`AllocPolicy::Drop`] or with [`SyncError::AllocationFailed`] under
    /// [`AllocPolicy::Report`].
    pub fn insert(&self, key: u32) -> SyncResult<()> {
        // Allocate outside the critical section
        let Some(mut node) = Node::try_boxed(key) else {
            return self.refuse_insert(key, "out of memory");
        };

        let mut chain = self.chain.write();
        if let Some(capacity) = self.config.capacity {
            if chain.len >= capacity {
                drop(chain);
                return self.refuse_insert(key, "capacity exhausted");
            }
        }

        node.next = chain.head.take();
        chain.head = Some(node);
        chain.len += 1;
        Ok(())
    }

    /// Remove the first node holding `key`
    ///
    /// Returns `Ok(true)` if a node was removed. An absent key is `Ok(false)`
    /// under [`MissingKeyPolicy::Ignore`] and [`SyncError::KeyNotFound`] under
    /// [`MissingKeyPolicy::Report`].
    pub fn delete(&self, key: u32) -> SyncResult<bool> {
        let removed = {
            let mut chain = self.chain.write();
            let chain = &mut *chain;

            let mut cursor = &mut chain.head;
            while cursor.as_ref().is_some_and(|node| node.key != key) {
                if let Some(node) = cursor {
                    cursor = &mut node.next;
                }
            }

            let found = cursor.take();
            match found {
                Some(mut node) => {
                    *cursor = node.next.take();
                    chain.len -= 1;
                    true
                }
                None => false,
            }
        };

        if removed {
            return Ok(true);
        }

        match self.config.missing_key {
            MissingKeyPolicy::Ignore => Ok(false),
            MissingKeyPolicy::Report => {
                debug!(key, "delete of absent key");
                Err(SyncError::KeyNotFound(key))
            }
        }
    }

    /// Key of the first node matching `key`, if any
    pub fn lookup(&self, key: u32) -> Option<u32> {
        self.lookup_with(key, Node::key)
    }

    /// Run `f` on the first node matching `key` while the read guard is held
    pub fn lookup_with<F, R>(&self, key: u32, f: F) -> Option<R>
    where
        F: FnOnce(&Node) -> R,
    {
        let chain = self.chain.read();
        let found = chain.iter().find(|node| node.key == key).map(f);
        found
    }

    pub fn contains(&self, key: u32) -> bool {
        self.lookup_with(key, |_| ()).is_some()
    }

    /// Number of nodes, counted by walking the list
    pub fn count(&self) -> SyncResult<i32> {
        narrow_count(self.len(), self.config.overflow, "list count")
    }

    /// Walked node count before narrowing to `i32`
    pub fn len(&self) -> usize {
        self.chain.read().iter().count()
    }

    /// Sum of all keys
    pub fn sum(&self) -> SyncResult<i64> {
        let chain = self.chain.read();
        let sum = chain.iter().try_fold(0i64, |acc, node| {
            add_key(acc, node.key, self.config.overflow, "list sum")
        });
        sum
    }

    /// Keys in iteration order (most recently inserted first)
    pub fn keys(&self) -> Vec<u32> {
        self.chain.read().iter().map(Node::key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().head.is_none()
    }

    /// Free every node; the list stays usable and destroying twice is a no-op
    pub fn destroy(&self) {
        let freed = self.chain.write().clear();
        if freed > 0 {
            debug!(freed, "list destroyed");
        }
    }

    fn refuse_insert(&self, key: u32, reason: &str) -> SyncResult<()> {
        match self.config.alloc {
            AllocPolicy::Drop => {
                warn!(key, reason, "insert dropped");
                Ok(())
            }
            AllocPolicy::Report => Err(SyncError::AllocationFailed {
                key,
                reason: reason.to_string(),
            }),
        }
    }
}

impl Default for ConcurrentList {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

/// Convert a walked node count to the `i32` the API reports
pub(crate) fn narrow_count(
    count: usize,
    policy: OverflowPolicy,
    what: &'static str,
) -> SyncResult<i32> {
    match i32::try_from(count) {
        Ok(count) => Ok(count),
        Err(_) => match policy {
            OverflowPolicy::Wrap => Ok(count as i32),
            OverflowPolicy::Report => Err(SyncError::Overflow(what.into())),
        },
    }
}

pub(crate) fn add_key(
    acc: i64,
    key: u32,
    policy: OverflowPolicy,
    what: &'static str,
) -> SyncResult<i64> {
    add_sums(acc, i64::from(key), policy, what)
}

pub(crate) fn add_sums(
    acc: i64,
    value: i64,
    policy: OverflowPolicy,
    what: &'static str,
) -> SyncResult<i64> {
    match acc.checked_add(value) {
        Some(sum) => Ok(sum),
        None => match policy {
            OverflowPolicy::Wrap => Ok(acc.wrapping_add(value)),
            OverflowPolicy::Report => Err(SyncError::Overflow(what.into())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::LockKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_head_insert_order_and_duplicates() {
        let list = ConcurrentList::default();
        for key in [1, 2, 3, 2] {
            list.insert(key).unwrap();
        }
        assert_eq!(list.keys(), vec![2, 3, 2, 1]);
        assert_eq!(list.count().unwrap(), 4);
        assert_eq!(list.sum().unwrap(), 8);
    }

    #[test]
    fn test_delete_first_match_only() {
        let list = ConcurrentList::default();
        for key in [5, 7, 5, 9] {
            list.insert(key).unwrap();
        }

        assert!(list.delete(5).unwrap());
        assert_eq!(list.keys(), vec![9, 7, 5]);

        // Head and tail removal
        assert!(list.delete(9).unwrap());
        assert!(list.delete(5).unwrap());
        assert_eq!(list.keys(), vec![7]);
    }

    #[test]
    fn test_missing_key_policies() {
        let lenient = ConcurrentList::new(&SyncConfig::baseline());
        assert!(!lenient.delete(42).unwrap());

        let strict = ConcurrentList::new(&SyncConfig::hardened());
        assert_eq!(strict.delete(42).unwrap_err(), SyncError::KeyNotFound(42));
    }

    #[test]
    fn test_lookup() {
        let list = ConcurrentList::default();
        list.insert(11).unwrap();
        assert_eq!(list.lookup(11), Some(11));
        assert_eq!(list.lookup(12), None);
        assert_eq!(list.lookup_with(11, |node| node.key() * 2), Some(22));
        assert!(list.contains(11));
    }

    #[test]
    fn test_capacity_follows_alloc_policy() {
        let config = SyncConfig {
            capacity: Some(2),
            ..SyncConfig::baseline()
        };
        let list = ConcurrentList::new(&config);
        for key in 0..5 {
            list.insert(key).unwrap();
        }
        assert_eq!(list.count().unwrap(), 2);

        let config = SyncConfig {
            capacity: Some(1),
            ..SyncConfig::hardened()
        };
        let list = ConcurrentList::new(&config);
        list.insert(1).unwrap();
        assert!(matches!(
            list.insert(2),
            Err(SyncError::AllocationFailed { key: 2, .. })
        ));
        assert_eq!(list.keys(), vec![1]);
    }

    #[test]
    fn test_destroy_is_idempotent_and_reusable() {
        let list = ConcurrentList::new(&SyncConfig::with_lock(LockKind::ReaderWriter));
        for key in 0..100 {
            list.insert(key).unwrap();
        }

        list.destroy();
        assert!(list.is_empty());
        list.destroy();
        assert_eq!(list.count().unwrap(), 0);

        list.insert(3).unwrap();
        assert_eq!(list.keys(), vec![3]);
    }

    #[test]
    fn test_long_list_drop_does_not_recurse() {
        let list = ConcurrentList::new(&SyncConfig::with_lock(LockKind::Spin));
        for key in 0..200_000 {
            list.insert(key).unwrap();
        }
        drop(list);
    }

    #[test]
    fn test_count_narrowing() {
        let too_many = i32::MAX as usize + 1;
        assert!(narrow_count(too_many, OverflowPolicy::Report, "count").is_err());
        assert_eq!(
            narrow_count(too_many, OverflowPolicy::Wrap, "count").unwrap(),
            i32::MIN
        );
        assert_eq!(
            add_sums(i64::MAX, 1, OverflowPolicy::Wrap, "sum").unwrap(),
            i64::MIN
        );
        assert!(add_sums(i64::MAX, 1, OverflowPolicy::Report, "sum").is_err());
    }
}
