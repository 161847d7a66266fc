/*!
 * Collections Integration Tests
 *
 * Concurrent consistency of the list and hash table, a sequential model
 * check, and environment-driven configuration
 */

use futex_sync::core::sync::{LockKind, OverflowPolicy, SyncConfig};
use futex_sync::{ConcurrentHashTable, ConcurrentList, SyncError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serial_test::serial;
use std::sync::Arc;
use std::thread;

const THREADS: u32 = 4;
const OPS: u32 = 2_000;

/// What one worker did: inserts minus deletes, and the matching key sum
#[derive(Default)]
struct Tally {
    net: i64,
    sum: i64,
}

/// Run a random insert/delete/lookup mix where every worker owns a
/// disjoint key range, so its own tally is exact
fn churn<I, D, L>(insert: I, delete: D, lookup: L) -> Tally
where
    I: Fn(u32) + Send + Sync + 'static,
    D: Fn(u32) -> bool + Send + Sync + 'static,
    L: Fn(u32) -> bool + Send + Sync + 'static,
{
    let ops = Arc::new((insert, delete, lookup));

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let ops = ops.clone();
            thread::spawn(move || {
                let (insert, delete, lookup) = &*ops;
                let mut rng = rand::thread_rng();
                let mut live: Vec<u32> = Vec::new();
                let mut tally = Tally::default();

                for _ in 0..OPS {
                    match rng.gen_range(0..3) {
                        0 => {
                            let key = worker * 1_000_000 + rng.gen_range(0..500);
                            insert(key);
                            live.push(key);
                            tally.net += 1;
                            tally.sum += i64::from(key);
                        }
                        1 if !live.is_empty() => {
                            let index = rng.gen_range(0..live.len());
                            let key = live.swap_remove(index);
                            assert!(delete(key), "owned key {} missing", key);
                            tally.net -= 1;
                            tally.sum -= i64::from(key);
                        }
                        _ => {
                            if let Some(key) = live.choose(&mut rng) {
                                assert!(lookup(*key), "owned key {} not found", key);
                            }
                        }
                    }
                }
                tally
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .fold(Tally::default(), |acc, tally| Tally {
            net: acc.net + tally.net,
            sum: acc.sum + tally.sum,
        })
}

#[test]
fn test_list_concurrent_consistency() {
    for kind in LockKind::ALL {
        let list = Arc::new(ConcurrentList::new(&SyncConfig::with_lock(kind)));
        let (a, b, c) = (list.clone(), list.clone(), list.clone());

        let tally = churn(
            move |key| a.insert(key).unwrap(),
            move |key| b.delete(key).unwrap(),
            move |key| c.contains(key),
        );

        assert_eq!(i64::from(list.count().unwrap()), tally.net, "backend {}", kind);
        assert_eq!(list.sum().unwrap(), tally.sum, "backend {}", kind);
    }
}

#[test]
fn test_hash_concurrent_consistency() {
    for kind in LockKind::ALL {
        let table = Arc::new(ConcurrentHashTable::new(64, &SyncConfig::with_lock(kind)).unwrap());
        let (a, b, c) = (table.clone(), table.clone(), table.clone());

        let tally = churn(
            move |key| a.insert(key).unwrap(),
            move |key| b.delete(key).unwrap(),
            move |key| c.lookup(key) == Some(key),
        );

        assert_eq!(i64::from(table.count().unwrap()), tally.net, "backend {}", kind);
        assert_eq!(table.sum().unwrap(), tally.sum, "backend {}", kind);
    }
}

#[test]
fn test_hash_bucket_collisions() {
    let table = ConcurrentHashTable::new(16, &SyncConfig::default()).unwrap();
    for key in [1, 17, 33] {
        table.insert(key).unwrap();
    }
    table.delete(17).unwrap();

    assert_eq!(table.lookup(17), None);
    assert_eq!(table.lookup(1), Some(1));
    assert_eq!(table.lookup(33), Some(33));
    assert_eq!(table.count().unwrap(), 2);
    assert_eq!(table.sum().unwrap(), 34);
}

#[test]
fn test_destroy_twice() {
    let list = ConcurrentList::default();
    let table = ConcurrentHashTable::new(4, &SyncConfig::default()).unwrap();
    for key in 0..32 {
        list.insert(key).unwrap();
        table.insert(key).unwrap();
    }

    list.destroy();
    list.destroy();
    table.destroy();
    table.destroy();

    assert_eq!(list.count().unwrap(), 0);
    assert_eq!(table.count().unwrap(), 0);
    assert_eq!(table.sum().unwrap(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u32),
    Delete(u32),
    Lookup(u32),
}

fn op() -> impl Strategy<Value = Op> {
    // Small key space so deletes and lookups actually hit
    prop_oneof![
        (0u32..16).prop_map(Op::Insert),
        (0u32..16).prop_map(Op::Delete),
        (0u32..16).prop_map(Op::Lookup),
    ]
}

proptest! {
    #[test]
    fn prop_list_matches_vec_model(ops in prop::collection::vec(op(), 0..200)) {
        let list = ConcurrentList::new(&SyncConfig::baseline());
        let mut model: Vec<u32> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    list.insert(key).unwrap();
                    model.insert(0, key);
                }
                Op::Delete(key) => {
                    let expected = match model.iter().position(|&k| k == key) {
                        Some(index) => {
                            model.remove(index);
                            true
                        }
                        None => false,
                    };
                    prop_assert_eq!(list.delete(key).unwrap(), expected);
                }
                Op::Lookup(key) => {
                    let expected = model.contains(&key).then_some(key);
                    prop_assert_eq!(list.lookup(key), expected);
                }
            }
        }

        prop_assert_eq!(list.keys(), model.clone());
        prop_assert_eq!(list.count().unwrap() as usize, model.len());
        prop_assert_eq!(list.sum().unwrap(), model.iter().map(|&k| i64::from(k)).sum::<i64>());
    }
}

const ENV_VARS: [&str; 4] = [
    "SYNC_LOCK_KIND",
    "SYNC_SPIN_BUDGET",
    "SYNC_HANDOFF_BUDGET",
    "SYNC_OVERFLOW_POLICY",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    clear_env();
    let config = SyncConfig::from_env().unwrap();
    assert_eq!(config, SyncConfig::default());
}

#[test]
#[serial]
fn test_config_from_env_overrides() {
    clear_env();
    std::env::set_var("SYNC_LOCK_KIND", "rwlock");
    std::env::set_var("SYNC_SPIN_BUDGET", "64");
    std::env::set_var("SYNC_HANDOFF_BUDGET", "8");
    std::env::set_var("SYNC_OVERFLOW_POLICY", "wrap");

    let config = SyncConfig::from_env();
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.lock, LockKind::ReaderWriter);
    assert_eq!(config.spin_budget, 64);
    assert_eq!(config.handoff_budget, 8);
    assert_eq!(config.overflow, OverflowPolicy::Wrap);
}

#[test]
#[serial]
fn test_config_from_env_rejects_garbage() {
    clear_env();
    std::env::set_var("SYNC_SPIN_BUDGET", "lots");
    let result = SyncConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(SyncError::InvalidConfig(_))));

    std::env::set_var("SYNC_LOCK_KIND", "ticket");
    let result = SyncConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
}
