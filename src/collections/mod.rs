/*!
 * Collections
 *
 * Clients of the lock facade: a counter, a linked list and a bucket hash
 * table. Each structure takes a [`SyncConfig`](crate::core::sync::SyncConfig)
 * naming its lock backend and error policies.
 */

mod counter;
mod hash;
mod list;

pub use counter::Counter;
pub use hash::ConcurrentHashTable;
pub use list::{ConcurrentList, Node};
