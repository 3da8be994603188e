//! Shared helpers.
//!
//! Interpreter bookkeeping (value cache, adjacency, visited sets) is keyed
//! by dense node handles, so these maps trade SipHash's collision
//! resistance — irrelevant for compiler-produced graphs — for FxHash's
//! speed on small integer keys.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

pub type FastHashMap<K, V> = FxHashMap<K, V>;

pub type FastHashSet<K> = FxHashSet<K>;

/// Map pre-sized for a known entry count, typically one slot per graph
/// node.
#[inline]
pub fn sized_hash_map<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}
