//! Core traits shared by `ordcon`'s containers.

use crate::error::Result;
use crate::outcomes::{InsertOutcome, RemoveOutcome};

/// A trait for data structures that have a length/size.
pub trait Container {
    /// Returns the number of elements in the container.
    fn len(&self) -> usize;

    /// Returns `true` if the container contains no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The polymorphic "dictionary" capability set: the boundary that lets a
/// caller hold either `balanced::AvlTree` or `skiplist::SkipList` behind one
/// handle and dispatch without knowing which.
///
/// This is the Rust-idiomatic rendition of the source contract's function-
/// table wrapper (§9: "in an interface-typed target, a capability set
/// implemented by each container type"). It intentionally omits `probe`:
/// the inherent `probe` on each container borrows its "existed" value
/// straight out of the node (`&V`, no `Clone` needed), which isn't
/// expressible as a `dyn`-safe trait method without returning an owned
/// value; callers who need `probe` through a trait object should require
/// `V: Clone` and adapt at the call site instead of paying that cost here.
pub trait OrderedMap<K, V>: Container {
    /// See the containers' inherent `insert`.
    fn insert(&mut self, key: K, value: V, overwrite: bool) -> Result<InsertOutcome<V>>;

    /// See the containers' inherent `search`.
    fn search(&self, key: &K) -> Option<&V>;

    /// See the containers' inherent `remove`.
    fn remove(&mut self, key: &K) -> RemoveOutcome<V>;

    /// See the containers' inherent `clear`. Returns the number removed.
    fn clear(&mut self) -> usize;

    /// Visits entries in ascending key order, stopping early if `visit`
    /// returns `false`. Returns the number of entries visited (including
    /// the one on which `visit` returned `false`, if any).
    fn traverse(&self, visit: &mut dyn FnMut(&K, &V) -> bool) -> usize;

    /// See the containers' inherent `min_key`.
    fn min_key(&self) -> Option<&K>;

    /// See the containers' inherent `max_key`.
    fn max_key(&self) -> Option<&K>;
}
