//! Skip list (probabilistic multi-level linked structure).
//!
//! ```text
//! ╔══════════════════════════════════════════════════════════════════╗
//! ║  level 2   head ------------------------> 9 -----> /             ║
//! ║  level 1   head --------> 3 -------------> 9 -----> /            ║
//! ║  level 0   head -> 1 --> 3 --> 5 --> 7 --> 9 -----> /            ║
//! ║                                                                  ║
//! ║  Level k is a subsequence of level k-1; a node's tower height is ║
//! ║  how many levels reference it. Height is drawn from a per-list   ║
//! ║  32-bit LCG, not a fair coin flip (see `random_height`).         ║
//! ╚══════════════════════════════════════════════════════════════════╝
//! ```
//!
//! Like [`crate::balanced`], nodes live in a `Vec`-backed arena addressed by
//! index, with a free list for slot reuse on removal. The sentinel head is
//! arena slot `0`, allocated once at construction with a tower as tall as
//! `max_link`.
//!
//! ## Complexity
//!
//! | Operation      | Expected | Worst case |
//! |----------------|----------|------------|
//! | `insert`       | O(log n) | O(n)       |
//! | `probe`        | O(log n) | O(n)       |
//! | `search`       | O(log n) | O(n)       |
//! | `remove`       | O(log n) | O(n)       |
//! | `last`         | O(log n) | O(n)       |
//!
//! ## Example
//!
//! ```rust
//! use ordcon_containers::skiplist::SkipList;
//! use ordcon_core::InsertOutcome;
//!
//! let mut list: SkipList<i32, &str> = SkipList::new(16);
//! assert!(matches!(list.insert(5, "five", false).unwrap(), InsertOutcome::Inserted));
//! assert_eq!(list.search(&5), Some(&"five"));
//! assert_eq!(list.len(), 1);
//! ```

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

use ordcon_core::{
    ord_comparator, Comparator, Container, Destructor, InsertOutcome, OrdConError, OrderedMap,
    ProbeOutcome, RemoveOutcome, Result,
};

type NodeId = usize;

const HEAD: NodeId = 0;
const MAX_LINK_CEILING: usize = 32;
const DEFAULT_MAX_LINK: usize = 16;
const LCG_A: u32 = 1_664_525;
const LCG_M: u32 = 1_013_904_223;

struct SkipNode<K, V> {
    key: Option<K>,
    value: Option<V>,
    /// `prev` at level 0, maintaining the doubly-linked base chain. `None`
    /// for the sentinel head.
    prev: Option<NodeId>,
    /// Exactly `link_count` forward pointers, one per occupied level.
    forward: Vec<Option<NodeId>>,
}

impl<K, V> SkipNode<K, V> {
    fn link_count(&self) -> usize {
        self.forward.len()
    }
}

/// A probabilistic ordered map over `K` keys, backed by a multi-level
/// linked list with randomized tower heights.
pub struct SkipList<K, V> {
    arena: Vec<Option<SkipNode<K, V>>>,
    free: Vec<NodeId>,
    len: usize,
    max_link: usize,
    top_link: usize,
    rng_state: u32,
    comparator: Comparator<K>,
    destructor: Option<Destructor<K, V>>,
}

impl<K: Ord + 'static, V> SkipList<K, V> {
    /// Creates an empty list ordered by `K`'s natural `Ord` implementation,
    /// with a tower-height cap of `max_link_cap` (clamped to `1..=32`).
    #[must_use]
    pub fn new(max_link_cap: usize) -> Self {
        Self::with_comparator(max_link_cap, ord_comparator())
    }
}

impl<K, V> SkipList<K, V> {
    /// Creates an empty list ordered by a caller-supplied comparator.
    #[must_use]
    pub fn with_comparator(max_link_cap: usize, comparator: Comparator<K>) -> Self {
        let max_link = max_link_cap.clamp(1, MAX_LINK_CEILING);
        let head = SkipNode {
            key: None,
            value: None,
            prev: None,
            forward: vec![None; max_link],
        };
        SkipList {
            arena: alloc::vec![Some(head)],
            free: Vec::new(),
            len: 0,
            max_link,
            top_link: 0,
            rng_state: 0x2545_F491,
            comparator,
            destructor: None,
        }
    }

    /// Attaches a destructor hook, invoked exactly once on every `(key,
    /// value)` pair that subsequently leaves the list.
    #[must_use]
    pub fn with_destructor(mut self, destructor: Destructor<K, V>) -> Self {
        self.destructor = Some(destructor);
        self
    }

    /// Seeds the per-list PRNG explicitly (otherwise a fixed default seed
    /// is used). Exposed so callers needing reproducible tower-height
    /// sequences across runs can pin it.
    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng_state = seed;
        self
    }

    /// Number of resident entries. O(1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the list holds no entries. O(1).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The configured tower-height cap.
    #[inline]
    #[must_use]
    pub fn max_link(&self) -> usize {
        self.max_link
    }

    /// The highest level currently occupied by any tower.
    #[inline]
    #[must_use]
    pub fn top_link(&self) -> usize {
        self.top_link
    }

    fn node(&self, id: NodeId) -> &SkipNode<K, V> {
        self.arena[id].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut SkipNode<K, V> {
        self.arena[id].as_mut().expect("dangling NodeId")
    }

    fn key_of(&self, id: NodeId) -> &K {
        self.node(id).key.as_ref().expect("sentinel has no key")
    }

    /// Draws the next pseudo-random `u32` via the per-list LCG: `r <- r*A +
    /// M`, 32-bit arithmetic with natural wraparound.
    fn next_rand(&mut self) -> u32 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(LCG_A)
            .wrapping_add(LCG_M);
        self.rng_state
    }

    /// Draws a tower height in `1..max_link`. Starting from `i = 1`,
    /// increments `i` while `i + 1 < max_link` and the drawn value exceeds
    /// `2^(32-i)`. This reproduces the source contract's biased
    /// distribution exactly (a strict-greater-than test against
    /// successively halved thresholds), not the textbook independent
    /// coin-flip geometric distribution.
    fn random_height(&mut self) -> usize {
        let r = self.next_rand();
        let mut i: usize = 1;
        while i + 1 < self.max_link && r > (1u32.checked_shl((32 - i) as u32).unwrap_or(0)) {
            i += 1;
        }
        i
    }

    /// Populates `update` with, for each level, the last node visited
    /// before either reaching the key's position or falling off the end —
    /// the standard skip-list search-and-update-vector walk (§4.4).
    /// Returns the level-0 successor, if any.
    fn search_path(&self, key: &K, update: &mut [Option<NodeId>]) -> Option<NodeId> {
        let mut cur = HEAD;
        for level in (0..self.top_link).rev() {
            loop {
                match self.node(cur).forward.get(level).copied().flatten() {
                    Some(next) if (self.comparator)(self.key_of(next), key) == Ordering::Less => {
                        cur = next;
                    }
                    _ => break,
                }
            }
            update[level] = Some(cur);
        }
        self.node(cur).forward.first().copied().flatten()
    }

    fn alloc_node(&mut self, key: K, value: V, height: usize) -> Result<NodeId> {
        let node = SkipNode {
            key: Some(key),
            value: Some(value),
            prev: None,
            forward: vec![None; height],
        };
        if let Some(id) = self.free.pop() {
            self.arena[id] = Some(node);
            return Ok(id);
        }
        self.arena
            .try_reserve(1)
            .map_err(|_| OrdConError::AllocFailed)?;
        let id = self.arena.len();
        self.arena.push(Some(node));
        Ok(id)
    }

    fn dealloc_node(&mut self, id: NodeId) -> SkipNode<K, V> {
        let node = self.arena[id].take().expect("double free of NodeId");
        self.free.push(id);
        node
    }

    fn invoke_destructor(&mut self, key: K, value: V) -> Option<V> {
        match self.destructor.as_mut() {
            Some(hook) => {
                hook(key, value);
                None
            }
            None => {
                drop(key);
                Some(value)
            }
        }
    }

    fn insert_impl(
        &mut self,
        key: K,
        value: V,
        overwrite: bool,
    ) -> Result<(NodeId, InsertOutcome<V>)> {
        let mut update: Vec<Option<NodeId>> = vec![None; self.max_link];
        let successor = self.search_path(&key, &mut update);

        if let Some(s) = successor {
            if (self.comparator)(self.key_of(s), &key) == Ordering::Equal {
                if overwrite {
                    let old_key = core::mem::replace(&mut self.node_mut(s).key, Some(key))
                        .expect("resident node always has a key");
                    let old_value = core::mem::replace(&mut self.node_mut(s).value, Some(value))
                        .expect("resident node always has a value");
                    let leftover = self.invoke_destructor(old_key, old_value);
                    return Ok((s, InsertOutcome::Replaced(leftover)));
                }
                return Ok((s, InsertOutcome::AlreadyPresent));
            }
        }

        let height = self.random_height();
        if height > self.top_link {
            self.top_link = height;
        }

        let new_id = self.alloc_node(key, value, height)?;
        for level in 0..height {
            let anchor = update[level].unwrap_or(HEAD);
            let anchor_next = self.node(anchor).forward[level];
            self.node_mut(new_id).forward[level] = anchor_next;
            self.node_mut(anchor).forward[level] = Some(new_id);
        }

        let anchor0 = update[0].unwrap_or(HEAD);
        self.node_mut(new_id).prev = Some(anchor0);
        if let Some(s) = successor {
            self.node_mut(s).prev = Some(new_id);
        }

        self.len += 1;
        Ok((new_id, InsertOutcome::Inserted))
    }

    /// Inserts `(key, value)`. If `key` is already resident: replaces it
    /// and reports [`InsertOutcome::Replaced`] when `overwrite` is set
    /// (invoking the destructor hook on the displaced pair), or leaves the
    /// list unchanged and reports [`InsertOutcome::AlreadyPresent`]
    /// otherwise.
    pub fn insert(&mut self, key: K, value: V, overwrite: bool) -> Result<InsertOutcome<V>> {
        self.insert_impl(key, value, overwrite).map(|(_, outcome)| outcome)
    }

    /// Get-or-insert: if `key` is resident, returns its current value
    /// without touching the list; otherwise inserts `value` and returns
    /// it. A single search-and-update pass serves both outcomes.
    pub fn probe(&mut self, key: K, value: V) -> Result<(ProbeOutcome, &V)> {
        let (id, outcome) = self.insert_impl(key, value, false)?;
        let probe_outcome = match outcome {
            InsertOutcome::AlreadyPresent => ProbeOutcome::Existed,
            InsertOutcome::Inserted => ProbeOutcome::Inserted,
            InsertOutcome::Replaced(_) => unreachable!("probe never overwrites"),
        };
        Ok((probe_outcome, self.node(id).value.as_ref().expect("resident")))
    }

    fn find_node(&self, key: &K) -> Option<NodeId> {
        let mut update = vec![None; self.max_link];
        let successor = self.search_path(key, &mut update);
        successor.filter(|&s| (self.comparator)(self.key_of(s), key) == Ordering::Equal)
    }

    /// Looks up `key`, returning its value if resident.
    #[must_use]
    pub fn search(&self, key: &K) -> Option<&V> {
        self.find_node(key)
            .map(|id| self.node(id).value.as_ref().expect("resident"))
    }

    /// `true` if `key` is resident.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Removes `key`, invoking the destructor hook (if any) on the removed
    /// pair, and shrinking `top_link` past any now-empty top levels.
    pub fn remove(&mut self, key: &K) -> RemoveOutcome<V> {
        let mut update = vec![None; self.max_link];
        let successor = self.search_path(key, &mut update);

        let Some(victim) = successor.filter(|&s| (self.comparator)(self.key_of(s), key) == Ordering::Equal)
        else {
            return RemoveOutcome::NotPresent;
        };

        let victim_height = self.node(victim).link_count();
        for level in 0..victim_height {
            let anchor = update[level].unwrap_or(HEAD);
            if self.node(anchor).forward[level] == Some(victim) {
                self.node_mut(anchor).forward[level] = self.node(victim).forward[level];
            }
        }

        let victim_next = self.node(victim).forward[0];
        let victim_prev = self.node(victim).prev;
        if let Some(next) = victim_next {
            self.node_mut(next).prev = victim_prev;
        }

        while self.top_link > 0 && self.node(HEAD).forward[self.top_link - 1].is_none() {
            self.top_link -= 1;
        }

        let removed = self.dealloc_node(victim);
        self.len -= 1;

        RemoveOutcome::Removed(self.invoke_destructor(
            removed.key.expect("resident node always has a key"),
            removed.value.expect("resident node always has a value"),
        ))
    }

    /// Removes every entry, invoking the destructor hook (if any) on each.
    /// Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.len;
        let mut cur = self.node(HEAD).forward.first().copied().flatten();
        while let Some(id) = cur {
            let node = self.dealloc_node(id);
            cur = node.forward.first().copied().flatten();
            let _ = self.invoke_destructor(
                node.key.expect("resident node always has a key"),
                node.value.expect("resident node always has a value"),
            );
        }
        for slot in &mut self.node_mut(HEAD).forward {
            *slot = None;
        }
        self.top_link = 0;
        self.len = 0;
        removed
    }

    /// Clears the list and releases its arena, returning the count
    /// cleared. Equivalent to calling [`Self::clear`] and dropping the
    /// list; exposed explicitly for callers that want the §4.1 `free()`
    /// entry point.
    pub fn free(mut self) -> usize {
        self.clear()
    }

    /// Visits entries in ascending key order. Stops early if `visit`
    /// returns `false`. Returns the number of entries visited.
    pub fn traverse<F: FnMut(&K, &V) -> bool>(&self, mut visit: F) -> usize {
        let mut cur = self.node(HEAD).forward.first().copied().flatten();
        let mut count = 0;
        while let Some(id) = cur {
            count += 1;
            let node = self.node(id);
            let keep_going = visit(
                node.key.as_ref().expect("resident"),
                node.value.as_ref().expect("resident"),
            );
            if !keep_going {
                break;
            }
            cur = node.forward[0];
        }
        count
    }

    /// The smallest resident key.
    #[must_use]
    pub fn min_key(&self) -> Option<&K> {
        self.node(HEAD)
            .forward
            .first()
            .copied()
            .flatten()
            .map(|id| self.key_of(id))
    }

    /// The largest resident key: descend the sentinel from the top level
    /// downward, always taking the forward pointer when present. O(log n)
    /// expected.
    #[must_use]
    pub fn max_key(&self) -> Option<&K> {
        self.last_node().map(|id| self.key_of(id))
    }

    fn last_node(&self) -> Option<NodeId> {
        let mut cur = HEAD;
        let mut moved = false;
        for level in (0..self.top_link).rev() {
            loop {
                match self.node(cur).forward.get(level).copied().flatten() {
                    Some(next) => {
                        cur = next;
                        moved = true;
                    }
                    None => break,
                }
            }
        }
        moved.then_some(cur)
    }

    /// Structural diagnostic: checks the level-0 chain is strictly
    /// ascending, every level-`k` chain is a subsequence of level `k-1`,
    /// every tower height is in `[1, max_link)`, and `top_link` is exactly
    /// the highest occupied level. Panics on violation; intended for test
    /// and debug use (mirrors the source contract's `skiplist_verify`).
    pub fn verify(&self) -> bool {
        let mut prev_key: Option<&K> = None;
        let mut cur = self.node(HEAD).forward.first().copied().flatten();
        let mut count = 0;
        while let Some(id) = cur {
            let key = self.key_of(id);
            if let Some(p) = prev_key {
                if (self.comparator)(p, key) != Ordering::Less {
                    return false;
                }
            }
            prev_key = Some(key);
            let height = self.node(id).link_count();
            if height == 0 || height >= self.max_link {
                return false;
            }
            count += 1;
            cur = self.node(id).forward[0];
        }
        if count != self.len {
            return false;
        }
        for level in 1..self.top_link {
            let mut lower = self.node(HEAD).forward.first().copied().flatten();
            let mut upper = self.node(HEAD).forward.get(level).copied().flatten();
            while let Some(u) = upper {
                let mut found = false;
                while let Some(l) = lower {
                    if l == u {
                        found = true;
                        break;
                    }
                    lower = self.node(l).forward[0];
                }
                if !found {
                    return false;
                }
                upper = self.node(u).forward[level];
            }
        }
        let expected_top = (0..self.max_link)
            .rev()
            .find(|&k| self.node(HEAD).forward[k].is_some())
            .map_or(0, |k| k + 1);
        expected_top == self.top_link
    }

    /// Opens a cursor positioned before the first entry (invalidated).
    pub fn cursor(&mut self) -> SkipCursor<'_, K, V> {
        SkipCursor {
            list: self,
            current: None,
        }
    }
}

impl<K, V> Container for SkipList<K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<K: Ord + 'static, V> OrderedMap<K, V> for SkipList<K, V> {
    fn insert(&mut self, key: K, value: V, overwrite: bool) -> Result<InsertOutcome<V>> {
        SkipList::insert(self, key, value, overwrite)
    }

    fn search(&self, key: &K) -> Option<&V> {
        SkipList::search(self, key)
    }

    fn remove(&mut self, key: &K) -> RemoveOutcome<V> {
        SkipList::remove(self, key)
    }

    fn clear(&mut self) -> usize {
        SkipList::clear(self)
    }

    fn traverse(&self, visit: &mut dyn FnMut(&K, &V) -> bool) -> usize {
        SkipList::traverse(self, visit)
    }

    fn min_key(&self) -> Option<&K> {
        SkipList::min_key(self)
    }

    fn max_key(&self) -> Option<&K> {
        SkipList::max_key(self)
    }
}

impl<K, V> Drop for SkipList<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Ord + 'static, V> Extend<(K, V)> for SkipList<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v, true);
        }
    }
}

impl<K: Ord + 'static, V> FromIterator<(K, V)> for SkipList<K, V> {
    /// Collects into a list capped at the conventional `16`-level default
    /// used throughout this crate's own tests; construct via
    /// [`SkipList::with_comparator`] directly for a custom `max_link_cap`.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = SkipList::new(DEFAULT_MAX_LINK);
        for (k, v) in iter {
            let _ = list.insert(k, v, true);
        }
        list
    }
}

/// Consumes the list, yielding entries in ascending key order. Ownership of
/// every `(key, value)` pair moves to the caller; this does not invoke the
/// destructor hook (consuming iteration is a move, not a removal).
impl<K, V> IntoIterator for SkipList<K, V> {
    type Item = (K, V);
    type IntoIter = alloc::vec::IntoIter<(K, V)>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.node(HEAD).forward.first().copied().flatten();
        while let Some(id) = cur {
            let node = self.arena[id].take().expect("dangling NodeId");
            self.free.push(id);
            cur = node.forward.first().copied().flatten();
            out.push((
                node.key.expect("resident node always has a key"),
                node.value.expect("resident node always has a value"),
            ));
        }
        for slot in &mut self.node_mut(HEAD).forward {
            *slot = None;
        }
        self.top_link = 0;
        self.len = 0;
        out.into_iter()
    }
}

/// A bidirectional cursor over a [`SkipList`]'s entries in ascending key
/// order.
///
/// `next`/`prev` on an invalidated cursor behave as `first`/`last`
/// respectively (§4.6). `nextn`/`prevn` genuinely step forward/backward —
/// the source contract's `nextn` called the predecessor step inside a loop
/// nominally advancing forward, a copy-paste bug this implementation does
/// not reproduce.
pub struct SkipCursor<'a, K, V> {
    list: &'a mut SkipList<K, V>,
    current: Option<NodeId>,
}

impl<'a, K, V> SkipCursor<'a, K, V> {
    /// `true` if positioned on a live entry.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// Forces the cursor into the invalidated state.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// The current entry's key, or `None` if invalidated.
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.current.map(|id| self.list.key_of(id))
    }

    /// The current entry's value, or `None` if invalidated.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.current
            .map(|id| self.list.node(id).value.as_ref().expect("resident"))
    }

    /// Replaces the current entry's value, returning the prior one. Unlike
    /// container-level overwrite, this never invokes the destructor hook.
    /// `None` if invalidated (no side effect).
    pub fn set_value(&mut self, value: V) -> Option<V> {
        let id = self.current?;
        core::mem::replace(&mut self.list.node_mut(id).value, Some(value))
    }

    /// Moves to the smallest key. `false` if the list is empty
    /// (invalidates the cursor).
    pub fn first(&mut self) -> bool {
        self.current = self.list.node(HEAD).forward.first().copied().flatten();
        self.current.is_some()
    }

    /// Moves to the largest key. `false` if the list is empty (invalidates
    /// the cursor).
    pub fn last(&mut self) -> bool {
        self.current = self.list.last_node();
        self.current.is_some()
    }

    /// Advances to the next key in ascending order, following the level-0
    /// forward link. On an invalidated cursor, behaves as [`Self::first`].
    /// `false` (and invalidated) past the last entry.
    pub fn next(&mut self) -> bool {
        self.current = match self.current {
            None => self.list.node(HEAD).forward.first().copied().flatten(),
            Some(id) => self.list.node(id).forward[0],
        };
        self.current.is_some()
    }

    /// Moves to the previous key in ascending order, following the
    /// level-0 `prev` back-link; arriving at the sentinel invalidates the
    /// cursor. On an invalidated cursor, behaves as [`Self::last`].
    pub fn prev(&mut self) -> bool {
        self.current = match self.current {
            None => self.list.last_node(),
            Some(id) => self.list.node(id).prev.filter(|&p| p != HEAD),
        };
        self.current.is_some()
    }

    /// Takes `steps` forward steps. Stops (and reports `false`) at
    /// end-of-range; the cursor is left invalidated in that case.
    pub fn nextn(&mut self, steps: usize) -> bool {
        for _ in 0..steps {
            if !self.next() {
                return false;
            }
        }
        true
    }

    /// Takes `steps` backward steps. Stops (and reports `false`) at
    /// start-of-range; the cursor is left invalidated in that case.
    pub fn prevn(&mut self, steps: usize) -> bool {
        for _ in 0..steps {
            if !self.prev() {
                return false;
            }
        }
        true
    }

    /// Positions the cursor on `key` if resident; otherwise invalidates
    /// it.
    pub fn search(&mut self, key: &K) -> bool {
        self.current = self.list.find_node(key);
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use ordcon_core::InsertOutcome;

    fn collect_inorder(list: &SkipList<i32, i32>) -> Vec<i32> {
        let mut out = Vec::new();
        list.traverse(|k, _| {
            out.push(*k);
            true
        });
        out
    }

    mod basics {
        use super::*;

        #[test]
        fn new_is_empty() {
            let list: SkipList<i32, i32> = SkipList::new(16);
            assert!(list.is_empty());
            assert_eq!(list.len(), 0);
            assert_eq!(list.top_link(), 0);
        }

        #[test]
        fn max_link_cap_is_clamped() {
            let list: SkipList<i32, i32> = SkipList::new(1000);
            assert_eq!(list.max_link(), MAX_LINK_CEILING);
            let list: SkipList<i32, i32> = SkipList::new(0);
            assert_eq!(list.max_link(), 1);
        }

        #[test]
        fn from_iter_dedups_and_overwrites() {
            let list: SkipList<i32, i32> = [(1, 1), (2, 2), (1, 99)].into_iter().collect();
            assert_eq!(list.len(), 2);
            assert_eq!(list.search(&1), Some(&99));
        }

        #[test]
        fn into_iter_yields_ascending_pairs() {
            let list: SkipList<i32, i32> = [5, 3, 8, 1, 4, 7, 9].into_iter().map(|k| (k, k * 10)).collect();
            let pairs: Vec<(i32, i32)> = list.into_iter().collect();
            assert_eq!(
                pairs,
                vec![(1, 10), (3, 30), (4, 40), (5, 50), (7, 70), (8, 80), (9, 90)]
            );
        }
    }

    mod insert {
        use super::*;

        #[test]
        fn rejects_duplicate_without_overwrite() {
            let mut list = SkipList::new(16);
            assert!(matches!(
                list.insert(1, "a", false).unwrap(),
                InsertOutcome::Inserted
            ));
            assert!(matches!(
                list.insert(1, "b", false).unwrap(),
                InsertOutcome::AlreadyPresent
            ));
            assert_eq!(list.search(&1), Some(&"a"));
        }

        #[test]
        fn overwrite_replaces_and_returns_displaced_value() {
            let mut list = SkipList::new(16);
            list.insert(1, "a", false).unwrap();
            let outcome = list.insert(1, "b", true).unwrap();
            match outcome {
                InsertOutcome::Replaced(Some(old)) => assert_eq!(old, "a"),
                other => panic!("expected Replaced(Some), got {other:?}"),
            }
            assert_eq!(list.search(&1), Some(&"b"));
        }

        #[test]
        fn scenario_thousand_inserts_stay_within_max_link_bound() {
            let mut list: SkipList<i32, i32> = SkipList::new(8);
            let mut state: u32 = 0x9E37_79B9;
            for _ in 0..1000 {
                state = state.wrapping_mul(48271).wrapping_add(1);
                let k = (state % 1_000_000) as i32;
                let _ = list.insert(k, k, false);
            }
            assert!(list.top_link() <= 7);
            assert!(list.verify());
            let keys = collect_inorder(&list);
            assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn height_extends_top_link() {
            let mut list: SkipList<i32, i32> = SkipList::new(32);
            for k in 0..200 {
                list.insert(k, k, false).unwrap();
            }
            assert!(list.top_link() >= 1);
            assert!(list.verify());
        }
    }

    mod probe {
        use super::*;

        #[test]
        fn inserts_when_absent_and_reads_when_present() {
            let mut list = SkipList::new(16);
            let (outcome, value) = list.probe(1, "a").unwrap();
            assert_eq!(outcome, ProbeOutcome::Inserted);
            assert_eq!(*value, "a");

            let (outcome, value) = list.probe(1, "b").unwrap();
            assert_eq!(outcome, ProbeOutcome::Existed);
            assert_eq!(*value, "a");
            assert_eq!(list.search(&1), Some(&"a"));
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn remove_nonexistent_reports_not_present() {
            let mut list: SkipList<i32, i32> = SkipList::new(16);
            list.insert(1, 1, false).unwrap();
            assert!(!list.remove(&2).was_removed());
            assert_eq!(list.len(), 1);
        }

        #[test]
        fn remove_sole_node_returns_to_empty_and_shrinks_top_link() {
            let mut list = SkipList::new(16);
            list.insert(1, "a", false).unwrap();
            let top_before = list.top_link();
            assert!(top_before >= 1);
            let outcome = list.remove(&1);
            match outcome {
                RemoveOutcome::Removed(Some(v)) => assert_eq!(v, "a"),
                other => panic!("expected Removed(Some), got {other:?}"),
            }
            assert!(list.is_empty());
            assert_eq!(list.top_link(), 0);
        }

        #[test]
        fn remove_many_preserves_order_and_links() {
            let mut list: SkipList<i32, i32> = SkipList::new(12);
            for k in 0..300 {
                list.insert(k, k, false).unwrap();
            }
            for k in (0..300).step_by(2) {
                let outcome = list.remove(&k);
                assert!(outcome.was_removed());
            }
            assert!(list.verify());
            assert_eq!(list.len(), 150);
            let keys = collect_inorder(&list);
            assert_eq!(keys, (0..300).filter(|k| k % 2 != 0).collect::<Vec<_>>());
        }

        #[test]
        fn destructor_invoked_exactly_once_per_departing_pair() {
            use alloc::rc::Rc;
            use core::cell::RefCell;

            let calls: Rc<RefCell<Vec<(i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));
            let sink = calls.clone();
            let mut list = SkipList::new(16).with_destructor(Box::new(move |k, v| {
                sink.borrow_mut().push((k, v));
            }));
            for k in 0..50 {
                list.insert(k, k * 10, false).unwrap();
            }
            for k in 0..25 {
                assert!(matches!(list.remove(&k), RemoveOutcome::Removed(None)));
            }
            assert_eq!(calls.borrow().len(), 25);
        }
    }

    mod diagnostics {
        use super::*;

        #[test]
        fn verify_catches_nothing_wrong_on_healthy_list() {
            let mut list: SkipList<i32, i32> = SkipList::new(16);
            for k in 0..100 {
                list.insert(k, k, false).unwrap();
            }
            assert!(list.verify());
        }

        #[test]
        fn min_and_max_key() {
            let mut list: SkipList<i32, i32> = SkipList::new(16);
            for k in [5, 1, 9, 3, 7] {
                list.insert(k, k, false).unwrap();
            }
            assert_eq!(*list.min_key().unwrap(), 1);
            assert_eq!(*list.max_key().unwrap(), 9);
        }
    }

    mod cursor {
        use super::*;

        #[test]
        fn forward_then_backward_are_inverses() {
            let mut list: SkipList<i32, i32> = SkipList::new(16);
            for k in 1..=9 {
                list.insert(k, k, false).unwrap();
            }
            let mut cursor = list.cursor();
            assert!(cursor.next()); // invalidated -> first
            assert_eq!(*cursor.key().unwrap(), 1);

            let mut forward = Vec::new();
            loop {
                forward.push(*cursor.key().unwrap());
                if !cursor.next() {
                    break;
                }
            }
            assert_eq!(forward, (1..=9).collect::<Vec<_>>());

            let mut backward = Vec::new();
            loop {
                if !cursor.prev() {
                    break;
                }
                backward.push(*cursor.key().unwrap());
            }
            backward.reverse();
            assert_eq!(backward, (1..=9).collect::<Vec<_>>());
        }

        #[test]
        fn nextn_genuinely_advances_forward() {
            let mut list: SkipList<i32, i32> = SkipList::new(16);
            for k in 1..=5 {
                list.insert(k, k, false).unwrap();
            }
            let mut cursor = list.cursor();
            cursor.first();
            assert!(cursor.nextn(2));
            assert_eq!(*cursor.key().unwrap(), 3);
        }

        #[test]
        fn nextn_stops_at_end_of_range() {
            let mut list: SkipList<i32, i32> = SkipList::new(16);
            for k in 1..=3 {
                list.insert(k, k, false).unwrap();
            }
            let mut cursor = list.cursor();
            cursor.first();
            assert!(!cursor.nextn(5));
            assert!(!cursor.valid());
        }

        #[test]
        fn search_missing_key_invalidates() {
            let mut list: SkipList<i32, i32> = SkipList::new(16);
            for k in 1..=3 {
                list.insert(k, k, false).unwrap();
            }
            let mut cursor = list.cursor();
            assert!(!cursor.search(&42));
            assert!(!cursor.valid());
        }

        #[test]
        fn set_value_does_not_invoke_destructor() {
            use alloc::rc::Rc;
            use core::cell::RefCell;

            let calls: Rc<RefCell<usize>> = Rc::new(RefCell::new(0));
            let sink = calls.clone();
            let mut list = SkipList::new(16).with_destructor(Box::new(move |_: i32, _: i32| {
                *sink.borrow_mut() += 1;
            }));
            list.insert(1, 10, false).unwrap();
            let mut cursor = list.cursor();
            cursor.search(&1);
            let old = cursor.set_value(20);
            assert_eq!(old, Some(10));
            assert_eq!(*calls.borrow(), 0);
            assert_eq!(list.search(&1), Some(&20));
        }
    }
}
