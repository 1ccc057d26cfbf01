//! AVL tree (height-balanced binary search tree).
//!
//! ```text
//! ╔════════════════════════════════════════════════════════════════════╗
//! ║  Balance factor = height(right) - height(left), kept in {-1,0,+1}   ║
//! ║  at rest; a post-insert/post-delete walk restores it via rotation.  ║
//! ║                                                                     ║
//! ║        5(0)              Left rotation at 5 (RR case):             ║
//! ║       /    \                                                       ║
//! ║     3(0)   8(0)                  8                                 ║
//! ║                                 / \                                ║
//! ║                                5   9                               ║
//! ║                               / \                                  ║
//! ║                              3   7                                 ║
//! ╚════════════════════════════════════════════════════════════════════╝
//! ```
//!
//! Nodes live in a `Vec`-backed arena addressed by index (`NodeId`), with a
//! free list so removed slots are reused — the standard way to give an AVL
//! node a non-owning parent back-link in safe Rust without reference
//! counting (the parent/child edges would otherwise form a cycle).
//!
//! ## Complexity
//!
//! | Operation      | Average  | Worst case |
//! |----------------|----------|------------|
//! | `insert`       | O(log n) | O(log n)   |
//! | `probe`        | O(log n) | O(log n)   |
//! | `search`       | O(log n) | O(log n)   |
//! | `remove`       | O(log n) | O(log n)   |
//! | `min_key`/`max_key` | O(log n) | O(log n) |
//! | `traverse`     | O(n)     | O(n)       |
//!
//! ## Example
//!
//! ```rust
//! use ordcon_containers::balanced::AvlTree;
//! use ordcon_core::{InsertOutcome, ProbeOutcome};
//!
//! let mut tree: AvlTree<i32, &str> = AvlTree::new();
//! assert!(matches!(tree.insert(5, "five", false).unwrap(), InsertOutcome::Inserted));
//! assert!(matches!(tree.insert(5, "V", false).unwrap(), InsertOutcome::AlreadyPresent));
//! assert_eq!(tree.search(&5), Some(&"five"));
//!
//! let (outcome, value) = tree.probe(3, "three").unwrap();
//! assert_eq!(outcome, ProbeOutcome::Inserted);
//! assert_eq!(*value, "three");
//! ```

use alloc::vec::Vec;
use core::cmp::Ordering;

use ordcon_core::{
    ord_comparator, Comparator, Container, Destructor, InsertOutcome, OrdConError, OrderedMap,
    ProbeOutcome, RemoveOutcome, Result,
};

type NodeId = usize;

struct AvlNode<K, V> {
    key: K,
    value: V,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    /// `height(right) - height(left)`. In `{-1, 0, 1}` at rest; transiently
    /// `±2` mid-rebalance.
    balance: i8,
}

/// A height-balanced binary search tree mapping `K` to `V` under a
/// caller-supplied (or `Ord`-derived) total order.
pub struct AvlTree<K, V> {
    arena: Vec<Option<AvlNode<K, V>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
    comparator: Comparator<K>,
    destructor: Option<Destructor<K, V>>,
}

impl<K: Ord + 'static, V> AvlTree<K, V> {
    /// Creates an empty tree ordered by `K`'s natural `Ord` implementation —
    /// the safe-Rust substitute for the source contract's default
    /// "pointer value comparison".
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(ord_comparator())
    }
}

impl<K: Ord + 'static, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AvlTree<K, V> {
    /// Creates an empty tree ordered by a caller-supplied comparator.
    #[must_use]
    pub fn with_comparator(comparator: Comparator<K>) -> Self {
        AvlTree {
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            comparator,
            destructor: None,
        }
    }

    /// Attaches a destructor hook, invoked exactly once on every `(key,
    /// value)` pair that subsequently leaves the tree.
    #[must_use]
    pub fn with_destructor(mut self, destructor: Destructor<K, V>) -> Self {
        self.destructor = Some(destructor);
        self
    }

    /// Number of resident entries. O(1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the tree holds no entries. O(1).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, id: NodeId) -> &AvlNode<K, V> {
        self.arena[id].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut AvlNode<K, V> {
        self.arena[id].as_mut().expect("dangling NodeId")
    }

    fn alloc_node(&mut self, key: K, value: V) -> Result<NodeId> {
        if let Some(id) = self.free.pop() {
            self.arena[id] = Some(AvlNode {
                key,
                value,
                parent: None,
                left: None,
                right: None,
                balance: 0,
            });
            return Ok(id);
        }
        self.arena
            .try_reserve(1)
            .map_err(|_| OrdConError::AllocFailed)?;
        let id = self.arena.len();
        self.arena.push(Some(AvlNode {
            key,
            value,
            parent: None,
            left: None,
            right: None,
            balance: 0,
        }));
        Ok(id)
    }

    fn dealloc_node(&mut self, id: NodeId) -> AvlNode<K, V> {
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

    fn reparent_child(&mut self, parent: Option<NodeId>, old_child: NodeId, new_child: Option<NodeId>) {
        match parent {
            Some(p) => {
                if self.node(p).left == Some(old_child) {
                    self.node_mut(p).left = new_child;
                } else {
                    debug_assert_eq!(self.node(p).right, Some(old_child));
                    self.node_mut(p).right = new_child;
                }
            }
            None => self.root = new_child,
        }
    }

    fn find_node(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            cur = match (self.comparator)(key, &self.node(id).key) {
                Ordering::Less => self.node(id).left,
                Ordering::Greater => self.node(id).right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    fn leftmost_from(&self, mut cur: Option<NodeId>) -> Option<NodeId> {
        let mut last = None;
        while let Some(id) = cur {
            last = Some(id);
            cur = self.node(id).left;
        }
        last
    }

    fn rightmost_from(&self, mut cur: Option<NodeId>) -> Option<NodeId> {
        let mut last = None;
        while let Some(id) = cur {
            last = Some(id);
            cur = self.node(id).right;
        }
        last
    }

    /// In-order successor: leftmost of the right subtree, else the nearest
    /// ancestor reached via a left-child link.
    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(r) = self.node(id).right {
            return self.leftmost_from(Some(r));
        }
        let mut cur = id;
        loop {
            let parent = self.node(cur).parent?;
            if self.node(parent).left == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
    }

    /// In-order predecessor: mirror of [`Self::successor`].
    fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(l) = self.node(id).left {
            return self.rightmost_from(Some(l));
        }
        let mut cur = id;
        loop {
            let parent = self.node(cur).parent?;
            if self.node(parent).right == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
    }

    /// Single left rotation at `pivot` (the source contract's §4.2 "single
    /// left; right is symmetric"). Returns the new subtree root and whether
    /// the rotation changed the subtree's height (derived from whether the
    /// old child's balance was non-zero), which delete-side rebalancing
    /// uses to decide whether to keep propagating upward.
    fn rotate_left(&mut self, pivot: NodeId) -> (NodeId, bool) {
        let r = self.node(pivot).right.expect("rotate_left needs a right child");
        let r_bal_before = self.node(r).balance;
        let parent_of_pivot = self.node(pivot).parent;
        let r_left = self.node(r).left;

        self.node_mut(pivot).right = r_left;
        if let Some(rl) = r_left {
            self.node_mut(rl).parent = Some(pivot);
        }
        self.node_mut(r).left = Some(pivot);
        self.node_mut(pivot).parent = Some(r);
        self.node_mut(r).parent = parent_of_pivot;
        self.reparent_child(parent_of_pivot, pivot, Some(r));

        let new_n_bal = self.node(pivot).balance - 1 - core::cmp::max(r_bal_before, 0);
        self.node_mut(pivot).balance = new_n_bal;
        self.node_mut(r).balance = r_bal_before - 1 + core::cmp::min(new_n_bal, 0);

        (r, r_bal_before != 0)
    }

    /// Single right rotation at `pivot`; mirror of [`Self::rotate_left`].
    fn rotate_right(&mut self, pivot: NodeId) -> (NodeId, bool) {
        let l = self.node(pivot).left.expect("rotate_right needs a left child");
        let l_bal_before = self.node(l).balance;
        let parent_of_pivot = self.node(pivot).parent;
        let l_right = self.node(l).right;

        self.node_mut(pivot).left = l_right;
        if let Some(lr) = l_right {
            self.node_mut(lr).parent = Some(pivot);
        }
        self.node_mut(l).right = Some(pivot);
        self.node_mut(pivot).parent = Some(l);
        self.node_mut(l).parent = parent_of_pivot;
        self.reparent_child(parent_of_pivot, pivot, Some(l));

        let new_n_bal = self.node(pivot).balance + 1 - core::cmp::min(l_bal_before, 0);
        self.node_mut(pivot).balance = new_n_bal;
        self.node_mut(l).balance = l_bal_before + 1 + core::cmp::max(new_n_bal, 0);

        (l, l_bal_before != 0)
    }

    /// Restores the AVL invariant at `pivot`, whose balance has just reached
    /// `±2`. Picks single vs. double rotation from the heavy child's
    /// balance, per §4.2.
    fn rebalance_subtree(&mut self, pivot: NodeId) -> (NodeId, bool) {
        let balance = self.node(pivot).balance;
        if balance < -1 {
            let left = self.node(pivot).left.expect("balance < -1 implies a left child");
            if self.node(left).balance > 0 {
                self.rotate_left(left);
            }
            self.rotate_right(pivot)
        } else if balance > 1 {
            let right = self.node(pivot).right.expect("balance > 1 implies a right child");
            if self.node(right).balance < 0 {
                self.rotate_right(right);
            }
            self.rotate_left(pivot)
        } else {
            (pivot, false)
        }
    }

    /// Walks from the newly-linked node's parent upward, biasing each
    /// ancestor's balance by ±1 until it returns to 0 (height unchanged,
    /// stop), reaches ±2 (rotate, then always stop — a single rotation
    /// fully restores the pre-insert height), or the root is reached.
    fn rebalance_after_insert(&mut self, mut child: NodeId, parent: NodeId) {
        let mut parent_opt = Some(parent);
        while let Some(p) = parent_opt {
            let went_left = self.node(p).left == Some(child);
            let node = self.node_mut(p);
            node.balance += if went_left { -1 } else { 1 };
            match node.balance {
                0 => break,
                -2 | 2 => {
                    self.rebalance_subtree(p);
                    break;
                }
                _ => {}
            }
            child = p;
            parent_opt = self.node(p).parent;
        }
    }

    /// Walks upward from the spliced-out victim's former parent. Each step
    /// biases the ancestor's balance by ±1; `0` means the subtree shrank
    /// (keep climbing), `±1` means height is unchanged (stop), and `±2`
    /// triggers a rotation whose height-changed flag decides whether to
    /// keep climbing.
    fn rebalance_after_delete(&mut self, parent: NodeId, from_left: bool) {
        let mut parent_opt = Some(parent);
        let mut from_left = from_left;
        while let Some(p) = parent_opt {
            let node = self.node_mut(p);
            node.balance += if from_left { 1 } else { -1 };
            match node.balance {
                1 | -1 => break,
                0 => match self.node(p).parent {
                    Some(gp) => {
                        from_left = self.node(gp).left == Some(p);
                        parent_opt = Some(gp);
                    }
                    None => break,
                },
                _ => {
                    let (new_root, height_changed) = self.rebalance_subtree(p);
                    if !height_changed {
                        break;
                    }
                    match self.node(new_root).parent {
                        Some(gp) => {
                            from_left = self.node(gp).left == Some(new_root);
                            parent_opt = Some(gp);
                        }
                        None => break,
                    }
                }
            }
        }
    }

    fn insert_impl(&mut self, key: K, value: V, overwrite: bool) -> Result<(NodeId, InsertOutcome<V>)> {
        let Some(root) = self.root else {
            let id = self.alloc_node(key, value)?;
            self.root = Some(id);
            self.len += 1;
            return Ok((id, InsertOutcome::Inserted));
        };

        let mut cur = root;
        let (parent, went_left) = loop {
            match (self.comparator)(&key, &self.node(cur).key) {
                Ordering::Less => match self.node(cur).left {
                    Some(l) => cur = l,
                    None => break (cur, true),
                },
                Ordering::Greater => match self.node(cur).right {
                    Some(r) => cur = r,
                    None => break (cur, false),
                },
                Ordering::Equal => {
                    if overwrite {
                        let old_key = core::mem::replace(&mut self.node_mut(cur).key, key);
                        let old_value = core::mem::replace(&mut self.node_mut(cur).value, value);
                        let leftover = self.invoke_destructor(old_key, old_value);
                        return Ok((cur, InsertOutcome::Replaced(leftover)));
                    }
                    return Ok((cur, InsertOutcome::AlreadyPresent));
                }
            }
        };

        let new_id = self.alloc_node(key, value)?;
        self.node_mut(new_id).parent = Some(parent);
        if went_left {
            self.node_mut(parent).left = Some(new_id);
        } else {
            self.node_mut(parent).right = Some(new_id);
        }
        self.len += 1;
        self.rebalance_after_insert(new_id, parent);
        Ok((new_id, InsertOutcome::Inserted))
    }

    /// Inserts `(key, value)`. If `key` is already resident: replaces it
    /// and reports [`InsertOutcome::Replaced`] when `overwrite` is set
    /// (invoking the destructor hook on the displaced pair), or leaves the
    /// tree unchanged and reports [`InsertOutcome::AlreadyPresent`]
    /// otherwise.
    pub fn insert(&mut self, key: K, value: V, overwrite: bool) -> Result<InsertOutcome<V>> {
        self.insert_impl(key, value, overwrite).map(|(_, outcome)| outcome)
    }

    /// Get-or-insert: if `key` is resident, returns its current value
    /// without touching the tree; otherwise inserts `value` and returns it.
    /// A single search pass serves both outcomes.
    pub fn probe(&mut self, key: K, value: V) -> Result<(ProbeOutcome, &V)> {
        let (id, outcome) = self.insert_impl(key, value, false)?;
        let probe_outcome = match outcome {
            InsertOutcome::AlreadyPresent => ProbeOutcome::Existed,
            InsertOutcome::Inserted => ProbeOutcome::Inserted,
            InsertOutcome::Replaced(_) => unreachable!("probe never overwrites"),
        };
        Ok((probe_outcome, &self.node(id).value))
    }

    /// Looks up `key`, returning its value if resident.
    #[must_use]
    pub fn search(&self, key: &K) -> Option<&V> {
        self.find_node(key).map(|id| &self.node(id).value)
    }

    /// `true` if `key` is resident.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Removes `key`, invoking the destructor hook (if any) on the removed
    /// pair. If two children are present, the in-order successor's key and
    /// value are swapped into the victim's slot and the (now-redundant)
    /// successor node is the one physically spliced out, per §4.2.
    pub fn remove(&mut self, key: &K) -> RemoveOutcome<V> {
        let Some(mut victim) = self.find_node(key) else {
            return RemoveOutcome::NotPresent;
        };

        if self.node(victim).left.is_some() && self.node(victim).right.is_some() {
            let succ = self
                .leftmost_from(self.node(victim).right)
                .expect("right child implies a leftmost descendant");
            self.swap_contents(victim, succ);
            victim = succ;
        }

        let child = self.node(victim).left.or(self.node(victim).right);
        let parent = self.node(victim).parent;
        let victim_was_left = parent.map(|p| self.node(p).left == Some(victim));

        if let Some(c) = child {
            self.node_mut(c).parent = parent;
        }
        self.reparent_child(parent, victim, child);

        let removed = self.dealloc_node(victim);
        self.len -= 1;

        if let Some(p) = parent {
            self.rebalance_after_delete(p, victim_was_left.unwrap());
        }

        RemoveOutcome::Removed(self.invoke_destructor(removed.key, removed.value))
    }

    fn swap_contents(&mut self, a: NodeId, b: NodeId) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.arena.split_at_mut(hi);
        let lo_node = left[lo].as_mut().expect("dangling NodeId");
        let hi_node = right[0].as_mut().expect("dangling NodeId");
        core::mem::swap(&mut lo_node.key, &mut hi_node.key);
        core::mem::swap(&mut lo_node.value, &mut hi_node.value);
    }

    /// Removes every entry, invoking the destructor hook (if any) on each.
    /// Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.len;
        let root = self.root.take();
        self.clear_subtree(root);
        self.len = 0;
        removed
    }

    fn clear_subtree(&mut self, id: Option<NodeId>) {
        let Some(id) = id else { return };
        let node = self.dealloc_node(id);
        self.clear_subtree(node.left);
        self.clear_subtree(node.right);
        let _ = self.invoke_destructor(node.key, node.value);
    }

    /// Clears the tree and releases its arena, returning the count cleared.
    /// Equivalent to calling [`Self::clear`] and dropping the tree; exposed
    /// explicitly for callers that want the §4.1 `free()` entry point.
    pub fn free(mut self) -> usize {
        self.clear()
    }

    /// Visits entries in ascending key order. Stops early if `visit`
    /// returns `false`. Returns the number of entries visited.
    pub fn traverse<F: FnMut(&K, &V) -> bool>(&self, mut visit: F) -> usize {
        let mut stack: Vec<NodeId> = Vec::new();
        let mut current = self.root;
        let mut count = 0;
        loop {
            while let Some(id) = current {
                stack.push(id);
                current = self.node(id).left;
            }
            let Some(id) = stack.pop() else { break };
            count += 1;
            let node = self.node(id);
            if !visit(&node.key, &node.value) {
                break;
            }
            current = node.right;
        }
        count
    }

    /// The smallest resident key.
    #[must_use]
    pub fn min_key(&self) -> Option<&K> {
        self.leftmost_from(self.root).map(|id| &self.node(id).key)
    }

    /// The largest resident key.
    #[must_use]
    pub fn max_key(&self) -> Option<&K> {
        self.rightmost_from(self.root).map(|id| &self.node(id).key)
    }

    fn subtree_height(&self, id: Option<NodeId>) -> i64 {
        match id {
            None => -1,
            Some(id) => {
                let node = self.node(id);
                1 + core::cmp::max(
                    self.subtree_height(node.left),
                    self.subtree_height(node.right),
                )
            }
        }
    }

    /// Longest root-to-leaf edge count. `0` for an empty or single-node
    /// tree.
    #[must_use]
    pub fn height(&self) -> usize {
        self.subtree_height(self.root).max(0) as usize
    }

    fn subtree_min_height(&self, id: Option<NodeId>) -> i64 {
        match id {
            None => -1,
            Some(id) => {
                let node = self.node(id);
                match (node.left, node.right) {
                    (None, None) => 0,
                    (Some(l), None) => 1 + self.subtree_min_height(Some(l)),
                    (None, Some(r)) => 1 + self.subtree_min_height(Some(r)),
                    (Some(l), Some(r)) => {
                        1 + core::cmp::min(
                            self.subtree_min_height(Some(l)),
                            self.subtree_min_height(Some(r)),
                        )
                    }
                }
            }
        }
    }

    /// Shortest root-to-leaf edge count — a diagnostic of balance quality
    /// (should stay within `O(log n)` of [`Self::height`]).
    #[must_use]
    pub fn min_height(&self) -> usize {
        self.subtree_min_height(self.root).max(0) as usize
    }

    fn sum_path_length(&self, id: Option<NodeId>, depth: usize) -> usize {
        match id {
            None => 0,
            Some(id) => {
                let node = self.node(id);
                depth
                    + self.sum_path_length(node.left, depth + 1)
                    + self.sum_path_length(node.right, depth + 1)
            }
        }
    }

    /// Internal path length: the sum, over every non-root node, of its
    /// depth. A diagnostic of overall balance.
    #[must_use]
    pub fn path_length(&self) -> usize {
        self.sum_path_length(self.root, 0)
    }

    /// Opens a cursor positioned before the first entry (invalidated).
    pub fn cursor(&mut self) -> AvlCursor<'_, K, V> {
        AvlCursor {
            tree: self,
            current: None,
        }
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        fn walk<K: Ord, V>(
            tree: &AvlTree<K, V>,
            id: Option<NodeId>,
            parent: Option<NodeId>,
            lo: Option<&K>,
            hi: Option<&K>,
        ) -> i64 {
            let Some(id) = id else { return -1 };
            let node = tree.node(id);
            assert_eq!(node.parent, parent, "parent back-link mismatch");
            if let Some(lo) = lo {
                assert!(node.key > *lo, "BST order violated (lower bound)");
            }
            if let Some(hi) = hi {
                assert!(node.key < *hi, "BST order violated (upper bound)");
            }
            let lh = walk(tree, node.left, Some(id), lo, Some(&node.key));
            let rh = walk(tree, node.right, Some(id), Some(&node.key), hi);
            let balance = (rh - lh) as i8;
            assert_eq!(node.balance, balance, "stale balance factor");
            assert!((-1..=1).contains(&node.balance), "balance factor out of range");
            1 + core::cmp::max(lh, rh)
        }
        walk(self, self.root, None, None, None);
    }

    /// Test-only accessor exposing which key physically sits at the root —
    /// used to assert on rotation outcomes directly rather than inferring
    /// them from traversal order, which holds regardless of tree shape.
    #[cfg(test)]
    fn root_key(&self) -> Option<&K> {
        self.root.map(|id| &self.node(id).key)
    }
}

impl<K, V> Container for AvlTree<K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<K: Ord + 'static, V> OrderedMap<K, V> for AvlTree<K, V> {
    fn insert(&mut self, key: K, value: V, overwrite: bool) -> Result<InsertOutcome<V>> {
        AvlTree::insert(self, key, value, overwrite)
    }

    fn search(&self, key: &K) -> Option<&V> {
        AvlTree::search(self, key)
    }

    fn remove(&mut self, key: &K) -> RemoveOutcome<V> {
        AvlTree::remove(self, key)
    }

    fn clear(&mut self) -> usize {
        AvlTree::clear(self)
    }

    fn traverse(&self, visit: &mut dyn FnMut(&K, &V) -> bool) -> usize {
        AvlTree::traverse(self, visit)
    }

    fn min_key(&self) -> Option<&K> {
        AvlTree::min_key(self)
    }

    fn max_key(&self) -> Option<&K> {
        AvlTree::max_key(self)
    }
}

impl<K, V> Drop for AvlTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Ord + 'static, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        for (k, v) in iter {
            let _ = tree.insert(k, v, true);
        }
        tree
    }
}

impl<K: Ord + 'static, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v, true);
        }
    }
}

impl<K, V> AvlTree<K, V> {
    /// In-order extraction: takes each node's key/value out of the arena
    /// without invoking the destructor hook — consuming iteration transfers
    /// ownership to the caller rather than removing entries from the
    /// container, so the hook (reserved for `remove`/overwrite/`clear`)
    /// does not fire here.
    fn drain_into(&mut self, id: Option<NodeId>, out: &mut Vec<(K, V)>) {
        let Some(id) = id else { return };
        let node = self.arena[id].take().expect("dangling NodeId");
        self.free.push(id);
        self.drain_into(node.left, out);
        out.push((node.key, node.value));
        self.drain_into(node.right, out);
    }
}

/// Consumes the tree, yielding entries in ascending key order. Ownership of
/// every `(key, value)` pair moves to the caller; this does not invoke the
/// destructor hook (see [`AvlTree::drain_into`]).
impl<K, V> IntoIterator for AvlTree<K, V> {
    type Item = (K, V);
    type IntoIter = alloc::vec::IntoIter<(K, V)>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut out = Vec::with_capacity(self.len);
        let root = self.root.take();
        self.len = 0;
        self.drain_into(root, &mut out);
        out.into_iter()
    }
}

/// A bidirectional cursor over an [`AvlTree`]'s entries in ascending key
/// order.
///
/// `next`/`prev` on an invalidated cursor behave as `first`/`last`
/// respectively (§4.6). The cursor borrows the tree mutably so
/// [`Self::set_value`] can mutate in place; only one cursor (or other
/// mutating access) can be live at a time, which is the Rust-enforced form
/// of the source contract's "callers must serialize concurrent access".
pub struct AvlCursor<'a, K, V> {
    tree: &'a mut AvlTree<K, V>,
    current: Option<NodeId>,
}

impl<'a, K, V> AvlCursor<'a, K, V> {
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
        self.current.map(|id| &self.tree.node(id).key)
    }

    /// The current entry's value, or `None` if invalidated.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.current.map(|id| &self.tree.node(id).value)
    }

    /// Replaces the current entry's value, returning the prior one. Unlike
    /// container-level overwrite, this never invokes the destructor hook.
    /// `None` if invalidated (no side effect).
    pub fn set_value(&mut self, value: V) -> Option<V> {
        let id = self.current?;
        Some(core::mem::replace(&mut self.tree.node_mut(id).value, value))
    }

    /// Moves to the smallest key. `false` if the tree is empty
    /// (invalidates the cursor).
    pub fn first(&mut self) -> bool {
        self.current = self.tree.leftmost_from(self.tree.root);
        self.current.is_some()
    }

    /// Moves to the largest key. `false` if the tree is empty (invalidates
    /// the cursor).
    pub fn last(&mut self) -> bool {
        self.current = self.tree.rightmost_from(self.tree.root);
        self.current.is_some()
    }

    /// Advances to the next key in ascending order. On an invalidated
    /// cursor, behaves as [`Self::first`]. `false` (and invalidated) past
    /// the last entry.
    pub fn next(&mut self) -> bool {
        self.current = match self.current {
            None => self.tree.leftmost_from(self.tree.root),
            Some(id) => self.tree.successor(id),
        };
        self.current.is_some()
    }

    /// Moves to the previous key in ascending order. On an invalidated
    /// cursor, behaves as [`Self::last`]. `false` (and invalidated) before
    /// the first entry.
    pub fn prev(&mut self) -> bool {
        self.current = match self.current {
            None => self.tree.rightmost_from(self.tree.root),
            Some(id) => self.tree.predecessor(id),
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

    /// Positions the cursor on `key` if resident; otherwise invalidates it.
    pub fn search(&mut self, key: &K) -> bool {
        self.current = self.tree.find_node(key);
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use ordcon_core::InsertOutcome;

    fn collect_inorder(tree: &AvlTree<i32, i32>) -> Vec<i32> {
        let mut out = Vec::new();
        tree.traverse(|k, _| {
            out.push(*k);
            true
        });
        out
    }

    mod basics {
        use super::*;

        #[test]
        fn new_is_empty() {
            let tree: AvlTree<i32, i32> = AvlTree::new();
            assert!(tree.is_empty());
            assert_eq!(tree.len(), 0);
        }

        #[test]
        fn from_iter_dedups_and_overwrites() {
            let tree: AvlTree<i32, i32> = [(1, 1), (2, 2), (1, 99)].into_iter().collect();
            assert_eq!(tree.len(), 2);
            assert_eq!(tree.search(&1), Some(&99));
        }

        #[test]
        fn into_iter_yields_ascending_pairs() {
            let tree: AvlTree<i32, i32> = [5, 3, 8, 1, 4, 7, 9].into_iter().map(|k| (k, k * 10)).collect();
            let pairs: Vec<(i32, i32)> = tree.into_iter().collect();
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
            let mut tree = AvlTree::new();
            assert!(matches!(
                tree.insert(1, "a", false).unwrap(),
                InsertOutcome::Inserted
            ));
            assert!(matches!(
                tree.insert(1, "b", false).unwrap(),
                InsertOutcome::AlreadyPresent
            ));
            assert_eq!(tree.search(&1), Some(&"a"));
        }

        #[test]
        fn overwrite_replaces_and_returns_displaced_value() {
            let mut tree = AvlTree::new();
            tree.insert(1, "a", false).unwrap();
            let outcome = tree.insert(1, "b", true).unwrap();
            match outcome {
                InsertOutcome::Replaced(Some(old)) => assert_eq!(old, "a"),
                other => panic!("expected Replaced(Some), got {other:?}"),
            }
            assert_eq!(tree.search(&1), Some(&"b"));
        }

        #[test]
        fn scenario_seven_insertions_perfect_shape() {
            let mut tree = AvlTree::new();
            for k in [5, 3, 8, 1, 4, 7, 9] {
                tree.insert(k, k, false).unwrap();
                tree.assert_invariants();
            }
            assert_eq!(collect_inorder(&tree), vec![1, 3, 4, 5, 7, 8, 9]);
            assert_eq!(tree.height(), 2);
        }

        #[test]
        fn ascending_inserts_stay_balanced() {
            let mut tree = AvlTree::new();
            for k in 1..=1000 {
                tree.insert(k, k, false).unwrap();
                tree.assert_invariants();
            }
            assert_eq!(tree.len(), 1000);
            let h = tree.height();
            assert!((h as f64) < 2.0 * (1000_f64).log2());
        }

        #[test]
        fn descending_inserts_stay_balanced() {
            let mut tree = AvlTree::new();
            for k in (1..=1000).rev() {
                tree.insert(k, k, false).unwrap();
                tree.assert_invariants();
            }
            assert_eq!(tree.len(), 1000);
        }

        #[test]
        fn scenario_two_root_after_four_then_seven_ascending_inserts() {
            let mut tree = AvlTree::new();
            for k in 1..=4 {
                tree.insert(k, k, false).unwrap();
                tree.assert_invariants();
            }
            // The single left rotation after the fourth insert places 2 at
            // the root (spec concrete scenario 2).
            assert_eq!(*tree.root_key().unwrap(), 2);

            for k in 5..=7 {
                tree.insert(k, k, false).unwrap();
                tree.assert_invariants();
            }
            // After all seven ascending inserts the tree is perfectly
            // balanced with 4 at the root.
            assert_eq!(*tree.root_key().unwrap(), 4);
            assert_eq!(collect_inorder(&tree), vec![1, 2, 3, 4, 5, 6, 7]);
        }
    }

    mod probe {
        use super::*;

        #[test]
        fn inserts_when_absent_and_reads_when_present() {
            let mut tree = AvlTree::new();
            let (outcome, value) = tree.probe(1, "a").unwrap();
            assert_eq!(outcome, ProbeOutcome::Inserted);
            assert_eq!(*value, "a");

            let (outcome, value) = tree.probe(1, "b").unwrap();
            assert_eq!(outcome, ProbeOutcome::Existed);
            assert_eq!(*value, "a");
            assert_eq!(tree.search(&1), Some(&"a"));
        }
    }

    mod remove {
        use super::*;

        #[test]
        fn scenario_remove_promotes_successor() {
            let mut tree = AvlTree::new();
            for k in [5, 3, 8, 1, 4, 7, 9] {
                tree.insert(k, k, false).unwrap();
            }
            let outcome = tree.remove(&5);
            assert!(outcome.was_removed());
            tree.assert_invariants();
            assert_eq!(collect_inorder(&tree), vec![1, 3, 4, 7, 8, 9]);
        }

        #[test]
        fn remove_nonexistent_reports_not_present() {
            let mut tree: AvlTree<i32, i32> = AvlTree::new();
            tree.insert(1, 1, false).unwrap();
            assert!(!tree.remove(&2).was_removed());
            assert_eq!(tree.len(), 1);
        }

        #[test]
        fn remove_root_returns_to_empty() {
            let mut tree = AvlTree::new();
            tree.insert(1, "a", false).unwrap();
            let outcome = tree.remove(&1);
            match outcome {
                RemoveOutcome::Removed(Some(v)) => assert_eq!(v, "a"),
                other => panic!("expected Removed(Some), got {other:?}"),
            }
            assert!(tree.is_empty());
            assert_eq!(tree.root, None);
        }

        #[test]
        fn destructor_invoked_exactly_once_per_departing_pair() {
            use alloc::rc::Rc;
            use core::cell::RefCell;

            let calls: Rc<RefCell<Vec<(i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));
            let sink = calls.clone();
            let mut tree = AvlTree::new().with_destructor(Box::new(move |k, v| {
                sink.borrow_mut().push((k, v));
            }));
            for k in 1..=20 {
                tree.insert(k, k * 10, false).unwrap();
            }
            for k in 1..=10 {
                let outcome = tree.remove(&k);
                assert!(matches!(outcome, RemoveOutcome::Removed(None)));
                tree.assert_invariants();
            }
            assert_eq!(calls.borrow().len(), 10);
        }

        #[test]
        fn cascading_height_reduction_to_root() {
            let mut tree = AvlTree::new();
            for k in 1..=31 {
                tree.insert(k, k, false).unwrap();
            }
            for k in 1..=30 {
                tree.remove(&k);
                tree.assert_invariants();
            }
            assert_eq!(tree.len(), 1);
        }
    }

    mod diagnostics {
        use super::*;

        #[test]
        fn height_of_empty_and_singleton() {
            let mut tree: AvlTree<i32, i32> = AvlTree::new();
            assert_eq!(tree.height(), 0);
            tree.insert(1, 1, false).unwrap();
            assert_eq!(tree.height(), 0);
            assert_eq!(tree.min_height(), 0);
        }

        #[test]
        fn path_length_grows_with_shape() {
            let tree: AvlTree<i32, i32> = (1..=7).map(|k| (k, k)).collect();
            // Perfectly shaped 7-node tree: root (0) + two at depth 1 + four at depth 2.
            assert_eq!(tree.path_length(), 2 * 1 + 4 * 2);
        }
    }

    mod cursor {
        use super::*;

        #[test]
        fn forward_then_backward_are_inverses() {
            let mut tree: AvlTree<i32, i32> = (1..=9).map(|k| (k, k)).collect();
            let mut cursor = tree.cursor();
            assert!(cursor.next()); // invalidated -> first
            let first_key = *cursor.key().unwrap();
            assert_eq!(first_key, 1);

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
        fn set_value_does_not_invoke_destructor() {
            use alloc::rc::Rc;
            use core::cell::RefCell;

            let calls: Rc<RefCell<usize>> = Rc::new(RefCell::new(0));
            let sink = calls.clone();
            let mut tree = AvlTree::new().with_destructor(Box::new(move |_: i32, _: i32| {
                *sink.borrow_mut() += 1;
            }));
            tree.insert(1, 10, false).unwrap();
            let mut cursor = tree.cursor();
            cursor.search(&1);
            let old = cursor.set_value(20);
            assert_eq!(old, Some(10));
            assert_eq!(*calls.borrow(), 0);
            assert_eq!(tree.search(&1), Some(&20));
        }

        #[test]
        fn nextn_stops_at_end_of_range() {
            let mut tree: AvlTree<i32, i32> = (1..=3).map(|k| (k, k)).collect();
            let mut cursor = tree.cursor();
            cursor.first();
            assert!(!cursor.nextn(5));
            assert!(!cursor.valid());
        }

        #[test]
        fn search_missing_key_invalidates() {
            let mut tree: AvlTree<i32, i32> = (1..=3).map(|k| (k, k)).collect();
            let mut cursor = tree.cursor();
            assert!(!cursor.search(&42));
            assert!(!cursor.valid());
        }
    }
}
