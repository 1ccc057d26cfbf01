//! The comparator/destructor-hook boundary layer.
//!
//! Both `balanced::AvlTree` and `skiplist::SkipList` store a [`Comparator`]
//! and an optional [`Destructor`] and never interpret keys or values beyond
//! passing them to these two callbacks. This mirrors the source contract's
//! "comparator returns negative/zero/positive, default is pointer-value
//! comparison" — the safe-Rust substitute for comparing raw pointer
//! addresses is simply `K: Ord`, which [`ord_comparator`] adapts to a
//! `Comparator<K>`.

use alloc::boxed::Box;
use core::cmp::Ordering;

/// A total order over keys, called on every descent/search.
///
/// Must be deterministic and stable for the lifetime of any container using
/// it — the containers assume this and do not re-validate it.
pub type Comparator<K> = Box<dyn Fn(&K, &K) -> Ordering>;

/// A cleanup hook invoked exactly once on every `(key, value)` pair that
/// leaves a container, whether by `remove`, by `insert` overwriting an
/// existing key, or by `clear`/`drop`.
pub type Destructor<K, V> = Box<dyn FnMut(K, V)>;

/// Builds the default comparator for a key type that already has a natural
/// total order.
///
/// This is the "pointer value comparison" fallback of the source contract,
/// expressed the only way safe Rust can: through `Ord`.
#[must_use]
pub fn ord_comparator<K: Ord + 'static>() -> Comparator<K> {
    Box::new(|a: &K, b: &K| a.cmp(b))
}
