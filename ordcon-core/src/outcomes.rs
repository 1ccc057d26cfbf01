//! Outcome types for the common container contract.
//!
//! `already_present`, `not_present`, and `existed`/`inserted` are not error
//! conditions — they are distinct, expected results of an operation that
//! left the container in a well-defined state. Modeling them as enum
//! variants (rather than `bool` or `Option`) keeps call sites self-describing
//! and matches the source contract's three-way `insert` outcome.

/// Result of [`crate::traits::OrderedMap::insert`] / the containers'
/// inherent `insert`.
#[derive(Debug)]
pub enum InsertOutcome<V> {
    /// No prior entry existed for the key; a new node was created.
    Inserted,
    /// A prior entry existed and `overwrite` was requested, so the key and
    /// value were replaced ("inserted-equivalent" in the source contract).
    ///
    /// Carries the displaced value when no destructor hook is configured
    /// (the hook, if present, already consumed it — see
    /// [`crate::comparator::Destructor`]).
    Replaced(Option<V>),
    /// A prior entry existed and `overwrite` was not requested; the
    /// container is unchanged.
    AlreadyPresent,
}

/// Result of the containers' `probe` — the "get-or-insert" primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A matching node already existed; its stored value was left in place.
    Existed,
    /// No matching node existed; the supplied value was inserted.
    Inserted,
}

/// Result of [`crate::traits::OrderedMap::remove`] / the containers'
/// inherent `remove`.
#[derive(Debug)]
pub enum RemoveOutcome<V> {
    /// The key was present and its node was removed.
    ///
    /// Carries the removed value when no destructor hook is configured; the
    /// hook, if present, already consumed it.
    Removed(Option<V>),
    /// The key was not present; the container is unchanged.
    NotPresent,
}

impl<V> InsertOutcome<V> {
    /// `true` for both `Inserted` and `Replaced` — the key is now resident.
    #[must_use]
    pub fn is_resident(&self) -> bool {
        !matches!(self, InsertOutcome::AlreadyPresent)
    }
}

impl<V> RemoveOutcome<V> {
    /// `true` if a node was actually removed.
    #[must_use]
    pub fn was_removed(&self) -> bool {
        matches!(self, RemoveOutcome::Removed(_))
    }
}
