//! # ordcon-containers
//!
//! Two ordered associative containers over caller-ordered opaque keys:
//!
//! - [`balanced`] — a height-balanced (AVL) binary search tree with explicit
//!   per-node balance factors, parent back-links, and rotation-driven
//!   rebalancing on insert and delete.
//! - [`skiplist`] — a probabilistic multi-level linked list with a bounded
//!   tower height and the update-vector search/splice protocol.
//!
//! Both present the same contract — `insert`, `probe`, `search`, `remove`,
//! `clear`, `traverse`, `count`, ordered bidirectional cursors — and differ
//! only in their internal structure. See [`ordcon_core::OrderedMap`] for the
//! capability set shared across both.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod balanced;
pub mod skiplist;

pub use ordcon_core::{
    Comparator, Container, Destructor, InsertOutcome, OrdConError, OrderedMap, ProbeOutcome,
    Result, RemoveOutcome,
};
