//! # ordcon-core
//!
//! Shared boundary types for `ordcon`'s ordered associative containers: the
//! comparator/destructor-hook layer, the common outcome types returned by
//! `insert`/`probe`/`remove`, and the traits that let `balanced` and
//! `skiplist` be used interchangeably through [`OrderedMap`].
//!
//! This crate carries no container logic of its own — it is the "external
//! collaborator" layer the containers are built against, the way `dsa-core`
//! underpins `dsa-data-structures`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod comparator;
pub mod error;
pub mod outcomes;
pub mod traits;

pub use comparator::{ord_comparator, Comparator, Destructor};
pub use error::{OrdConError, Result};
pub use outcomes::{InsertOutcome, ProbeOutcome, RemoveOutcome};
pub use traits::{Container, OrderedMap};
