//! Error type for ordered-container operations.
//!
//! Per the error taxonomy of the container contract: allocation failure is
//! the only condition surfaced as an `Err`. "Already present", "not
//! present", and "invalid iterator" are modeled as distinct *successful*
//! outcomes (see [`crate::outcomes`]), not errors — they carry no `Err` path
//! because they leave the container in a well-defined, unmutated state.

use thiserror::Error;

/// The error type for `ordcon` container operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrdConError {
    /// The backing arena could not grow to hold another node.
    ///
    /// Surfaced on every allocating entry point (`insert`, `probe`). Rust's
    /// global allocator normally aborts on an out-of-memory condition rather
    /// than returning a recoverable error; this variant is produced only by
    /// an explicit `Vec::try_reserve` preflight on the node arena, so in
    /// practice it is reachable but rare.
    #[error("allocation failed while growing the container's node arena")]
    AllocFailed,
}

/// A specialized `Result` type for `ordcon` container operations.
pub type Result<T> = core::result::Result<T, OrdConError>;
