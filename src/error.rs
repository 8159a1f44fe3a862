//! Error types for the map's fallible operations.

use thiserror::Error;

/// Errors returned by [`IdleMap`](crate::IdleMap) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// A caller tried to store an absent value. The map only holds present
    /// values; the offending operation leaves it unmodified.
    #[error("absent values cannot be stored")]
    AbsentValue,

    /// The requested enumeration is deliberately not provided. Iterate
    /// `keys()` and fetch each value with `get()` instead.
    #[error("{0} enumeration is not supported, iterate keys() and get() each value")]
    Unsupported(&'static str),
}
