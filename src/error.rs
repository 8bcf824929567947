//! Error types shared by every set backing.
//!
//! The only failures a set can report are allocation failures while growing
//! one of its internal arrays, and arithmetic overflow when computing a new
//! capacity. Both surface synchronously from `add` or from the fallible copy
//! operations (`try_clone`, `try_clone_from`); neither leaves the set in a
//! partially modified state.

use std::collections::TryReserveError;

/// Represents a failure while growing the internal storage of a set.
///
/// # Examples
///
/// ```rust
/// use polyset::SetError;
///
/// let error = SetError::CapacityOverflow {
///     structure: "ChainedHashSet buckets",
///     capacity: usize::MAX,
/// };
/// assert!(format!("{error}").contains("ChainedHashSet buckets"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetError {
    /// The allocator refused to provide room for more slots.
    #[error("{structure}: failed to allocate room for {requested} more slots")]
    AllocationFailed {
        /// The internal structure being grown.
        structure: &'static str,
        /// The number of additional slots that were requested.
        requested: usize,
    },

    /// The next capacity in the growth sequence does not fit in `usize`.
    #[error("{structure}: capacity {capacity} cannot grow any further")]
    CapacityOverflow {
        /// The internal structure being grown.
        structure: &'static str,
        /// The capacity that could not be grown.
        capacity: usize,
    },
}

impl SetError {
    pub(crate) const fn allocation(structure: &'static str, requested: usize) -> Self {
        Self::AllocationFailed {
            structure,
            requested,
        }
    }
}

/// Reserves room for `additional` more items, mapping allocator refusal to
/// [`SetError::AllocationFailed`].
pub(crate) fn reserve<T>(
    storage: &mut Vec<T>,
    additional: usize,
    structure: &'static str,
) -> Result<(), SetError> {
    storage
        .try_reserve(additional)
        .map_err(|_: TryReserveError| SetError::allocation(structure, additional))
}

/// Like [`reserve`], but asks for exactly `additional` slots.
pub(crate) fn reserve_exact<T>(
    storage: &mut Vec<T>,
    additional: usize,
    structure: &'static str,
) -> Result<(), SetError> {
    storage
        .try_reserve_exact(additional)
        .map_err(|_: TryReserveError| SetError::allocation(structure, additional))
}

/// Computes `capacity * 2 + 1`, the growth rule shared by the hash buckets
/// and the skip list lane array.
pub(crate) fn grown_capacity(capacity: usize, structure: &'static str) -> Result<usize, SetError> {
    capacity
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(1))
        .ok_or(SetError::CapacityOverflow {
            structure,
            capacity,
        })
}
