//! # polyset
//!
//! One set capability, three interchangeable backings.
//!
//! ## Overview
//!
//! Every container in this crate implements [`Set`](set::Set): insert an
//! element if it is absent, test membership, report the size. What differs
//! is the algorithm underneath:
//!
//! - **[`BalancedTreeSet`](set::BalancedTreeSet)**: AVL tree with rotation
//!   rebalancing and pre-, in- and post-order traversals
//! - **[`ChainedHashSet`](set::ChainedHashSet)**: separately-chained hash
//!   table driven by a caller-supplied hash function
//! - **[`LeveledSkipSet`](set::LeveledSkipSet)**: skip list with a pluggable
//!   [`PromotionOracle`](set::PromotionOracle)
//!
//! Insertion never aborts on allocation failure: it returns
//! [`SetError`] and leaves the set as it was.
//!
//! ## Feature Flags
//!
//! - `serde`: serialize every backing as a sequence
//! - `tracing`: emit rotation, rehash and lane events through `tracing`
//! - `fxhash`: `ChainedHashSet::with_fx_hasher`
//! - `ahash`: `ChainedHashSet::with_ahasher`
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use polyset::prelude::*;
//!
//! let mut set = BalancedTreeSet::new();
//! for word in ["pear", "apple", "fig", "apple"] {
//!     set.add(word).unwrap();
//! }
//! assert_eq!(set.len(), 3);
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec!["apple", "fig", "pear"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use polyset::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::SetError;
    pub use crate::set::*;
}

pub mod error;
pub mod set;

mod tracing_helpers;

pub use error::SetError;
