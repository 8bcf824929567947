//! The set capability and its three backings.
//!
//! Every backing realizes the same contract, [`Set`], with a different
//! internal algorithm:
//!
//! - [`BalancedTreeSet`]: AVL tree with rotation rebalancing (balancing can
//!   be switched off at construction to get a plain binary search tree)
//! - [`ChainedHashSet`]: separately-chained hash table with an injected hash
//!   function, growing to `capacity * 2 + 1` at load factor 0.8
//! - [`LeveledSkipSet`]: skip list whose promotions are decided by an
//!   injectable [`PromotionOracle`]
//!
//! [`BackedSet`] is the closed union of the three, for callers that pick a
//! backing at runtime but want static dispatch.
//!
//! # Examples
//!
//! ```rust
//! use polyset::set::{BalancedTreeSet, ChainedHashSet, LeveledSkipSet, Set};
//!
//! fn fill(set: &mut dyn Set<i32>) {
//!     for element in [5, 3, 8, 3] {
//!         set.add(element).unwrap();
//!     }
//! }
//!
//! let mut tree = BalancedTreeSet::new();
//! let mut table = ChainedHashSet::new(|element: &i32| element.unsigned_abs().into());
//! let mut lanes = LeveledSkipSet::new();
//!
//! for set in [&mut tree as &mut dyn Set<i32>, &mut table, &mut lanes] {
//!     fill(set);
//!     assert_eq!(set.size(), 3);
//!     assert!(set.contains(&8));
//!     assert!(!set.contains(&4));
//! }
//! ```

mod balanced_tree;
mod chained_hash;
mod leveled_skip;
mod oracle;

pub use balanced_tree::BalancedTreeIterator;
pub use balanced_tree::BalancedTreeSet;
pub use chained_hash::ChainedHashIterator;
pub use chained_hash::ChainedHashSet;
pub use chained_hash::DEFAULT_CAPACITY;
pub use chained_hash::HashFunction;
pub use leveled_skip::INITIAL_LANE_CAPACITY;
pub use leveled_skip::LaneKey;
pub use leveled_skip::LeveledSkipIterator;
pub use leveled_skip::LeveledSkipSet;
pub use leveled_skip::MAX_LEVELS;
pub use oracle::CoinFlipOracle;
pub use oracle::ConstantOracle;
pub use oracle::PromotionOracle;
pub use oracle::ScriptedOracle;

use crate::SetError;

/// Index of a node inside one of the arena-backed node graphs.
pub(crate) type NodeIndex = usize;

// =============================================================================
// Set Capability
// =============================================================================

/// A container of unique elements supporting insertion and membership tests.
///
/// The trait is object safe: a caller can hold `&dyn Set<T>` without knowing
/// which backing is behind it.
///
/// # Examples
///
/// ```rust
/// use polyset::set::{LeveledSkipSet, Set};
///
/// let mut set: Box<dyn Set<&str>> = Box::new(LeveledSkipSet::new());
/// assert_eq!(set.add("tea"), Ok(true));
/// assert_eq!(set.add("tea"), Ok(false));
/// assert!(set.contains(&"tea"));
/// assert_eq!(set.size(), 1);
/// ```
pub trait Set<T> {
    /// Inserts `element` if it is absent.
    ///
    /// Returns `Ok(true)` when the element was inserted and `Ok(false)` when
    /// it was already present. On `Err` the set is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SetError`] when internal storage could not be grown.
    fn add(&mut self, element: T) -> Result<bool, SetError>;

    /// Returns `true` if `element` is in the set.
    fn contains(&self, element: &T) -> bool;

    /// Returns the number of elements in the set.
    fn size(&self) -> usize;

    /// Returns `true` if the set holds no elements.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Advertises whether this backing is complete.
    ///
    /// This is a capability flag, not a behavior switch.
    fn is_implemented(&self) -> bool {
        true
    }
}

// =============================================================================
// BackedSet Definition
// =============================================================================

/// One of the three backings, chosen at construction time.
///
/// `O` is the promotion oracle of the skip list variant.
///
/// # Examples
///
/// ```rust
/// use polyset::set::{BackedSet, BalancedTreeSet, ConstantOracle, LeveledSkipSet, Set};
///
/// let mut set: BackedSet<i32> = BackedSet::from(BalancedTreeSet::new());
/// set.add(7).unwrap();
/// assert!(set.contains(&7));
/// assert_eq!(set.variant_name(), "BalancedTreeSet");
///
/// let flat = BackedSet::from(LeveledSkipSet::<i32, _>::with_oracle(ConstantOracle(false)));
/// assert_eq!(flat.variant_name(), "LeveledSkipSet");
/// ```
#[derive(Debug)]
pub enum BackedSet<T, O = CoinFlipOracle> {
    /// AVL tree (or plain binary search tree when balancing is off).
    Balanced(BalancedTreeSet<T>),
    /// Separately-chained hash table.
    Chained(ChainedHashSet<T>),
    /// Skip list promoting through `O`.
    Leveled(LeveledSkipSet<T, O>),
}

impl<T, O> BackedSet<T, O> {
    /// Returns the name of the active backing.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Balanced(_) => "BalancedTreeSet",
            Self::Chained(_) => "ChainedHashSet",
            Self::Leveled(_) => "LeveledSkipSet",
        }
    }
}

impl<T: Ord + Eq + Clone, O: PromotionOracle<T>> Set<T> for BackedSet<T, O> {
    fn add(&mut self, element: T) -> Result<bool, SetError> {
        match self {
            Self::Balanced(set) => set.add(element),
            Self::Chained(set) => set.add(element),
            Self::Leveled(set) => set.add(element),
        }
    }

    fn contains(&self, element: &T) -> bool {
        match self {
            Self::Balanced(set) => set.contains(element),
            Self::Chained(set) => set.contains(element),
            Self::Leveled(set) => set.contains(element),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Balanced(set) => set.len(),
            Self::Chained(set) => set.len(),
            Self::Leveled(set) => set.len(),
        }
    }
}

impl<T: Clone, O: PromotionOracle<T>> Clone for BackedSet<T, O> {
    fn clone(&self) -> Self {
        match self {
            Self::Balanced(set) => Self::Balanced(set.clone()),
            Self::Chained(set) => Self::Chained(set.clone()),
            Self::Leveled(set) => Self::Leveled(set.clone()),
        }
    }
}

impl<T, O> From<BalancedTreeSet<T>> for BackedSet<T, O> {
    fn from(set: BalancedTreeSet<T>) -> Self {
        Self::Balanced(set)
    }
}

impl<T, O> From<ChainedHashSet<T>> for BackedSet<T, O> {
    fn from(set: ChainedHashSet<T>) -> Self {
        Self::Chained(set)
    }
}

impl<T, O> From<LeveledSkipSet<T, O>> for BackedSet<T, O> {
    fn from(set: LeveledSkipSet<T, O>) -> Self {
        Self::Leveled(set)
    }
}

// =============================================================================
// Tests
// =============================================================================
