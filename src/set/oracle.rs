//! Promotion oracles for [`LeveledSkipSet`](super::LeveledSkipSet).
//!
//! After an element is spliced into lane 0, the skip list asks its oracle,
//! once per lane, whether the element should also occupy the next lane up.
//! The default oracle flips a fair coin; the deterministic ones exist so that
//! the shape of a skip list can be pinned down in tests.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Decides whether an element placed on one lane also occupies the next.
///
/// # Examples
///
/// ```rust
/// use polyset::set::{PromotionOracle, ScriptedOracle};
///
/// let mut oracle = ScriptedOracle::new(vec![true, false]);
/// assert!(oracle.should_promote(&1));
/// assert!(!oracle.should_promote(&1));
/// assert!(oracle.should_promote(&1)); // the script repeats
/// ```
pub trait PromotionOracle<T: ?Sized> {
    /// Returns `true` if `element` should also occupy the next lane up.
    fn should_promote(&mut self, element: &T) -> bool;

    /// Returns an independent oracle for a copy of the skip list.
    ///
    /// Randomized oracles must not share state with the fork.
    #[must_use]
    fn fork(&self) -> Self
    where
        Self: Sized;
}

// =============================================================================
// CoinFlipOracle
// =============================================================================

/// Promotes with probability 1/2, independently for every decision.
#[derive(Debug)]
pub struct CoinFlipOracle {
    generator: StdRng,
}

impl CoinFlipOracle {
    /// Creates an oracle seeded from the operating system's entropy source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generator: StdRng::from_entropy(),
        }
    }

    /// Creates an oracle whose decision sequence is fixed by `seed`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polyset::set::{CoinFlipOracle, PromotionOracle};
    ///
    /// let mut first = CoinFlipOracle::seeded(7);
    /// let mut second = CoinFlipOracle::seeded(7);
    /// for _ in 0..32 {
    ///     assert_eq!(first.should_promote(&()), second.should_promote(&()));
    /// }
    /// ```
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            generator: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for CoinFlipOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> PromotionOracle<T> for CoinFlipOracle {
    fn should_promote(&mut self, _element: &T) -> bool {
        self.generator.gen_bool(0.5)
    }

    /// Seeds the fork from the next value this oracle would draw, without
    /// drawing it. Forks of a seeded oracle are reproducible; the fork and
    /// the original keep separate generators.
    fn fork(&self) -> Self {
        Self::seeded(self.generator.clone().next_u64())
    }
}

// =============================================================================
// ConstantOracle
// =============================================================================

/// Gives the same answer every time.
///
/// `ConstantOracle(false)` keeps every element on lane 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantOracle(pub bool);

impl<T: ?Sized> PromotionOracle<T> for ConstantOracle {
    fn should_promote(&mut self, _element: &T) -> bool {
        self.0
    }

    fn fork(&self) -> Self {
        *self
    }
}

// =============================================================================
// ScriptedOracle
// =============================================================================

/// Replays a fixed sequence of decisions, starting over when it runs out.
///
/// An empty script always answers `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedOracle {
    decisions: Vec<bool>,
    position: usize,
}

impl ScriptedOracle {
    /// Creates an oracle that answers with `decisions` in order.
    #[must_use]
    pub const fn new(decisions: Vec<bool>) -> Self {
        Self {
            decisions,
            position: 0,
        }
    }
}

impl<T: ?Sized> PromotionOracle<T> for ScriptedOracle {
    fn should_promote(&mut self, _element: &T) -> bool {
        let Some(&decision) = self.decisions.get(self.position) else {
            return false;
        };
        self.position = (self.position + 1) % self.decisions.len();
        decision
    }

    fn fork(&self) -> Self {
        self.clone()
    }
}
