//! Skip list set.
//!
//! This module provides [`LeveledSkipSet`], an ordered set stored as a stack
//! of linked lanes. Lane 0 holds every element; each lane above holds a
//! randomly thinned subset of the lane below it. Every lane is bounded by a
//! negative-infinity head and a positive-infinity tail, so searches never
//! special-case the ends.
//!
//! # Overview
//!
//! - O(log n) expected `add` and `contains`
//! - Whether a new element climbs one more lane is decided by a
//!   [`PromotionOracle`]; the default flips a fair coin.
//! - Lanes are created lazily, the first time an element is promoted past the
//!   current top lane.
//!
//! # Examples
//!
//! ```rust
//! use polyset::set::{ConstantOracle, LeveledSkipSet};
//!
//! let mut set = LeveledSkipSet::with_oracle(ConstantOracle(false));
//! for element in [30, 10, 20] {
//!     set.add(element).unwrap();
//! }
//! assert_eq!(set.level_count(), 1);
//! assert_eq!(set.elements_on_level(0), 3);
//!
//! let elements: Vec<&i32> = set.iter().collect();
//! assert_eq!(elements, vec![&10, &20, &30]);
//! ```

use smallvec::SmallVec;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use super::oracle::{CoinFlipOracle, PromotionOracle};
use super::{NodeIndex, Set};
use crate::SetError;
use crate::error::{grown_capacity, reserve, reserve_exact};
use crate::tracing_helpers::{debug_log, warn_log};

/// The lane capacity of a fresh skip list.
pub const INITIAL_LANE_CAPACITY: usize = 10;

/// No element is promoted past this many lanes, whatever the oracle says.
pub const MAX_LEVELS: usize = 64;

const NODES: &str = "LeveledSkipSet nodes";
const LANES: &str = "LeveledSkipSet lanes";

const INLINE_LANES: usize = 16;

// =============================================================================
// LaneKey Definition
// =============================================================================

/// A key on a lane: an element or one of the two sentinels.
///
/// Variants are declared in key order, so the derived ordering is the lane
/// ordering: negative infinity is below everything but itself, positive
/// infinity is above everything but itself, and normal keys compare by
/// element.
///
/// # Examples
///
/// ```rust
/// use polyset::set::LaneKey;
///
/// assert!(LaneKey::NegativeInfinity < LaneKey::Normal(i32::MIN));
/// assert!(LaneKey::Normal(i32::MAX) < LaneKey::PositiveInfinity);
/// assert!(LaneKey::Normal(1) < LaneKey::Normal(2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LaneKey<T> {
    /// Head sentinel of every lane.
    NegativeInfinity,
    /// An element of the set.
    Normal(T),
    /// Tail sentinel of every lane.
    PositiveInfinity,
}

impl<T> LaneKey<T> {
    /// Returns the element, or `None` for a sentinel.
    #[must_use]
    pub const fn element(&self) -> Option<&T> {
        match self {
            Self::Normal(element) => Some(element),
            Self::NegativeInfinity | Self::PositiveInfinity => None,
        }
    }

    /// Compares this key against a bare element.
    #[must_use]
    pub fn cmp_element<Q>(&self, element: &Q) -> Ordering
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Self::NegativeInfinity => Ordering::Less,
            Self::Normal(key) => key.borrow().cmp(element),
            Self::PositiveInfinity => Ordering::Greater,
        }
    }
}

// =============================================================================
// Node Definition
// =============================================================================

#[derive(Clone, Debug)]
struct LaneNode<T> {
    key: LaneKey<T>,
    next: Option<NodeIndex>,
    /// The same key one lane down. Structural only: the node is owned by the
    /// lane below.
    below: Option<NodeIndex>,
}

impl<T> LaneNode<T> {
    const fn sentinel(key: LaneKey<T>, next: Option<NodeIndex>, below: Option<NodeIndex>) -> Self {
        Self { key, next, below }
    }
}

/// Returns the lane capacity after growing the lane count from `lanes` to
/// `target`, growing `capacity * 2 + 1` each time `lanes / capacity`
/// reaches 0.8.
fn planned_lane_capacity(lanes: usize, target: usize, capacity: usize) -> Result<usize, SetError> {
    let mut capacity = capacity;
    for count in (lanes + 1)..=target {
        if count.saturating_mul(5) >= capacity.saturating_mul(4) {
            capacity = grown_capacity(capacity, LANES)?;
        }
    }
    Ok(capacity)
}

// =============================================================================
// LeveledSkipSet Definition
// =============================================================================

/// An ordered set backed by a skip list.
///
/// # Time Complexity
///
/// | Operation            | Complexity           |
/// |----------------------|----------------------|
/// | `add`                | O(log n) expected    |
/// | `contains`           | O(log n) expected    |
/// | `len`                | O(1)                 |
/// | `level_count`        | O(1)                 |
/// | `elements_on_level`  | O(lane length)       |
///
/// # Examples
///
/// ```rust
/// use polyset::set::{LeveledSkipSet, ScriptedOracle};
///
/// // The first element climbs two lanes, everything after stays on lane 0.
/// let mut set = LeveledSkipSet::with_oracle(ScriptedOracle::new(vec![true, true, false]));
/// set.add(50).unwrap();
/// assert_eq!(set.level_count(), 3);
/// assert!(set.is_element_on_level(&50, 2));
/// ```
pub struct LeveledSkipSet<T, O = CoinFlipOracle> {
    nodes: Vec<LaneNode<T>>,
    /// Head sentinel of every lane, lane 0 first. Never empty.
    lanes: Vec<NodeIndex>,
    lane_capacity: usize,
    len: usize,
    oracle: O,
}

impl<T> LeveledSkipSet<T, CoinFlipOracle> {
    /// Creates an empty set promoting by fair coin flip.
    #[must_use]
    pub fn new() -> Self {
        Self::with_oracle(CoinFlipOracle::new())
    }
}

impl<T, O> LeveledSkipSet<T, O> {
    /// Creates an empty set that asks `oracle` about every promotion.
    #[must_use]
    pub fn with_oracle(oracle: O) -> Self {
        let mut lanes = Vec::with_capacity(INITIAL_LANE_CAPACITY);
        lanes.push(0);
        Self {
            nodes: vec![
                LaneNode::sentinel(LaneKey::NegativeInfinity, Some(1), None),
                LaneNode::sentinel(LaneKey::PositiveInfinity, None, None),
            ],
            lanes,
            lane_capacity: INITIAL_LANE_CAPACITY,
            len: 0,
            oracle,
        }
    }

    /// Returns the number of elements in the set.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of lanes; an empty skip list has one.
    #[inline]
    #[must_use]
    pub const fn level_count(&self) -> usize {
        self.lanes.len()
    }

    /// Returns how many lanes fit before the lane array grows again.
    #[inline]
    #[must_use]
    pub const fn lane_capacity(&self) -> usize {
        self.lane_capacity
    }

    /// Returns the promotion oracle.
    #[must_use]
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Returns the number of elements on lane `level`, sentinels excluded,
    /// or 0 if the lane does not exist.
    #[must_use]
    pub fn elements_on_level(&self, level: usize) -> usize {
        self.lane(level)
            .filter(|node| node.key.element().is_some())
            .count()
    }

    /// Returns `true` if `element` is on lane `level`, or `false` if the lane
    /// does not exist.
    #[must_use]
    pub fn is_element_on_level<Q>(&self, element: &Q, level: usize) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lane(level)
            .map(|node| node.key.cmp_element(element))
            .find(|ordering| *ordering != Ordering::Less)
            == Some(Ordering::Equal)
    }

    /// Returns `true` if the set contains `element`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polyset::set::LeveledSkipSet;
    ///
    /// let mut set = LeveledSkipSet::new();
    /// set.add("walnut".to_string()).unwrap();
    /// assert!(set.contains("walnut"));
    /// assert!(!set.contains("pecan"));
    /// ```
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.top_head();
        loop {
            while let Some(next) = self.nodes[current].next {
                match self.nodes[next].key.cmp_element(element) {
                    Ordering::Less => current = next,
                    Ordering::Equal => return true,
                    Ordering::Greater => break,
                }
            }
            match self.nodes[current].below {
                Some(below) => current = below,
                None => return false,
            }
        }
    }

    /// Returns an iterator over the elements in ascending order.
    #[must_use]
    pub fn iter(&self) -> LeveledSkipIterator<'_, T> {
        LeveledSkipIterator {
            nodes: &self.nodes,
            cursor: self.nodes[self.lanes[0]].next,
            remaining: self.len,
        }
    }

    /// Builds an independent copy with a forked oracle. `self` is never
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] if the node arena or the lane
    /// array could not be allocated.
    pub fn try_clone(&self) -> Result<Self, SetError>
    where
        T: Clone,
        O: PromotionOracle<T>,
    {
        let mut nodes = Vec::new();
        reserve_exact(&mut nodes, self.nodes.len(), NODES)?;
        nodes.extend(self.nodes.iter().cloned());
        let mut lanes = Vec::new();
        reserve_exact(&mut lanes, self.lane_capacity, LANES)?;
        lanes.extend_from_slice(&self.lanes);
        Ok(Self {
            nodes,
            lanes,
            lane_capacity: self.lane_capacity,
            len: self.len,
            oracle: self.oracle.fork(),
        })
    }

    /// Replaces `self` with a copy of `source`, oracle forked.
    ///
    /// The copy is built completely before `self` is modified; on error
    /// `self` keeps its previous contents.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] if the copy could not be built.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<(), SetError>
    where
        T: Clone,
        O: PromotionOracle<T>,
    {
        *self = source.try_clone()?;
        Ok(())
    }

    fn top_head(&self) -> NodeIndex {
        self.lanes[self.lanes.len() - 1]
    }

    /// Walks lane `level` from head to tail; empty if the lane does not exist.
    fn lane(&self, level: usize) -> impl Iterator<Item = &LaneNode<T>> + '_ {
        let mut cursor = self.lanes.get(level).copied();
        std::iter::from_fn(move || {
            let node = &self.nodes[cursor?];
            cursor = node.next;
            Some(node)
        })
    }

    /// Adds an empty lane on top whose sentinels sit above the current top
    /// lane's sentinels, and returns its head. Room for the two sentinels and
    /// the lane slot has already been reserved.
    fn materialize_lane(&mut self) -> NodeIndex {
        let below_head = self.top_head();
        let mut below_tail = below_head;
        while let Some(next) = self.nodes[below_tail].next {
            below_tail = next;
        }

        let head = self.nodes.len();
        self.nodes.push(LaneNode::sentinel(
            LaneKey::NegativeInfinity,
            Some(head + 1),
            Some(below_head),
        ));
        self.nodes.push(LaneNode::sentinel(
            LaneKey::PositiveInfinity,
            None,
            Some(below_tail),
        ));
        self.lanes.push(head);
        debug_log!(level = self.lanes.len() - 1, "LeveledSkipSet: lane materialized");
        head
    }

    /// Links a node for `element` into lane `level` right after
    /// `predecessor`, creating the lane first if it is new.
    fn splice(
        &mut self,
        level: usize,
        predecessor: Option<NodeIndex>,
        element: T,
        below: Option<NodeIndex>,
    ) -> NodeIndex {
        let predecessor = match predecessor {
            Some(predecessor) => predecessor,
            None if level < self.lanes.len() => self.lanes[level],
            None => self.materialize_lane(),
        };
        let node = self.nodes.len();
        self.nodes.push(LaneNode {
            key: LaneKey::Normal(element),
            next: self.nodes[predecessor].next,
            below,
        });
        self.nodes[predecessor].next = Some(node);
        node
    }
}

impl<T: Ord + Clone, O: PromotionOracle<T>> LeveledSkipSet<T, O> {
    /// Inserts `element` if it is absent, then promotes it lane by lane for
    /// as long as the oracle agrees.
    ///
    /// The oracle is consulted, and every node and lane slot the insertion
    /// needs is reserved, before any link is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] or
    /// [`SetError::CapacityOverflow`] if the node arena or the lane array
    /// could not grow. The set is unchanged in that case.
    pub fn add(&mut self, element: T) -> Result<bool, SetError> {
        // Predecessor of the insertion point on each lane, top lane first.
        let mut predecessors: SmallVec<[NodeIndex; INLINE_LANES]> = SmallVec::new();
        let mut current = self.top_head();
        loop {
            while let Some(next) = self.nodes[current].next {
                match self.nodes[next].key.cmp_element(&element) {
                    Ordering::Less => current = next,
                    Ordering::Equal => return Ok(false),
                    Ordering::Greater => break,
                }
            }
            predecessors.push(current);
            match self.nodes[current].below {
                Some(below) => current = below,
                None => break,
            }
        }
        predecessors.reverse();

        let mut top_level = 0;
        while self.oracle.should_promote(&element) {
            if top_level + 1 >= MAX_LEVELS {
                warn_log!(max_levels = MAX_LEVELS, "LeveledSkipSet: promotion ceiling reached");
                break;
            }
            top_level += 1;
        }

        let new_lanes = (top_level + 1).saturating_sub(self.lanes.len());
        reserve(&mut self.nodes, top_level + 1 + 2 * new_lanes, NODES)?;
        let lane_capacity = planned_lane_capacity(
            self.lanes.len(),
            self.lanes.len() + new_lanes,
            self.lane_capacity,
        )?;
        let additional_lanes = lane_capacity - self.lanes.len();
        reserve_exact(&mut self.lanes, additional_lanes, LANES)?;

        let mut below = None;
        for level in 0..top_level {
            let predecessor = predecessors.get(level).copied();
            below = Some(self.splice(level, predecessor, element.clone(), below));
        }
        let predecessor = predecessors.get(top_level).copied();
        self.splice(top_level, predecessor, element, below);

        if lane_capacity != self.lane_capacity {
            debug_log!(
                old_capacity = self.lane_capacity,
                new_capacity = lane_capacity,
                "LeveledSkipSet: lane array grown"
            );
            self.lane_capacity = lane_capacity;
        }
        self.len += 1;
        Ok(true)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An ascending iterator over the elements of a [`LeveledSkipSet`].
pub struct LeveledSkipIterator<'a, T> {
    nodes: &'a [LaneNode<T>],
    cursor: Option<NodeIndex>,
    remaining: usize,
}

impl<'a, T> Iterator for LeveledSkipIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.nodes[self.cursor?];
        let element = node.key.element()?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for LeveledSkipIterator<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<'a, T, O> IntoIterator for &'a LeveledSkipSet<T, O> {
    type Item = &'a T;
    type IntoIter = LeveledSkipIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T: Clone, O: PromotionOracle<T>> Clone for LeveledSkipSet<T, O> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            lanes: self.lanes.clone(),
            lane_capacity: self.lane_capacity,
            len: self.len,
            oracle: self.oracle.fork(),
        }
    }
}

impl<T> Default for LeveledSkipSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, O> fmt::Debug for LeveledSkipSet<T, O> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord + Clone, O: PromotionOracle<T>> Set<T> for LeveledSkipSet<T, O> {
    fn add(&mut self, element: T) -> Result<bool, SetError> {
        Self::add(self, element)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn size(&self) -> usize {
        self.len
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize, O> serde::Serialize for LeveledSkipSet<T, O> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
struct LeveledSkipSetVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for LeveledSkipSetVisitor<T>
where
    T: serde::Deserialize<'de> + Ord + Clone,
{
    type Value = LeveledSkipSet<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut set = LeveledSkipSet::new();
        while let Some(element) = access.next_element()? {
            set.add(element).map_err(serde::de::Error::custom)?;
        }
        Ok(set)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for LeveledSkipSet<T>
where
    T: serde::Deserialize<'de> + Ord + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(LeveledSkipSetVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

static_assertions::assert_impl_all!(LeveledSkipSet<String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::{ConstantOracle, ScriptedOracle};
    use proptest::prelude::*;
    use rstest::rstest;

    fn lane_elements<O>(set: &LeveledSkipSet<i32, O>, level: usize) -> Vec<i32> {
        set.lane(level)
            .filter_map(|node| node.key.element().copied())
            .collect()
    }

    /// Checks sentinels, ordering, `below` links and the subset property on
    /// every lane.
    fn audit<O>(set: &LeveledSkipSet<i32, O>) {
        assert_eq!(lane_elements(set, 0).len(), set.len());
        for level in 0..set.level_count() {
            let nodes: Vec<&LaneNode<i32>> = set.lane(level).collect();
            assert_eq!(nodes.first().map(|node| &node.key), Some(&LaneKey::NegativeInfinity));
            assert_eq!(nodes.last().map(|node| &node.key), Some(&LaneKey::PositiveInfinity));
            assert!(nodes.windows(2).all(|pair| pair[0].key < pair[1].key));

            for node in nodes {
                match node.below {
                    None => assert_eq!(level, 0),
                    Some(below) => assert_eq!(set.nodes[below].key, node.key),
                }
                if let Some(element) = node.key.element() {
                    for lower in 0..level {
                        assert!(set.is_element_on_level(element, lower));
                    }
                }
            }
        }
    }

    // =========================================================================
    // LaneKey Ordering
    // =========================================================================

    #[rstest]
    #[case(LaneKey::NegativeInfinity, LaneKey::NegativeInfinity, Ordering::Equal)]
    #[case(LaneKey::NegativeInfinity, LaneKey::Normal(i32::MIN), Ordering::Less)]
    #[case(LaneKey::NegativeInfinity, LaneKey::PositiveInfinity, Ordering::Less)]
    #[case(LaneKey::Normal(3), LaneKey::Normal(3), Ordering::Equal)]
    #[case(LaneKey::Normal(4), LaneKey::Normal(3), Ordering::Greater)]
    #[case(LaneKey::Normal(i32::MAX), LaneKey::PositiveInfinity, Ordering::Less)]
    #[case(LaneKey::PositiveInfinity, LaneKey::PositiveInfinity, Ordering::Equal)]
    #[case(LaneKey::PositiveInfinity, LaneKey::NegativeInfinity, Ordering::Greater)]
    fn test_lane_key_order(
        #[case] left: LaneKey<i32>,
        #[case] right: LaneKey<i32>,
        #[case] expected: Ordering,
    ) {
        assert_eq!(left.cmp(&right), expected);
    }

    #[rstest]
    fn test_cmp_element_treats_sentinels_as_bounds() {
        assert_eq!(LaneKey::<i32>::NegativeInfinity.cmp_element(&i32::MIN), Ordering::Less);
        assert_eq!(LaneKey::<i32>::PositiveInfinity.cmp_element(&i32::MAX), Ordering::Greater);
        assert_eq!(LaneKey::Normal(5).cmp_element(&5), Ordering::Equal);
    }

    // =========================================================================
    // Lanes
    // =========================================================================

    #[rstest]
    fn test_empty_set_has_one_empty_lane() {
        let set: LeveledSkipSet<i32> = LeveledSkipSet::new();
        assert_eq!(set.level_count(), 1);
        assert_eq!(set.lane_capacity(), INITIAL_LANE_CAPACITY);
        assert_eq!(set.elements_on_level(0), 0);
        audit(&set);
    }

    #[rstest]
    fn test_never_promoting_keeps_one_lane() {
        let mut set = LeveledSkipSet::with_oracle(ConstantOracle(false));
        for element in (0..500).rev() {
            set.add(element).unwrap();
        }
        assert_eq!(set.level_count(), 1);
        assert_eq!(set.elements_on_level(0), 500);
        audit(&set);
    }

    #[rstest]
    fn test_scripted_promotions_build_expected_lanes() {
        // 20 climbs two lanes, 10 stays, 30 climbs one.
        let script = vec![true, true, false, false, true, false];
        let mut set = LeveledSkipSet::with_oracle(ScriptedOracle::new(script));
        for element in [20, 10, 30] {
            set.add(element).unwrap();
        }
        assert_eq!(set.level_count(), 3);
        assert_eq!(lane_elements(&set, 0), vec![10, 20, 30]);
        assert_eq!(lane_elements(&set, 1), vec![20, 30]);
        assert_eq!(lane_elements(&set, 2), vec![20]);
        audit(&set);
    }

    #[rstest]
    fn test_new_lane_sentinels_sit_above_previous_top() {
        let mut set = LeveledSkipSet::with_oracle(ScriptedOracle::new(vec![true, false]));
        set.add(1).unwrap();
        let head = set.lanes[1];
        let tail = set.nodes[head].next.and_then(|first| set.nodes[first].next).unwrap();
        assert_eq!(set.nodes[head].below, Some(set.lanes[0]));
        assert_eq!(set.nodes[tail].key, LaneKey::PositiveInfinity);
        assert_eq!(set.nodes[set.nodes[tail].below.unwrap()].key, LaneKey::PositiveInfinity);
    }

    #[rstest]
    #[case::seven_lanes(6, 7, INITIAL_LANE_CAPACITY)]
    #[case::eight_lanes(7, 8, 21)]
    fn test_lane_array_grows_at_load_limit(
        #[case] promotions: usize,
        #[case] lanes: usize,
        #[case] capacity: usize,
    ) {
        let mut script = vec![true; promotions];
        script.push(false);
        let mut set = LeveledSkipSet::with_oracle(ScriptedOracle::new(script));
        set.add(1).unwrap();
        assert_eq!(set.level_count(), lanes);
        assert_eq!(set.lane_capacity(), capacity);
        audit(&set);
    }

    #[rstest]
    fn test_planned_lane_capacity_follows_growth_rule() {
        assert_eq!(planned_lane_capacity(1, 7, 10), Ok(10));
        assert_eq!(planned_lane_capacity(1, 8, 10), Ok(21));
        assert_eq!(planned_lane_capacity(1, 17, 10), Ok(43));
        assert_eq!(planned_lane_capacity(1, MAX_LEVELS, 10), Ok(87));
    }

    #[rstest]
    fn test_always_promoting_stops_at_ceiling() {
        let mut set = LeveledSkipSet::with_oracle(ConstantOracle(true));
        set.add(1).unwrap();
        set.add(2).unwrap();
        assert_eq!(set.level_count(), MAX_LEVELS);
        assert_eq!(set.lane_capacity(), 87);
        assert_eq!(set.elements_on_level(MAX_LEVELS - 1), 2);
        audit(&set);
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(usize::MAX)]
    fn test_missing_lane_is_neutral(#[case] level: usize) {
        let mut set = LeveledSkipSet::with_oracle(ConstantOracle(false));
        set.add(1).unwrap();
        assert_eq!(set.elements_on_level(level), 0);
        assert!(!set.is_element_on_level(&1, level));
    }

    #[rstest]
    fn test_duplicate_does_not_consult_oracle() {
        let mut set = LeveledSkipSet::with_oracle(ScriptedOracle::new(vec![false, true, false]));
        set.add(1).unwrap();
        assert_eq!(set.add(1), Ok(false));
        // The next decision in the script is still `true`.
        set.add(2).unwrap();
        assert!(set.is_element_on_level(&2, 1));
        assert_eq!(set.len(), 2);
    }

    // =========================================================================
    // Copies
    // =========================================================================

    #[rstest]
    fn test_try_clone_copies_every_lane() {
        let mut original = LeveledSkipSet::with_oracle(ScriptedOracle::new(vec![true, false]));
        for element in 0..10 {
            original.add(element).unwrap();
        }
        let mut copy = original.try_clone().unwrap();
        assert_eq!(copy.level_count(), original.level_count());
        for level in 0..original.level_count() {
            assert_eq!(lane_elements(&copy, level), lane_elements(&original, level));
        }

        copy.add(99).unwrap();
        assert!(!original.contains(&99));
        audit(&copy);
    }

    #[rstest]
    fn test_try_clone_from_replaces_contents() {
        let mut source = LeveledSkipSet::with_oracle(ConstantOracle(false));
        source.add(5).unwrap();
        let mut target = LeveledSkipSet::with_oracle(ConstantOracle(true));
        target.add(6).unwrap();

        target.try_clone_from(&source).unwrap();
        assert_eq!(target.level_count(), 1);
        assert!(target.contains(&5));
        assert!(!target.contains(&6));
        assert_eq!(target.oracle(), &ConstantOracle(false));
    }

    #[rstest]
    fn test_take_leaves_single_empty_lane() {
        let mut set = LeveledSkipSet::new();
        for element in 0..50 {
            set.add(element).unwrap();
        }
        let taken = std::mem::take(&mut set);
        assert_eq!(taken.len(), 50);
        assert!(set.is_empty());
        assert_eq!(set.level_count(), 1);
    }

    // =========================================================================
    // Properties
    // =========================================================================

    proptest! {
        #[test]
        fn prop_lanes_stay_consistent(
            seed: u64,
            elements in prop::collection::vec(-1000i32..1000, 0..200)
        ) {
            let mut set = LeveledSkipSet::with_oracle(CoinFlipOracle::seeded(seed));
            for element in elements {
                set.add(element).unwrap();
            }
            audit(&set);
        }
    }
}
