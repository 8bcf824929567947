//! AVL tree set.
//!
//! This module provides [`BalancedTreeSet`], an ordered set stored as a
//! binary search tree whose nodes live in an arena and refer to their
//! children by index.
//!
//! # Overview
//!
//! - O(log n) `add` and `contains` when balancing is enabled
//! - O(1) `len` and `height` (heights are cached per node)
//! - Balancing is fixed at construction. With it switched off the tree is a
//!   plain binary search tree and sorted input produces a chain of depth n.
//!
//! Nodes carry no parent links. `add` records the path it walked down and
//! retraces that path bottom-up, so a rotated subtree is spliced back under
//! the ancestor recorded one step above it, or becomes the new root.
//!
//! # Examples
//!
//! ```rust
//! use polyset::set::BalancedTreeSet;
//!
//! let mut set = BalancedTreeSet::new();
//! for element in [5, 3, 8, 1, 4, 7, 9] {
//!     set.add(element).unwrap();
//! }
//! assert_eq!(set.height(), 2);
//!
//! let mut visited = Vec::new();
//! set.inorder(|element| visited.push(*element));
//! assert_eq!(visited, vec![1, 3, 4, 5, 7, 8, 9]);
//! ```

use smallvec::SmallVec;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use super::{NodeIndex, Set};
use crate::SetError;
use crate::error::{reserve, reserve_exact};
use crate::tracing_helpers::trace_log;

const STRUCTURE: &str = "BalancedTreeSet nodes";

/// Depth of the insertion path kept inline before spilling to the heap.
/// An AVL tree of 2^32 elements stays below this depth.
const INLINE_PATH: usize = 48;

// =============================================================================
// Node Definition
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Side {
    Left,
    Right,
}

/// The four shapes an insertion can leave an unbalanced node in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Imbalance {
    LeftLeft,
    LeftRight,
    RightRight,
    RightLeft,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Order {
    Pre,
    In,
    Post,
}

#[derive(Clone, Debug)]
struct Node<T> {
    element: T,
    height: i32,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
}

impl<T> Node<T> {
    const fn leaf(element: T) -> Self {
        Self {
            element,
            height: 0,
            left: None,
            right: None,
        }
    }

    const fn child(&self, side: Side) -> Option<NodeIndex> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

// =============================================================================
// BalancedTreeSet Definition
// =============================================================================

/// An ordered set backed by an AVL tree.
///
/// # Time Complexity
///
/// | Operation   | Balanced   | Unbalanced |
/// |-------------|------------|------------|
/// | `add`       | O(log n)   | O(n)       |
/// | `contains`  | O(log n)   | O(n)       |
/// | `len`       | O(1)       | O(1)       |
/// | `height`    | O(1)       | O(1)       |
/// | traversals  | O(n)       | O(n)       |
///
/// # Examples
///
/// ```rust
/// use polyset::set::BalancedTreeSet;
///
/// let mut set = BalancedTreeSet::unbalanced();
/// for element in 0..5 {
///     set.add(element).unwrap();
/// }
/// assert_eq!(set.height(), 4);
/// ```
#[derive(Clone)]
pub struct BalancedTreeSet<T> {
    nodes: Vec<Node<T>>,
    root: Option<NodeIndex>,
    balancing: bool,
}

impl<T> BalancedTreeSet<T> {
    /// Creates an empty set that keeps itself balanced.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_balancing(true)
    }

    /// Creates an empty set that never rotates.
    #[inline]
    #[must_use]
    pub const fn unbalanced() -> Self {
        Self::with_balancing(false)
    }

    /// Creates an empty set, balancing or not.
    #[inline]
    #[must_use]
    pub const fn with_balancing(balancing: bool) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            balancing,
        }
    }

    /// Returns `true` if this set rebalances after insertion.
    #[inline]
    #[must_use]
    pub const fn is_balancing(&self) -> bool {
        self.balancing
    }

    /// Returns the number of elements in the set.
    ///
    /// Nodes are never removed, so the arena length is the element count.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the height of the tree; an empty tree has height -1 and a
    /// single element has height 0.
    #[inline]
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    /// Calls `visit` on every element, node before its subtrees.
    pub fn preorder<F: FnMut(&T)>(&self, mut visit: F) {
        self.walk(Order::Pre, &mut visit);
    }

    /// Calls `visit` on every element in ascending order.
    pub fn inorder<F: FnMut(&T)>(&self, mut visit: F) {
        self.walk(Order::In, &mut visit);
    }

    /// Calls `visit` on every element, subtrees before their node.
    pub fn postorder<F: FnMut(&T)>(&self, mut visit: F) {
        self.walk(Order::Post, &mut visit);
    }

    /// Returns an iterator over the elements in ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polyset::set::BalancedTreeSet;
    ///
    /// let mut set = BalancedTreeSet::new();
    /// for element in [3, 1, 2] {
    ///     set.add(element).unwrap();
    /// }
    /// let elements: Vec<&i32> = set.iter().collect();
    /// assert_eq!(elements, vec![&1, &2, &3]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> BalancedTreeIterator<'_, T> {
        let mut iterator = BalancedTreeIterator {
            nodes: self.nodes.as_slice(),
            stack: Vec::new(),
            remaining: self.nodes.len(),
        };
        iterator.push_left_spine(self.root);
        iterator
    }

    /// Builds an independent copy, reporting allocation failure instead of
    /// aborting. `self` is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] if the node arena could not be
    /// allocated.
    pub fn try_clone(&self) -> Result<Self, SetError>
    where
        T: Clone,
    {
        let mut nodes = Vec::new();
        reserve_exact(&mut nodes, self.nodes.len(), STRUCTURE)?;
        nodes.extend(self.nodes.iter().cloned());
        Ok(Self {
            nodes,
            root: self.root,
            balancing: self.balancing,
        })
    }

    /// Replaces `self` with a copy of `source`.
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
    {
        *self = source.try_clone()?;
        Ok(())
    }

    fn height_of(&self, index: Option<NodeIndex>) -> i32 {
        index.map_or(-1, |index| self.nodes[index].height)
    }

    fn balance_factor(&self, index: NodeIndex) -> i32 {
        let node = &self.nodes[index];
        self.height_of(node.left) - self.height_of(node.right)
    }

    fn update_height(&mut self, index: NodeIndex) {
        let node = &self.nodes[index];
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.nodes[index].height = height;
    }

    /// Attaches `subtree` where the recorded `ancestor` step points, or makes
    /// it the root when there is no ancestor.
    fn splice(&mut self, ancestor: Option<(NodeIndex, Side)>, subtree: NodeIndex) {
        match ancestor {
            None => self.root = Some(subtree),
            Some((parent, Side::Left)) => self.nodes[parent].left = Some(subtree),
            Some((parent, Side::Right)) => self.nodes[parent].right = Some(subtree),
        }
    }

    /// Recomputes heights from the deepest recorded step up to the root,
    /// rotating unbalanced nodes when balancing is on. Stops as soon as a
    /// subtree's height comes out unchanged, since nothing above it moved.
    fn retrace(&mut self, path: &[(NodeIndex, Side)]) {
        for depth in (0..path.len()).rev() {
            let (index, _) = path[depth];
            let previous_height = self.nodes[index].height;

            let subtree = if self.balancing {
                self.rebalance(index)
            } else {
                self.update_height(index);
                index
            };

            if subtree != index {
                let ancestor = depth.checked_sub(1).map(|above| path[above]);
                self.splice(ancestor, subtree);
            }

            if self.nodes[subtree].height == previous_height {
                break;
            }
        }
    }

    fn classify(&self, index: NodeIndex) -> Option<Imbalance> {
        let factor = self.balance_factor(index);
        if factor > 1 {
            let left = self.nodes[index].left?;
            Some(if self.balance_factor(left) >= 0 {
                Imbalance::LeftLeft
            } else {
                Imbalance::LeftRight
            })
        } else if factor < -1 {
            let right = self.nodes[index].right?;
            Some(if self.balance_factor(right) <= 0 {
                Imbalance::RightRight
            } else {
                Imbalance::RightLeft
            })
        } else {
            None
        }
    }

    /// Restores the AVL invariant at `index` and returns the root of the
    /// resulting subtree.
    fn rebalance(&mut self, index: NodeIndex) -> NodeIndex {
        self.update_height(index);
        let Some(imbalance) = self.classify(index) else {
            return index;
        };
        trace_log!(?imbalance, node = index, "BalancedTreeSet: rotating");

        match imbalance {
            Imbalance::LeftLeft => self.rotate_right(index),
            Imbalance::LeftRight => {
                if let Some(left) = self.nodes[index].left {
                    let pivot = self.rotate_left(left);
                    self.nodes[index].left = Some(pivot);
                }
                self.rotate_right(index)
            }
            Imbalance::RightRight => self.rotate_left(index),
            Imbalance::RightLeft => {
                if let Some(right) = self.nodes[index].right {
                    let pivot = self.rotate_right(right);
                    self.nodes[index].right = Some(pivot);
                }
                self.rotate_left(index)
            }
        }
    }

    /// Rotates the subtree at `index` to the right and returns its new root.
    fn rotate_right(&mut self, index: NodeIndex) -> NodeIndex {
        let Some(pivot) = self.nodes[index].left else {
            return index;
        };
        self.nodes[index].left = self.nodes[pivot].right;
        self.nodes[pivot].right = Some(index);
        self.update_height(index);
        self.update_height(pivot);
        pivot
    }

    /// Rotates the subtree at `index` to the left and returns its new root.
    fn rotate_left(&mut self, index: NodeIndex) -> NodeIndex {
        let Some(pivot) = self.nodes[index].right else {
            return index;
        };
        self.nodes[index].right = self.nodes[pivot].left;
        self.nodes[pivot].left = Some(index);
        self.update_height(index);
        self.update_height(pivot);
        pivot
    }

    /// Depth-first walk with an explicit stack, so degenerate trees cannot
    /// overflow the call stack. A `true` flag means "visit now".
    fn walk(&self, order: Order, visit: &mut dyn FnMut(&T)) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: Vec<(NodeIndex, bool)> = vec![(root, false)];

        while let Some((index, ready)) = stack.pop() {
            let node = &self.nodes[index];
            if ready {
                visit(&node.element);
                continue;
            }
            // Pushed in reverse of the order they should come off the stack.
            let right = node.right.map(|right| (right, false));
            let left = node.left.map(|left| (left, false));
            let this = Some((index, true));
            let pending = match order {
                Order::Pre => [right, left, this],
                Order::In => [right, this, left],
                Order::Post => [this, right, left],
            };
            stack.extend(pending.into_iter().flatten());
        }
    }
}

impl<T: Ord> BalancedTreeSet<T> {
    /// Inserts `element` if it is absent.
    ///
    /// Returns `Ok(false)` without touching the tree when the element is
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] if the node arena could not
    /// grow. The tree is unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polyset::set::BalancedTreeSet;
    ///
    /// let mut set = BalancedTreeSet::new();
    /// assert_eq!(set.add("kiwi"), Ok(true));
    /// assert_eq!(set.add("kiwi"), Ok(false));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn add(&mut self, element: T) -> Result<bool, SetError> {
        let mut path: SmallVec<[(NodeIndex, Side); INLINE_PATH]> = SmallVec::new();
        let mut cursor = self.root;

        while let Some(index) = cursor {
            let node = &self.nodes[index];
            let side = match element.cmp(&node.element) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Ok(false),
            };
            path.push((index, side));
            cursor = node.child(side);
        }

        reserve(&mut self.nodes, 1, STRUCTURE)?;
        let leaf = self.nodes.len();
        self.nodes.push(Node::leaf(element));
        self.splice(path.last().copied(), leaf);
        self.retrace(&path);
        Ok(true)
    }

    /// Returns `true` if the set contains `element`.
    ///
    /// The element may be any borrowed form of the set's element type, but
    /// `Ord` on the borrowed form must match that of the element type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polyset::set::BalancedTreeSet;
    ///
    /// let mut set = BalancedTreeSet::new();
    /// set.add("apple".to_string()).unwrap();
    /// assert!(set.contains("apple"));
    /// assert!(!set.contains("pear"));
    /// ```
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = self.root;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            cursor = match element.cmp(node.element.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return true,
            };
        }
        false
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An ascending iterator over the elements of a [`BalancedTreeSet`].
pub struct BalancedTreeIterator<'a, T> {
    nodes: &'a [Node<T>],
    stack: Vec<NodeIndex>,
    remaining: usize,
}

impl<T> BalancedTreeIterator<'_, T> {
    fn push_left_spine(&mut self, mut cursor: Option<NodeIndex>) {
        while let Some(index) = cursor {
            self.stack.push(index);
            cursor = self.nodes[index].left;
        }
    }
}

impl<'a, T> Iterator for BalancedTreeIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let nodes = self.nodes;
        self.push_left_spine(nodes[index].right);
        self.remaining -= 1;
        Some(&nodes[index].element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for BalancedTreeIterator<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<'a, T> IntoIterator for &'a BalancedTreeSet<T> {
    type Item = &'a T;
    type IntoIter = BalancedTreeIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Default for BalancedTreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for BalancedTreeSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> Set<T> for BalancedTreeSet<T> {
    fn add(&mut self, element: T) -> Result<bool, SetError> {
        Self::add(self, element)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for BalancedTreeSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
struct BalancedTreeSetVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for BalancedTreeSetVisitor<T>
where
    T: serde::Deserialize<'de> + Ord,
{
    type Value = BalancedTreeSet<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut set = BalancedTreeSet::new();
        while let Some(element) = access.next_element()? {
            set.add(element).map_err(serde::de::Error::custom)?;
        }
        Ok(set)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for BalancedTreeSet<T>
where
    T: serde::Deserialize<'de> + Ord,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(BalancedTreeSetVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

static_assertions::assert_impl_all!(BalancedTreeSet<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
