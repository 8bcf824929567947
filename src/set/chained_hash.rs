//! Separately-chained hash set.
//!
//! This module provides [`ChainedHashSet`], a hash table whose buckets hold
//! the heads of singly linked chains. Chain nodes live in an arena and link
//! to each other by index.
//!
//! # Overview
//!
//! - The hash function is supplied by the caller; the bucket of an element is
//!   `hash(element) % capacity`.
//! - New elements are appended to the tail of their chain.
//! - When an insertion brings `len / capacity` to 0.8 or more, the table is
//!   rehashed into `capacity * 2 + 1` buckets before `add` returns.
//! - Capacity never shrinks.
//!
//! # Examples
//!
//! ```rust
//! use polyset::set::ChainedHashSet;
//!
//! let mut set = ChainedHashSet::with_capacity(10, |element: &u64| *element);
//! for element in 0..7 {
//!     set.add(element).unwrap();
//! }
//! assert_eq!(set.capacity(), 10);
//!
//! set.add(7).unwrap(); // 8 / 10 reaches the load factor
//! assert_eq!(set.capacity(), 21);
//! assert!(set.is_element_at_index(&7, 7));
//! ```

use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher, Hash};
use std::sync::Arc;

use super::{NodeIndex, Set};
use crate::SetError;
use crate::error::{grown_capacity, reserve, reserve_exact};
use crate::tracing_helpers::debug_log;

/// The number of buckets a set starts with unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 10;

const BUCKETS: &str = "ChainedHashSet buckets";
const NODES: &str = "ChainedHashSet nodes";

/// A caller-supplied hash function, shared between copies of a set.
pub type HashFunction<T> = Arc<dyn Fn(&T) -> u64 + Send + Sync>;

type Buckets = Vec<Option<NodeIndex>>;

#[derive(Clone, Debug)]
struct ChainNode<T> {
    element: T,
    next: Option<NodeIndex>,
}

/// Maps a hash onto `0..capacity`.
#[allow(clippy::cast_possible_truncation)]
const fn bucket_index(hash: u64, capacity: usize) -> usize {
    // The remainder is below `capacity`, so it always fits back into usize.
    (hash % capacity as u64) as usize
}

/// Returns `true` once `len / capacity` has reached 0.8.
const fn at_load_limit(len: usize, capacity: usize) -> bool {
    len.saturating_mul(5) >= capacity.saturating_mul(4)
}

fn allocate_buckets(capacity: usize) -> Result<Buckets, SetError> {
    let mut buckets = Vec::new();
    reserve_exact(&mut buckets, capacity, BUCKETS)?;
    buckets.resize(capacity, None);
    Ok(buckets)
}

// =============================================================================
// ChainedHashSet Definition
// =============================================================================

/// A hash set using separate chaining and a caller-supplied hash function.
///
/// # Time Complexity
///
/// | Operation             | Complexity              |
/// |-----------------------|-------------------------|
/// | `add`                 | O(1) amortized          |
/// | `contains`            | O(1) expected           |
/// | `len`                 | O(1)                    |
/// | `elements_at_index`   | O(chain length)         |
/// | rehash                | O(n)                    |
///
/// Expected bounds assume a hash function that spreads elements evenly.
///
/// # Examples
///
/// ```rust
/// use polyset::set::ChainedHashSet;
///
/// // Every element collides; the set still works, one chain long.
/// let mut set = ChainedHashSet::new(|_: &&str| 0);
/// set.add("red").unwrap();
/// set.add("green").unwrap();
/// assert_eq!(set.elements_at_index(0), 2);
/// assert!(set.contains(&"green"));
/// ```
#[derive(Clone)]
pub struct ChainedHashSet<T> {
    buckets: Buckets,
    nodes: Vec<ChainNode<T>>,
    hash_function: HashFunction<T>,
}

impl<T> ChainedHashSet<T> {
    /// Creates an empty set with [`DEFAULT_CAPACITY`] buckets.
    #[must_use]
    pub fn new<F>(hash_function: F) -> Self
    where
        F: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        Self::with_capacity(DEFAULT_CAPACITY, hash_function)
    }

    /// Creates an empty set with `capacity` buckets. A capacity of zero is
    /// raised to one.
    ///
    /// # Panics
    ///
    /// Panics if the bucket array cannot be allocated. Use
    /// [`try_with_capacity`](Self::try_with_capacity) to get an error instead.
    #[must_use]
    pub fn with_capacity<F>(capacity: usize, hash_function: F) -> Self
    where
        F: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        Self::with_hash_function(capacity, Arc::new(hash_function))
    }

    /// Creates an empty set that shares an existing hash function.
    ///
    /// # Panics
    ///
    /// Panics if the bucket array cannot be allocated. Use
    /// [`try_with_hash_function`](Self::try_with_hash_function) to get an
    /// error instead.
    #[must_use]
    pub fn with_hash_function(capacity: usize, hash_function: HashFunction<T>) -> Self {
        Self {
            buckets: vec![None; capacity.max(1)],
            nodes: Vec::new(),
            hash_function,
        }
    }

    /// Creates an empty set with `capacity` buckets, reporting allocation
    /// failure instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] if the bucket array could not be
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polyset::{SetError, set::ChainedHashSet};
    ///
    /// let huge = ChainedHashSet::try_with_capacity(usize::MAX / 4, |element: &u64| *element);
    /// assert!(matches!(huge, Err(SetError::AllocationFailed { .. })));
    ///
    /// let small = ChainedHashSet::try_with_capacity(4, |element: &u64| *element).unwrap();
    /// assert_eq!(small.capacity(), 4);
    /// ```
    pub fn try_with_capacity<F>(capacity: usize, hash_function: F) -> Result<Self, SetError>
    where
        F: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        Self::try_with_hash_function(capacity, Arc::new(hash_function))
    }

    /// Like [`try_with_capacity`](Self::try_with_capacity), sharing an
    /// existing hash function.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] if the bucket array could not be
    /// allocated.
    pub fn try_with_hash_function(
        capacity: usize,
        hash_function: HashFunction<T>,
    ) -> Result<Self, SetError> {
        Ok(Self {
            buckets: allocate_buckets(capacity.max(1))?,
            nodes: Vec::new(),
            hash_function,
        })
    }

    /// Creates an empty set hashing through `build_hasher`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polyset::set::ChainedHashSet;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let mut set = ChainedHashSet::with_build_hasher(RandomState::new());
    /// set.add("plum".to_string()).unwrap();
    /// assert!(set.contains(&"plum".to_string()));
    /// ```
    #[must_use]
    pub fn with_build_hasher<S>(build_hasher: S) -> Self
    where
        T: Hash + 'static,
        S: BuildHasher + Send + Sync + 'static,
    {
        Self::new(move |element: &T| build_hasher.hash_one(element))
    }

    /// Creates an empty set hashing with `rustc-hash`'s Fx hasher.
    #[cfg(feature = "fxhash")]
    #[must_use]
    pub fn with_fx_hasher() -> Self
    where
        T: Hash + 'static,
    {
        Self::with_build_hasher(rustc_hash::FxBuildHasher)
    }

    /// Creates an empty set hashing with a randomly keyed `ahash` hasher.
    #[cfg(feature = "ahash")]
    #[must_use]
    pub fn with_ahasher() -> Self
    where
        T: Hash + 'static,
    {
        Self::with_build_hasher(ahash::RandomState::new())
    }

    /// Returns the number of elements in the set.
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

    /// Returns the number of buckets.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the shared hash function.
    #[must_use]
    pub fn hash_function(&self) -> &HashFunction<T> {
        &self.hash_function
    }

    /// Returns how many elements hashed to bucket `index`, or 0 if `index`
    /// is not a bucket.
    #[must_use]
    pub fn elements_at_index(&self, index: usize) -> usize {
        self.chain(index).count()
    }

    /// Returns an iterator over the elements, bucket by bucket.
    #[must_use]
    pub fn iter(&self) -> ChainedHashIterator<'_, T> {
        ChainedHashIterator {
            buckets: &self.buckets,
            nodes: &self.nodes,
            bucket: 0,
            cursor: None,
            remaining: self.nodes.len(),
        }
    }

    /// Builds an independent copy that shares the hash function. `self` is
    /// never touched.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] if the bucket array or the node
    /// arena could not be allocated.
    pub fn try_clone(&self) -> Result<Self, SetError>
    where
        T: Clone,
    {
        let mut buckets = allocate_buckets(self.buckets.len())?;
        buckets.copy_from_slice(&self.buckets);
        let mut nodes = Vec::new();
        reserve_exact(&mut nodes, self.nodes.len(), NODES)?;
        nodes.extend(self.nodes.iter().cloned());
        Ok(Self {
            buckets,
            nodes,
            hash_function: Arc::clone(&self.hash_function),
        })
    }

    /// Replaces `self` with a copy of `source`, hash function included.
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

    fn bucket_of(&self, element: &T) -> usize {
        bucket_index((self.hash_function)(element), self.buckets.len())
    }

    /// Walks the chain of bucket `index`; empty for an out-of-range index.
    fn chain(&self, index: usize) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut cursor = self.buckets.get(index).copied().flatten();
        std::iter::from_fn(move || {
            let node = cursor?;
            cursor = self.nodes[node].next;
            Some(node)
        })
    }

    /// Moves every chain node into `buckets`, preserving the order in which
    /// the old buckets are walked. Both arrays are allocated by the caller so
    /// this step cannot fail halfway.
    fn relink(&mut self, mut buckets: Buckets, mut tails: Buckets) {
        let capacity = buckets.len();
        for &head in &self.buckets {
            let mut cursor = head;
            while let Some(node) = cursor {
                cursor = self.nodes[node].next;
                let index = bucket_index((self.hash_function)(&self.nodes[node].element), capacity);
                self.nodes[node].next = None;
                match tails[index] {
                    Some(tail) => self.nodes[tail].next = Some(node),
                    None => buckets[index] = Some(node),
                }
                tails[index] = Some(node);
            }
        }
        self.buckets = buckets;
    }
}

impl<T: Eq> ChainedHashSet<T> {
    /// Inserts `element` if no equal element is in its bucket.
    ///
    /// Everything the insertion may need, including the bucket array of a
    /// pending rehash, is allocated before any chain is relinked.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::AllocationFailed`] or
    /// [`SetError::CapacityOverflow`] if the table could not grow. The set is
    /// unchanged in that case.
    pub fn add(&mut self, element: T) -> Result<bool, SetError> {
        let index = self.bucket_of(&element);
        let mut tail = None;
        for node in self.chain(index) {
            if self.nodes[node].element == element {
                return Ok(false);
            }
            tail = Some(node);
        }

        reserve(&mut self.nodes, 1, NODES)?;
        let capacity = self.buckets.len();
        let rehash = if at_load_limit(self.nodes.len() + 1, capacity) {
            let grown = grown_capacity(capacity, BUCKETS)?;
            Some((allocate_buckets(grown)?, allocate_buckets(grown)?))
        } else {
            None
        };

        let node = self.nodes.len();
        self.nodes.push(ChainNode {
            element,
            next: None,
        });
        match tail {
            Some(tail) => self.nodes[tail].next = Some(node),
            None => self.buckets[index] = Some(node),
        }

        if let Some((buckets, tails)) = rehash {
            debug_log!(
                old_capacity = capacity,
                new_capacity = buckets.len(),
                len = self.nodes.len(),
                "ChainedHashSet: rehashing"
            );
            self.relink(buckets, tails);
        }
        Ok(true)
    }

    /// Returns `true` if an element equal to `element` is in the set.
    ///
    /// Only the chain of the element's own bucket is scanned.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.is_element_at_index(element, self.bucket_of(element))
    }

    /// Returns `true` if `element` is stored in bucket `index`, or `false` if
    /// `index` is not a bucket.
    #[must_use]
    pub fn is_element_at_index(&self, element: &T, index: usize) -> bool {
        self.chain(index)
            .any(|node| self.nodes[node].element == *element)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the elements of a [`ChainedHashSet`] in bucket order.
pub struct ChainedHashIterator<'a, T> {
    buckets: &'a [Option<NodeIndex>],
    nodes: &'a [ChainNode<T>],
    bucket: usize,
    cursor: Option<NodeIndex>,
    remaining: usize,
}

impl<'a, T> Iterator for ChainedHashIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor.is_none() {
            self.cursor = *self.buckets.get(self.bucket)?;
            self.bucket += 1;
        }
        let node = &self.nodes[self.cursor?];
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for ChainedHashIterator<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<'a, T> IntoIterator for &'a ChainedHashSet<T> {
    type Item = &'a T;
    type IntoIter = ChainedHashIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T: Hash + 'static> Default for ChainedHashSet<T> {
    /// Creates an empty set hashing with the standard library's
    /// deterministic [`DefaultHasher`].
    fn default() -> Self {
        Self::with_build_hasher(BuildHasherDefault::<DefaultHasher>::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ChainedHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Eq> Set<T> for ChainedHashSet<T> {
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
impl<T: serde::Serialize> serde::Serialize for ChainedHashSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

static_assertions::assert_impl_all!(ChainedHashSet<String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
