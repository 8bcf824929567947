//! Tests for the fast hash feature flags.
//!
//! `fxhash` and `ahash` only add convenience constructors; the table logic
//! is the same as with any other injected hash function.

#![cfg(any(feature = "fxhash", feature = "ahash"))]

use polyset::set::{ChainedHashSet, DEFAULT_CAPACITY};
use rstest::rstest;

fn fill(set: &mut ChainedHashSet<String>, count: usize) {
    for index in 0..count {
        set.add(format!("word-{index}")).unwrap();
    }
}

// =============================================================================
// FxHash
// =============================================================================

#[cfg(feature = "fxhash")]
#[rstest]
fn test_fx_hasher_starts_at_default_capacity() {
    let set: ChainedHashSet<String> = ChainedHashSet::with_fx_hasher();
    assert_eq!(set.capacity(), DEFAULT_CAPACITY);
}

#[cfg(feature = "fxhash")]
#[rstest]
fn test_fx_hasher_membership() {
    let mut set = ChainedHashSet::with_fx_hasher();
    fill(&mut set, 500);
    assert_eq!(set.len(), 500);
    assert!(set.contains(&"word-499".to_string()));
    assert!(!set.contains(&"word-500".to_string()));
}

/// FxHash is unkeyed, so two tables place every element identically.
#[cfg(feature = "fxhash")]
#[rstest]
fn test_fx_hasher_placement_is_deterministic() {
    let mut first = ChainedHashSet::with_fx_hasher();
    let mut second = ChainedHashSet::with_fx_hasher();
    fill(&mut first, 50);
    fill(&mut second, 50);
    for index in 0..first.capacity() {
        assert_eq!(first.elements_at_index(index), second.elements_at_index(index));
    }
}

// =============================================================================
// AHash
// =============================================================================

#[cfg(feature = "ahash")]
#[rstest]
fn test_ahasher_membership() {
    let mut set = ChainedHashSet::with_ahasher();
    fill(&mut set, 500);
    assert_eq!(set.len(), 500);
    assert!(set.contains(&"word-0".to_string()));
    assert!(!set.contains(&"word".to_string()));
}

#[cfg(feature = "ahash")]
#[rstest]
fn test_ahasher_duplicates_are_ignored() {
    let mut set = ChainedHashSet::with_ahasher();
    assert_eq!(set.add(7_u32), Ok(true));
    assert_eq!(set.add(7_u32), Ok(false));
    assert_eq!(set.len(), 1);
}
