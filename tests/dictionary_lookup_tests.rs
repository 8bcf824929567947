//! Dictionary lookups driven through `&dyn Set<String>`.
//!
//! A small spell checker sits on top of whichever backing holds the word
//! list. It only ever sees the [`Set`] capability, so every backing must
//! produce identical suggestions.

use polyset::set::{BalancedTreeSet, ChainedHashSet, LeveledSkipSet, Set};
use rstest::rstest;
use std::collections::BTreeSet;
use std::hash::RandomState;

const WORDS: [&str; 12] = [
    "CAT", "CAST", "CART", "COAT", "COT", "AT", "ACT", "BAT", "TAC", "THE", "HE", "THEN",
];

struct WordChecker<'a> {
    words: &'a dyn Set<String>,
}

impl<'a> WordChecker<'a> {
    fn new(words: &'a dyn Set<String>) -> Self {
        Self { words }
    }

    fn word_exists(&self, word: &str) -> bool {
        self.words.contains(&word.to_string())
    }

    fn find_suggestions(&self, word: &str) -> Vec<String> {
        let letters: Vec<char> = word.chars().collect();
        let mut candidates = Vec::new();

        for index in 1..letters.len() {
            let mut swapped = letters.clone();
            swapped.swap(index - 1, index);
            candidates.push(swapped.into_iter().collect::<String>());
        }
        for index in 0..=letters.len() {
            for letter in 'A'..='Z' {
                let mut inserted = letters.clone();
                inserted.insert(index, letter);
                candidates.push(inserted.into_iter().collect());
            }
        }
        for index in 0..letters.len() {
            let mut deleted = letters.clone();
            deleted.remove(index);
            candidates.push(deleted.into_iter().collect());
            for letter in 'A'..='Z' {
                let mut replaced = letters.clone();
                replaced[index] = letter;
                candidates.push(replaced.into_iter().collect());
            }
        }

        let mut suggestions: BTreeSet<String> = candidates
            .into_iter()
            .filter(|candidate| candidate != word && self.word_exists(candidate))
            .collect();
        for index in 1..letters.len() {
            let head: String = letters[..index].iter().collect();
            let tail: String = letters[index..].iter().collect();
            if self.word_exists(&head) && self.word_exists(&tail) {
                suggestions.insert(format!("{head} {tail}"));
            }
        }
        suggestions.into_iter().collect()
    }
}

fn load(set: &mut dyn Set<String>) {
    for word in WORDS {
        set.add(word.to_string()).unwrap();
    }
}

fn with_every_backing(check: impl Fn(&WordChecker<'_>)) {
    let mut tree = BalancedTreeSet::new();
    let mut table = ChainedHashSet::new(|word: &String| word.bytes().map(u64::from).sum());
    let mut lanes = LeveledSkipSet::new();
    for set in [&mut tree as &mut dyn Set<String>, &mut table, &mut lanes] {
        load(set);
        check(&WordChecker::new(set));
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[rstest]
#[case("CAT", true)]
#[case("THEN", true)]
#[case("CATS", false)]
#[case("cat", false)]
#[case("", false)]
fn test_word_exists(#[case] word: &str, #[case] expected: bool) {
    with_every_backing(|checker| assert_eq!(checker.word_exists(word), expected));
}

#[rstest]
fn test_word_list_size() {
    with_every_backing(|checker| assert_eq!(checker.words.size(), WORDS.len()));
}

// =============================================================================
// Suggestions
// =============================================================================

#[rstest]
#[case("CTA", &["CAT"])]
#[case("AT", &["ACT", "BAT", "CAT"])]
#[case("HTE", &["HE", "THE"])]
#[case("CAAT", &["CART", "CAST", "CAT", "COAT"])]
#[case("THEHE", &["THE HE"])]
#[case("QQQQQQ", &[])]
fn test_suggestions(#[case] word: &str, #[case] expected: &[&str]) {
    with_every_backing(|checker| {
        let suggestions = checker.find_suggestions(word);
        assert_eq!(suggestions, expected);
    });
}

#[rstest]
fn test_suggestions_through_std_hasher() {
    let mut table = ChainedHashSet::with_build_hasher(RandomState::new());
    load(&mut table);
    let checker = WordChecker::new(&table);
    assert_eq!(checker.find_suggestions("CAAT"), ["CART", "CAST", "CAT", "COAT"]);
}
