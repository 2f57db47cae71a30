//! This module provides deterministic hashing. The hashing data structures in the standard
//! library are randomly seeded on every process start, which would make iteration order (and
//! anything derived from it) differ between runs with the same random seed.
//!
//! `HashMap` and `HashSet` here are the `rustc-hash` variants. Use `HashMap::default()` to
//! create one, or bring `HashMapExt` / `HashSetExt` into scope to get `new()`.
//!
//! The `hash_str` and `hash_words` free functions are used in `crate::random` to derive
//! independent seeds for the random streams.

use xxhash_rust::xxh3::{xxh3_64, Xxh3};

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub trait HashMapExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, Default::default())
    }
}

pub trait HashSetExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<T> HashSetExt for HashSet<T> {
    fn new() -> Self {
        HashSet::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashSet::with_capacity_and_hasher(capacity, Default::default())
    }
}

/// A convenience method to compute the hash of a `&str`.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Hashes a sequence of words, in order, into a single `u64`. Equal to `xxh3_64` of the words'
/// little-endian bytes laid end to end.
#[must_use]
pub fn hash_words(words: &[u64]) -> u64 {
    let mut hasher = Xxh3::new();
    for word in words {
        hasher.update(&word.to_le_bytes());
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_strings() {
        let a = hash_str("hello");
        let b = hash_str("hello");
        let c = hash_str("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn words_hash_as_concatenated_bytes() {
        let words = [42_u64, 7, u64::MAX];
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        assert_eq!(hash_words(&words), xxh3_64(&bytes));
        assert_eq!(hash_words(&[]), xxh3_64(&[]));
    }

    #[test]
    fn word_order_matters() {
        assert_eq!(hash_words(&[1, 2, 3]), hash_words(&[1, 2, 3]));
        assert_ne!(hash_words(&[1, 2, 3]), hash_words(&[3, 2, 1]));
        assert_ne!(hash_words(&[0, 1]), hash_words(&[1, 0]));
    }

    #[test]
    fn maps_are_constructible() {
        let mut map: HashMap<u32, &str> = HashMap::new();
        map.insert(1, "one");
        let mut set: HashSet<u32> = HashSet::with_capacity(4);
        set.insert(1);
        assert_eq!(map.get(&1), Some(&"one"));
        assert!(set.contains(&1));
    }
}
