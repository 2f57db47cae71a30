//! Uniform sampling helpers used by movement and population placement.

use crate::rand::Rng;

/// Sample an index uniformly from `0..len`, or `None` if `len` is zero.
pub fn sample_index<R: Rng>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    // Sampling in `u32` is noticeably faster than in `usize`; neighborhoods and location
    // counts never come near `u32::MAX`.
    if let Ok(len) = u32::try_from(len) {
        Some(rng.random_range(0..len) as usize)
    } else {
        Some(rng.random_range(0..len))
    }
}

/// Sample an element uniformly from `items`, or `None` if the slice is empty.
pub fn sample_from_slice<R: Rng, T: Copy>(rng: &mut R, items: &[T]) -> Option<T> {
    sample_index(rng, items.len()).map(|index| items[index])
}
