//! Uniform selection helpers shared by parse-time cloze sampling and the
//! per-attempt generator. Randomness is always supplied by the caller so a
//! seeded generator gives reproducible documents and attempts.

use rand::Rng;

/// In-place Fisher–Yates shuffle: for `i` from the last index down to 1,
/// swap element `i` with a uniformly chosen element in `[0, i]`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Take a uniformly random subset of `capacity` items.
///
/// When `capacity` is absent or not smaller than the number of items, every
/// item is returned in its original order and no randomness is consumed.
pub fn sample<T: Clone, R: Rng + ?Sized>(items: &[T], capacity: Option<usize>, rng: &mut R) -> Vec<T> {
    match capacity {
        Some(capacity) if capacity < items.len() => {
            let mut pool = items.to_vec();
            shuffle(&mut pool, rng);
            pool.truncate(capacity);
            pool
        }
        _ => items.to_vec(),
    }
}

/// Like [`sample`], but returns positions into `0..len`, sorted ascending so
/// the chosen items keep their authored order.
pub fn sample_positions<R: Rng + ?Sized>(len: usize, capacity: Option<usize>, rng: &mut R) -> Vec<usize> {
    let positions: Vec<usize> = (0..len).collect();
    let mut chosen = sample(&positions, capacity, rng);
    chosen.sort_unstable();
    chosen
}
