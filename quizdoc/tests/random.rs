use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use quizdoc::random::{sample, sample_positions, shuffle};

#[test]
fn shuffle_is_a_permutation() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut items: Vec<u32> = (0..20).collect();
    shuffle(&mut items, &mut rng);
    let mut sorted = items.clone();
    sorted.sort();
    assert_eq!(sorted, (0..20).collect::<Vec<_>>());
}

#[test]
fn shuffle_reaches_every_ordering_of_three() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut seen = BTreeSet::new();
    for _ in 0..500 {
        let mut items = ['a', 'b', 'c'];
        shuffle(&mut items, &mut rng);
        seen.insert(items);
    }
    assert_eq!(seen.len(), 6);
}

#[test]
fn shuffle_handles_short_slices() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut empty: [u8; 0] = [];
    shuffle(&mut empty, &mut rng);
    let mut one = [7];
    shuffle(&mut one, &mut rng);
    assert_eq!(one, [7]);
}

#[test]
fn sample_without_capacity_keeps_order() {
    let mut rng = StdRng::seed_from_u64(4);
    assert_eq!(sample(&[1, 2, 3], None, &mut rng), vec![1, 2, 3]);
    assert_eq!(sample(&[1, 2, 3], Some(3), &mut rng), vec![1, 2, 3]);
    assert_eq!(sample(&[1, 2, 3], Some(10), &mut rng), vec![1, 2, 3]);
}

#[test]
fn sample_takes_distinct_members() {
    let mut rng = StdRng::seed_from_u64(5);
    let items: Vec<u32> = (0..10).collect();
    for _ in 0..50 {
        let chosen = sample(&items, Some(4), &mut rng);
        assert_eq!(chosen.len(), 4);
        let distinct: BTreeSet<u32> = chosen.iter().copied().collect();
        assert_eq!(distinct.len(), 4);
        assert!(chosen.iter().all(|item| items.contains(item)));
    }
}

#[test]
fn zero_capacity_takes_nothing() {
    let mut rng = StdRng::seed_from_u64(6);
    assert!(sample(&[1, 2, 3], Some(0), &mut rng).is_empty());
}

#[test]
fn positions_are_sorted() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let positions = sample_positions(8, Some(3), &mut rng);
        assert_eq!(positions.len(), 3);
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(positions.iter().all(|&p| p < 8));
    }
}

#[test]
fn seeded_draws_repeat() {
    let items: Vec<u32> = (0..30).collect();
    let first = sample(&items, Some(5), &mut StdRng::seed_from_u64(99));
    let second = sample(&items, Some(5), &mut StdRng::seed_from_u64(99));
    assert_eq!(first, second);
}
