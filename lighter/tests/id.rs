use std::collections::HashSet;

use lighter::id::{ID_PREFIX, derive_id, generate_id, is_valid_id};
use rstest::rstest;

#[rstest]
fn generated_ids_are_unique_and_valid() {
    let ids = (0..10_000).map(|_| generate_id()).collect::<HashSet<_>>();

    assert_eq!(ids.len(), 10_000);
    assert!(ids.iter().all(|id| is_valid_id(id) && id.starts_with(ID_PREFIX)));
}

#[rstest]
#[case("1234567")]
#[case("order-42")]
#[case("")]
fn derived_ids_are_stable_and_valid(#[case] seed: &str) {
    assert_eq!(derive_id(seed), derive_id(seed));
    assert!(is_valid_id(&derive_id(seed)));
}

#[rstest]
fn numeric_ids_are_rejected() {
    assert!(!is_valid_id("1234567"));
    assert!(is_valid_id("a1234567"));
}
