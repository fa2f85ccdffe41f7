//! Property tests for the threshold partition calculator

use monument::domain::{PeopleConfig, compute_partition};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

/// Valid `(total, minimal)` people pairs, `total == minimal` included
#[derive(Clone, Copy, Debug)]
struct ValidPeople {
    total: u8,
    minimal: u8,
}

impl Arbitrary for ValidPeople {
    fn arbitrary(g: &mut Gen) -> Self {
        let total = (u8::arbitrary(g) % PeopleConfig::MAX_TOTAL) + 1; // 1..=127
        let minimal = (u8::arbitrary(g) % total) + 1; // 1..=total
        ValidPeople { total, minimal }
    }
}

#[quickcheck]
fn prop_partition_satisfies_inequalities(people: ValidPeople) -> bool {
    let partition = compute_partition(people.total, people.minimal).unwrap();

    let x = u16::from(people.total);
    let y = u16::from(people.minimal);
    let a = u16::from(*partition.total_shares());
    let b = u16::from(*partition.minimal_shares());
    let z = u16::from(partition.dead_switch_shares());

    x + z <= a && y + z >= b && x < b && y < b && z < b && a >= b && b > 0
}

#[quickcheck]
fn prop_buckets_cover_every_share(people: ValidPeople) -> bool {
    let partition = compute_partition(people.total, people.minimal).unwrap();

    u16::from(partition.dead_switch_shares()) + u16::from(partition.people_shares())
        == u16::from(*partition.total_shares())
}

#[quickcheck]
fn prop_people_alone_cannot_decrypt(people: ValidPeople) -> bool {
    let partition = compute_partition(people.total, people.minimal).unwrap();
    partition.people_shares() < *partition.minimal_shares()
}

#[quickcheck]
fn prop_dead_switch_with_quorum_can_decrypt(people: ValidPeople) -> bool {
    let partition = compute_partition(people.total, people.minimal).unwrap();
    u16::from(partition.dead_switch_shares()) + u16::from(people.minimal)
        >= u16::from(*partition.minimal_shares())
}

#[quickcheck]
fn prop_compute_is_deterministic(people: ValidPeople) -> bool {
    compute_partition(people.total, people.minimal).unwrap()
        == compute_partition(people.total, people.minimal).unwrap()
}

#[quickcheck]
fn prop_more_required_than_available_is_rejected(total: u8, excess: u8) -> bool {
    let minimal = total.saturating_add(excess.max(1));
    minimal == total || compute_partition(total, minimal).is_err()
}

#[test]
fn test_partition_grid() {
    for total in 1..=PeopleConfig::MAX_TOTAL {
        for minimal in 1..=total {
            let partition = compute_partition(total, minimal).unwrap();
            assert!(partition.check_invariants().is_ok(), "{total}/{minimal}");
        }
    }
}

#[test]
fn test_zero_people_is_rejected() {
    assert!(compute_partition(0, 0).is_err());
    assert!(compute_partition(3, 0).is_err());
}

#[test]
fn test_too_many_people_is_rejected() {
    assert!(compute_partition(PeopleConfig::MAX_TOTAL + 1, 1).is_err());
}
