//! Property coverage for the pairing generator.
//!
//! Every generated pairing must be a derangement of the roster name set:
//! giver set and receiver set both equal the full name set, and nobody is
//! assigned to themselves. The penultimate draw has a special case (chosen
//! giver already picked as a receiver) that these sweeps exercise many
//! times; with three participants it triggers in roughly half of all draw
//! orders.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use santapost_core::pairing::Pairing;
use santapost_core::roster::Roster;

// ===========================================================================
// Helpers
// ===========================================================================

const NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "Dave", "Erin", "Frank", "Grace", "Heidi",
];

fn roster_of_size(n: usize) -> Roster {
    let names: Vec<String> = NAMES[..n].iter().map(|s| s.to_string()).collect();
    let emails: Vec<String> = names
        .iter()
        .map(|name| format!("{}@example.com", name.to_lowercase()))
        .collect();
    Roster::from_columns(names, emails).expect("fixture roster is valid").0
}

fn assert_derangement(roster: &Roster, pairing: &Pairing) {
    let names: BTreeSet<&str> = roster.names().into_iter().collect();
    let givers: BTreeSet<&str> = pairing.assignments().map(|(g, _)| g).collect();
    let receivers: BTreeSet<&str> = pairing.assignments().map(|(_, r)| r).collect();

    assert_eq!(pairing.len(), roster.len(), "one assignment per participant");
    assert_eq!(givers, names, "giver set must equal the roster name set");
    assert_eq!(receivers, names, "receiver set must equal the roster name set");
    for (giver, receiver) in pairing.assignments() {
        assert_ne!(giver, receiver, "no participant may give to themselves");
    }
}

// ===========================================================================
// Repeated-generation stress (CSPRNG path)
// ===========================================================================

#[test]
fn stress_five_participants() {
    let roster = roster_of_size(5);
    for _ in 0..10_000 {
        let pairing = Pairing::generate(&roster);
        assert_derangement(&roster, &pairing);
    }
}

#[test]
fn stress_six_participants() {
    let roster = roster_of_size(6);
    for _ in 0..10_000 {
        let pairing = Pairing::generate(&roster);
        assert_derangement(&roster, &pairing);
    }
}

// ===========================================================================
// Seeded sweeps over every small roster size
// ===========================================================================

#[test]
fn seeded_sweep_all_small_sizes() {
    for n in 2..=6 {
        let roster = roster_of_size(n);
        for seed in 0..2_000u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pairing = Pairing::generate_with_rng(&roster, &mut rng);
            assert_derangement(&roster, &pairing);
        }
    }
}

#[test]
fn two_participants_always_swap() {
    let roster = roster_of_size(2);
    for seed in 0..64u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairing = Pairing::generate_with_rng(&roster, &mut rng);
        assert_eq!(pairing.receiver_of("Alice"), Some("Bob"));
        assert_eq!(pairing.receiver_of("Bob"), Some("Alice"));
    }
}

#[test]
fn three_participants_produce_exactly_the_two_cycles() {
    // The only derangements of three elements are the two 3-cycles. Over
    // many draw orders both must appear and nothing else may.
    let roster = roster_of_size(3);
    let mut seen: BTreeSet<Vec<(String, String)>> = BTreeSet::new();

    for seed in 0..2_000u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairing = Pairing::generate_with_rng(&roster, &mut rng);
        assert_derangement(&roster, &pairing);
        seen.insert(
            pairing
                .assignments()
                .map(|(g, r)| (g.to_string(), r.to_string()))
                .collect(),
        );
    }

    let cycle_one = vec![
        ("Alice".to_string(), "Bob".to_string()),
        ("Bob".to_string(), "Carol".to_string()),
        ("Carol".to_string(), "Alice".to_string()),
    ];
    let cycle_two = vec![
        ("Alice".to_string(), "Carol".to_string()),
        ("Bob".to_string(), "Alice".to_string()),
        ("Carol".to_string(), "Bob".to_string()),
    ];

    assert!(seen.contains(&cycle_one), "first 3-cycle never produced");
    assert!(seen.contains(&cycle_two), "second 3-cycle never produced");
    assert_eq!(seen.len(), 2, "only the two 3-cycles are valid for N=3");
}

// ===========================================================================
// Inversion round-trip
// ===========================================================================

#[test]
fn inverted_pairing_is_a_bijection() {
    for n in 2..=6 {
        let roster = roster_of_size(n);
        for seed in 0..500u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pairing = Pairing::generate_with_rng(&roster, &mut rng);

            let mut inverted: BTreeMap<&str, &str> = BTreeMap::new();
            for (giver, receiver) in pairing.assignments() {
                let previous = inverted.insert(receiver, giver);
                assert!(
                    previous.is_none(),
                    "receiver '{receiver}' assigned to more than one giver"
                );
            }

            let names: BTreeSet<&str> = roster.names().into_iter().collect();
            let inverted_keys: BTreeSet<&str> = inverted.keys().copied().collect();
            assert_eq!(inverted_keys, names);
        }
    }
}
