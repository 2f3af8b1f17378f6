//! Derangement pairing generator.
//!
//! Assigns every participant exactly one other participant as a gift
//! receiver: the mapping is a bijection over the roster's name set with no
//! fixed points. Randomness comes from the operating system CSPRNG so the
//! operator cannot predict or reconstruct assignments.

use rand::rngs::OsRng;
use rand::Rng;
use tracing::debug;

use crate::roster::Roster;

/// A giver → receiver assignment over the full roster name set.
///
/// Assignments are kept sorted by giver name, so iteration order carries no
/// trace of the random construction order.
#[derive(Debug, Clone)]
pub struct Pairing {
    pairs: Vec<(String, String)>,
}

impl Pairing {
    /// Generate a pairing for a validated roster using the OS CSPRNG.
    ///
    /// The caller must have enforced the minimum roster size already; the
    /// generator itself has no error conditions and always terminates after
    /// one pass over the roster.
    pub fn generate(roster: &Roster) -> Self {
        Self::generate_with_rng(roster, &mut OsRng)
    }

    /// Generate a pairing with a caller-supplied random source.
    ///
    /// Iterative construction: each round draws an unused giver uniformly,
    /// then an unused receiver other than the giver. The penultimate round
    /// needs care -- if the drawn giver has already been picked as someone's
    /// receiver, a naive draw could leave the final two participants forced
    /// into a self-assignment. [`pick_final_receiver`] handles that case.
    pub fn generate_with_rng<R: Rng>(roster: &Roster, rng: &mut R) -> Self {
        let names = roster.names();
        let n = names.len();
        debug_assert!(n >= 2, "roster validation enforces a minimum of two");

        let mut givers: Vec<&str> = Vec::with_capacity(n);
        let mut receivers: Vec<&str> = Vec::with_capacity(n);

        while givers.len() < n {
            let unused: Vec<&str> = names
                .iter()
                .copied()
                .filter(|name| !givers.contains(name))
                .collect();
            let giver = unused[rng.gen_range(0..unused.len())];
            givers.push(giver);

            let receiver = match receivers.iter().position(|&r| r == giver) {
                Some(idx) if givers.len() == n - 1 => {
                    // The giver drawn for the second-to-last slot already
                    // receives from `upstream`. Exclude both from the
                    // remaining candidates and resolve deterministically.
                    let upstream = givers[idx];
                    let candidates: Vec<&str> = names
                        .iter()
                        .copied()
                        .filter(|name| {
                            !receivers.contains(name) && *name != giver && *name != upstream
                        })
                        .collect();
                    pick_final_receiver(&candidates, &givers, &receivers)
                }
                _ => {
                    let open: Vec<&str> = names
                        .iter()
                        .copied()
                        .filter(|name| !receivers.contains(name) && *name != giver)
                        .collect();
                    open[rng.gen_range(0..open.len())]
                }
            };
            receivers.push(receiver);
        }

        debug!(participants = n, "pairing generated");

        let mut pairs: Vec<(String, String)> = givers
            .into_iter()
            .zip(receivers)
            .map(|(g, r)| (g.to_string(), r.to_string()))
            .collect();
        pairs.sort_unstable();

        Self { pairs }
    }

    /// Assignments sorted by giver name.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(g, r)| (g.as_str(), r.as_str()))
    }

    /// Look up the receiver assigned to a giver.
    pub fn receiver_of(&self, giver: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(g, _)| g == giver)
            .map(|(_, r)| r.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Resolve the penultimate receiver draw.
///
/// `candidates` is the reduced set of names not yet receiving and distinct
/// from both the current giver and the giver's own giver -- two entries in
/// the general case, one when the giver's giver is still awaiting a
/// receiver (that lone candidate is then forced, and the final round pairs
/// the remaining giver with the giver's giver).
///
/// With two candidates, taking the first would sometimes make the receiver
/// set equal the giver set, which leaves the final participant giving to
/// themselves. Detect that and take the second instead.
fn pick_final_receiver<'a>(
    candidates: &[&'a str],
    givers: &[&str],
    receivers: &[&str],
) -> &'a str {
    if candidates.len() > 1 {
        let mut trial: Vec<&str> = receivers.to_vec();
        trial.push(candidates[0]);
        trial.sort_unstable();

        let mut sorted_givers: Vec<&str> = givers.to_vec();
        sorted_givers.sort_unstable();

        if trial == sorted_givers {
            return candidates[1];
        }
    }
    candidates[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Roster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn roster_of(names: &[&str]) -> Roster {
        let emails: Vec<String> = names
            .iter()
            .map(|n| format!("{}@example.com", n.to_lowercase()))
            .collect();
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        Roster::from_columns(names, emails).unwrap().0
    }

    fn assert_derangement(roster: &Roster, pairing: &Pairing) {
        let names: BTreeSet<&str> = roster.names().into_iter().collect();
        let givers: BTreeSet<&str> = pairing.assignments().map(|(g, _)| g).collect();
        let receivers: BTreeSet<&str> = pairing.assignments().map(|(_, r)| r).collect();

        assert_eq!(givers, names, "giver set must equal the roster name set");
        assert_eq!(receivers, names, "receiver set must equal the roster name set");
        for (giver, receiver) in pairing.assignments() {
            assert_ne!(giver, receiver, "no participant may give to themselves");
        }
    }

    #[test]
    fn test_two_participants_swap() {
        let roster = roster_of(&["Alice", "Bob"]);
        let mut rng = StdRng::seed_from_u64(7);
        let pairing = Pairing::generate_with_rng(&roster, &mut rng);
        assert_eq!(pairing.receiver_of("Alice"), Some("Bob"));
        assert_eq!(pairing.receiver_of("Bob"), Some("Alice"));
    }

    #[test]
    fn test_seeded_generation_is_a_derangement() {
        let roster = roster_of(&["Alice", "Bob", "Carol", "Dave", "Erin"]);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pairing = Pairing::generate_with_rng(&roster, &mut rng);
            assert_derangement(&roster, &pairing);
        }
    }

    #[test]
    fn test_os_rng_generation() {
        let roster = roster_of(&["Alice", "Bob", "Carol", "Dave"]);
        let pairing = Pairing::generate(&roster);
        assert_derangement(&roster, &pairing);
        assert_eq!(pairing.len(), 4);
    }

    #[test]
    fn test_assignments_sorted_by_giver() {
        let roster = roster_of(&["Dave", "Alice", "Carol", "Bob"]);
        let mut rng = StdRng::seed_from_u64(42);
        let pairing = Pairing::generate_with_rng(&roster, &mut rng);
        let givers: Vec<&str> = pairing.assignments().map(|(g, _)| g).collect();
        assert_eq!(givers, vec!["Alice", "Bob", "Carol", "Dave"]);
    }

    #[test]
    fn test_pick_final_receiver_avoids_forced_self_pair() {
        // Three of four givers drawn; receiver set {B, A} plus candidate C
        // would equal the giver set {A, C, B}, stranding D with D.
        let givers = vec!["A", "C", "B"];
        let receivers = vec!["B", "A"];
        let candidates = vec!["C", "D"];
        assert_eq!(pick_final_receiver(&candidates, &givers, &receivers), "D");
    }

    #[test]
    fn test_pick_final_receiver_takes_first_when_safe() {
        let givers = vec!["A", "B", "C"];
        let receivers = vec!["C", "A"];
        let candidates = vec!["D", "B"];
        assert_eq!(pick_final_receiver(&candidates, &givers, &receivers), "D");
    }

    #[test]
    fn test_pick_final_receiver_single_candidate() {
        let givers = vec!["A", "B", "C"];
        let receivers = vec!["C", "A"];
        let candidates = vec!["D"];
        assert_eq!(pick_final_receiver(&candidates, &givers, &receivers), "D");
    }
}
