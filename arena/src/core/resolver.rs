//! Converts noisy free-text ballots into one concrete participant target.
//!
//! Agent output is unstructured natural language, so resolution is a
//! plurality vote over normalized ballot text with a fuzzy containment match
//! against the eligible identifiers, not exact-identifier matching. The
//! tie-break and fallback policy lives here once and is reused identically
//! for the werewolf kill and the village exile.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::core::error::GameError;

/// Resolve `raw_votes` to a single identifier from `eligible`.
///
/// 1. Normalize each ballot: trim and case-fold; empty ballots are
///    discarded.
/// 2. Tally identical normalized ballots.
/// 3. Tie-break uniformly at random among the ballots with the maximum
///    count.
/// 4. Fuzzy-resolve the winning ballot to the first eligible identifier, in
///    sorted order, whose case-folded form contains the ballot as a
///    substring.
/// 5. If nothing matches (garbage ballots, or no ballots at all), pick
///    uniformly at random among the eligible identifiers for which
///    `exclude_from_fallback` is false; if the predicate excludes
///    everything, the whole eligible set is used instead.
///
/// The only error is [`GameError::NoEligibleTargets`] for an empty eligible
/// set, a degenerate state the termination check makes unreachable in a
/// well-formed match.
pub fn resolve_votes<R, F>(
    raw_votes: &[String],
    eligible: &BTreeSet<String>,
    exclude_from_fallback: F,
    rng: &mut R,
) -> Result<String, GameError>
where
    R: Rng,
    F: Fn(&str) -> bool,
{
    if eligible.is_empty() {
        return Err(GameError::NoEligibleTargets);
    }

    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    for vote in raw_votes {
        let ballot = vote.trim().to_lowercase();
        if ballot.is_empty() {
            continue;
        }
        *tally.entry(ballot).or_insert(0) += 1;
    }

    if let Some(top) = tally.values().copied().max() {
        let tied: Vec<&String> = tally
            .iter()
            .filter(|(_, count)| **count == top)
            .map(|(ballot, _)| ballot)
            .collect();
        if let Some(ballot) = tied.choose(rng)
            && let Some(target) = eligible
                .iter()
                .find(|id| id.to_lowercase().contains(ballot.as_str()))
        {
            return Ok(target.clone());
        }
    }

    let mut pool: Vec<&String> = eligible
        .iter()
        .filter(|id| !exclude_from_fallback(id))
        .collect();
    if pool.is_empty() {
        pool = eligible.iter().collect();
    }
    let picked = pool
        .choose(rng)
        .expect("fallback pool is non-empty when eligible is non-empty");
    Ok((*picked).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn eligible(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn votes(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|v| v.to_string()).collect()
    }

    /// Normalization collapses case and whitespace variants into one tally
    /// bucket, and containment matching resolves the partial name.
    #[test]
    fn normalized_variants_resolve_to_one_identifier() {
        let targets = eligible(&["Alice-the-Bold"]);
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolved = resolve_votes(
                &votes(&["alice", "ALICE ", " alice"]),
                &targets,
                |_| false,
                &mut rng,
            )
            .expect("resolve");
            assert_eq!(resolved, "Alice-the-Bold");
        }
    }

    /// A two-way tie resolves to either candidate with a randomized break,
    /// never a third identifier, and both sides occur over many trials.
    #[test]
    fn tie_break_is_random_but_bounded() {
        let targets = eligible(&["Bob", "Carol"]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut bob = 0;
        let mut carol = 0;
        for _ in 0..200 {
            match resolve_votes(&votes(&["bob", "carol"]), &targets, |_| false, &mut rng)
                .expect("resolve")
                .as_str()
            {
                "Bob" => bob += 1,
                "Carol" => carol += 1,
                other => panic!("unexpected target {other}"),
            }
        }
        assert!(bob > 50, "bob won {bob} of 200");
        assert!(carol > 50, "carol won {carol} of 200");
    }

    #[test]
    fn garbage_ballots_fall_back_to_an_eligible_identifier() {
        let targets = eligible(&["Bob", "Carol"]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let resolved =
                resolve_votes(&votes(&["zzz-unmatchable"]), &targets, |_| false, &mut rng)
                    .expect("resolve");
            assert!(targets.contains(&resolved));
        }
    }

    #[test]
    fn fallback_respects_the_exclusion_predicate() {
        let targets = eligible(&["Bob", "Carol", "Wolfie"]);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let resolved = resolve_votes(
                &votes(&["zzz-unmatchable"]),
                &targets,
                |id| id == "Wolfie",
                &mut rng,
            )
            .expect("resolve");
            assert_ne!(resolved, "Wolfie");
        }
    }

    #[test]
    fn fallback_ignores_a_predicate_that_excludes_everything() {
        let targets = eligible(&["Bob"]);
        let mut rng = StdRng::seed_from_u64(0);
        let resolved =
            resolve_votes(&votes(&["zzz"]), &targets, |_| true, &mut rng).expect("resolve");
        assert_eq!(resolved, "Bob");
    }

    #[test]
    fn no_ballots_at_all_still_resolves() {
        let targets = eligible(&["Bob", "Carol"]);
        let mut rng = StdRng::seed_from_u64(5);
        let resolved = resolve_votes(&[], &targets, |_| false, &mut rng).expect("resolve");
        assert!(targets.contains(&resolved));
    }

    #[test]
    fn whitespace_only_ballots_are_discarded() {
        let targets = eligible(&["Bob", "Carol"]);
        let mut rng = StdRng::seed_from_u64(9);
        // "  \n" must not become an empty ballot that substring-matches
        // every identifier; "carol" should win the tally outright.
        let resolved = resolve_votes(
            &votes(&["  \n", "   ", "carol"]),
            &targets,
            |_| false,
            &mut rng,
        )
        .expect("resolve");
        assert_eq!(resolved, "Carol");
    }

    #[test]
    fn empty_eligible_set_is_an_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = resolve_votes(&votes(&["bob"]), &BTreeSet::new(), |_| false, &mut rng)
            .unwrap_err();
        assert_eq!(err, GameError::NoEligibleTargets);
    }

    /// Plurality beats fuzzier matches: two ballots for carol outweigh one
    /// for bob even though both would containment-match.
    #[test]
    fn plurality_wins_over_minority_ballots() {
        let targets = eligible(&["Bob", "Carol"]);
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolved = resolve_votes(
                &votes(&["carol", "bob", "Carol"]),
                &targets,
                |_| false,
                &mut rng,
            )
            .expect("resolve");
            assert_eq!(resolved, "Carol");
        }
    }
}
