use log::debug;

use crate::count::{Tally, VoteCount};
use crate::{CandidateId, EliminationAlgorithm, Roster, TieBreakMode, VoteRules};

/// The decision taken by the selector for one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) enum Selection {
    /// The candidates to remove in this round, in candidate order.
    Eliminate(Vec<CandidateId>),
    /// All the continuing candidates have the same count: nobody can be
    /// separated from the others.
    AllTied(Vec<CandidateId>),
}

/// Finds the candidates with the fewest votes.
pub(crate) fn select_eliminated(
    tally: &Tally,
    rules: &VoteRules,
    roster: &Roster,
    num_round: u32,
) -> Selection {
    let everybody: Vec<CandidateId> = tally.iter().map(|(cid, _)| *cid).collect();
    if tally.all_equal() {
        debug!(
            "select_eliminated: all {} candidates are tied",
            tally.len()
        );
        return Selection::AllTied(everybody);
    }

    let min_count: VoteCount = match tally.min_count() {
        Some(vc) => vc,
        None => return Selection::AllTied(everybody),
    };
    let all_smallest: Vec<CandidateId> = tally
        .iter()
        .filter_map(|(cid, vc)| if *vc == min_count { Some(*cid) } else { None })
        .collect();
    debug!("select_eliminated: all_smallest: {:?}", all_smallest);

    // No tiebreak, the logic below is not relevant.
    if all_smallest.len() == 1 || rules.elimination_algorithm == EliminationAlgorithm::Batch {
        return Selection::Eliminate(all_smallest);
    }

    let queue = tiebreak_order(&all_smallest, rules.tiebreak_mode, roster, num_round);
    debug!(
        "select_eliminated: elimination queue with tiebreak mode {:?}: {:?}",
        rules.tiebreak_mode, queue
    );
    Selection::Eliminate(queue.into_iter().take(1).collect())
}

/// Orders the tied candidates: the first one is the first to be eliminated.
fn tiebreak_order(
    tied: &[CandidateId],
    mode: TieBreakMode,
    roster: &Roster,
    num_round: u32,
) -> Vec<CandidateId> {
    let mut res: Vec<CandidateId> = tied.to_vec();
    match mode {
        TieBreakMode::UseCandidateOrder => {
            // Candidate ids follow the registration order.
            res.sort();
            res.reverse();
        }
        TieBreakMode::Lexical => {
            res.sort_by(|a, b| roster.name(*b).cmp(roster.name(*a)));
        }
        TieBreakMode::Random(seed) => {
            res = candidate_permutation_crypto(&res, roster, seed, num_round);
        }
    }
    res
}

/// Generates a "random" permutation of the candidates. Random in this context means hard to guess in advance.
/// Each candidate is keyed by the SHA-256 digest of the seed, the round and its name.
fn candidate_permutation_crypto(
    candidates: &[CandidateId],
    roster: &Roster,
    seed: u32,
    num_round: u32,
) -> Vec<CandidateId> {
    let mut data: Vec<(String, CandidateId)> = candidates
        .iter()
        .map(|cid| {
            let key = format!("{:08}{:08}{}", seed, num_round, roster.name(*cid));
            (sha256::digest(key), *cid)
        })
        .collect();
    data.sort();
    data.into_iter().map(|(_, cid)| cid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::compute_tally;
    use crate::sanitize::Ballot;

    fn roster() -> Roster {
        Roster::new(&[
            "A".to_string(),
            "C".to_string(),
            "B".to_string(),
            "D".to_string(),
        ])
        .unwrap()
    }

    // One ballot per vote, with a single preference.
    fn tally_of(votes: &[(u32, u32)]) -> Tally {
        let mut ballots: Vec<Ballot> = Vec::new();
        for (cid, count) in votes.iter() {
            for _ in 0..*count {
                ballots.push(Ballot {
                    voter: "v".to_string(),
                    ranking: vec![(CandidateId(*cid), 1)],
                });
            }
        }
        let active: Vec<CandidateId> = votes.iter().map(|(cid, _)| CandidateId(*cid)).collect();
        compute_tally(&ballots, &active)
    }

    fn single(mode: TieBreakMode) -> VoteRules {
        VoteRules {
            elimination_algorithm: EliminationAlgorithm::Single,
            tiebreak_mode: mode,
            ..VoteRules::DEFAULT_RULES
        }
    }

    #[test]
    fn unique_minimum() {
        let tally = tally_of(&[(0, 2), (1, 2), (2, 1)]);
        assert_eq!(
            select_eliminated(&tally, &VoteRules::DEFAULT_RULES, &roster(), 1),
            Selection::Eliminate(vec![CandidateId(2)])
        );
    }

    #[test]
    fn batch_eliminates_all_tied_at_the_bottom() {
        let tally = tally_of(&[(0, 3), (1, 1), (2, 2), (3, 1)]);
        assert_eq!(
            select_eliminated(&tally, &VoteRules::DEFAULT_RULES, &roster(), 1),
            Selection::Eliminate(vec![CandidateId(1), CandidateId(3)])
        );
    }

    #[test]
    fn everybody_tied() {
        let tally = tally_of(&[(0, 1), (1, 1)]);
        assert_eq!(
            select_eliminated(&tally, &VoteRules::DEFAULT_RULES, &roster(), 1),
            Selection::AllTied(vec![CandidateId(0), CandidateId(1)])
        );
        let tally = tally_of(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(
            select_eliminated(&tally, &single(TieBreakMode::Lexical), &roster(), 1),
            Selection::AllTied(vec![CandidateId(0), CandidateId(1), CandidateId(2)])
        );
    }

    #[test]
    fn single_elimination_tiebreaks() {
        // C (id 1) and D (id 3) are tied at the bottom.
        let tally = tally_of(&[(0, 3), (1, 1), (2, 2), (3, 1)]);
        assert_eq!(
            select_eliminated(&tally, &single(TieBreakMode::UseCandidateOrder), &roster(), 1),
            Selection::Eliminate(vec![CandidateId(3)])
        );
        // A, C, B, D: lexically, D is the greatest name.
        assert_eq!(
            select_eliminated(&tally, &single(TieBreakMode::Lexical), &roster(), 1),
            Selection::Eliminate(vec![CandidateId(3)])
        );
        let tally = tally_of(&[(0, 3), (1, 1), (2, 1)]);
        assert_eq!(
            select_eliminated(&tally, &single(TieBreakMode::Lexical), &roster(), 1),
            Selection::Eliminate(vec![CandidateId(1)])
        );
    }

    #[test]
    fn random_tiebreak_is_reproducible() {
        let tally = tally_of(&[(0, 3), (1, 1), (2, 1), (3, 1)]);
        let rules = single(TieBreakMode::Random(42));
        let first = select_eliminated(&tally, &rules, &roster(), 2);
        for _ in 0..5 {
            assert_eq!(select_eliminated(&tally, &rules, &roster(), 2), first);
        }
        match first {
            Selection::Eliminate(v) => {
                assert_eq!(v.len(), 1);
                assert_ne!(v[0], CandidateId(0));
            }
            Selection::AllTied(_) => panic!("unexpected tie"),
        }
    }
}
