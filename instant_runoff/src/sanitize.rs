use log::{debug, warn};
use snafu::prelude::*;

use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::{CandidateId, Roster};

/// A ballot after sanitation.
///
/// Invariant: `ranking` only contains known candidates, is sorted by rank
/// then by candidate, and every rank is between 1 and the number of candidates.
/// It only ever shrinks. An empty ranking is an exhausted ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Ballot {
    pub(crate) voter: String,
    pub(crate) ranking: Vec<(CandidateId, u32)>,
}

impl Ballot {
    pub(crate) fn is_exhausted(&self) -> bool {
        self.ranking.is_empty()
    }

    /// The continuing candidates that share the lowest remaining rank, in
    /// candidate order. Empty if the ballot has nothing left to say.
    pub(crate) fn top_choices(&self, active: &HashSet<CandidateId>) -> Vec<CandidateId> {
        let mut top: Vec<CandidateId> = Vec::new();
        let mut top_rank: Option<u32> = None;
        for (cid, rank) in self.ranking.iter() {
            if !active.contains(cid) {
                continue;
            }
            match top_rank {
                None => {
                    top_rank = Some(*rank);
                    top.push(*cid);
                }
                Some(r) if r == *rank => top.push(*cid),
                // Sorted by rank: nothing further can be at the top.
                Some(_) => break,
            }
        }
        top
    }

    /// Removes the given candidates from the ballot.
    pub(crate) fn remove(&mut self, eliminated: &HashSet<CandidateId>) {
        self.ranking.retain(|(cid, _)| !eliminated.contains(cid));
    }
}

/// Turns one preference value into a rank.
///
/// Returns `None` when the value expresses no preference: text or missing
/// values, ranks below 1 or above the number of candidates. Floats are rounded
/// to the nearest integer, halves away from zero.
///
/// ```
/// use instant_runoff::{sanitize_rank, RawPreference};
///
/// assert_eq!(sanitize_rank(&RawPreference::Float(1.5), 3), Some(2));
/// assert_eq!(sanitize_rank(&RawPreference::Integer(0), 3), None);
/// assert_eq!(sanitize_rank(&RawPreference::Text("1".to_string()), 3), None);
/// ```
pub fn sanitize_rank(value: &RawPreference, num_candidates: usize) -> Option<u32> {
    let rank: i64 = match value {
        RawPreference::Integer(x) => *x,
        RawPreference::Float(f) if f.is_finite() => {
            let r = f.round();
            if r < i64::MIN as f64 || r > i64::MAX as f64 {
                return None;
            }
            r as i64
        }
        RawPreference::Float(_) | RawPreference::Text(_) | RawPreference::Missing => {
            return None;
        }
    };
    if rank < 1 || rank > num_candidates as i64 {
        return None;
    }
    u32::try_from(rank).ok()
}

/// Sanitizes the preferences of one ballot against the registered candidates.
///
/// The rules are applied in this order for every entry:
/// - the value is turned into a rank (see [sanitize_rank]), or the entry is dropped;
/// - the candidate must be registered ([InvalidCandidateRule]);
/// - only the first entry for a given candidate is kept;
/// - a rank already taken by another candidate follows the [DuplicateRankRule].
pub(crate) fn sanitize_ballot(
    raw: &RawBallot,
    roster: &Roster,
    rules: &VoteRules,
) -> Result<Ballot, VotingErrors> {
    let num_candidates = roster.len();
    let mut seen_candidates: HashSet<CandidateId> = HashSet::new();
    let mut rank_holders: HashMap<u32, CandidateId> = HashMap::new();
    let mut ranking: Vec<(CandidateId, u32)> = Vec::new();

    for (name, value) in raw.preferences.iter() {
        let rank = match sanitize_rank(value, num_candidates) {
            Some(rank) => rank,
            None => {
                debug!(
                    "sanitize_ballot: {}: no preference for {:?} ({:?})",
                    raw.voter, name, value
                );
                continue;
            }
        };

        let cid = match (roster.lookup(name), rules.invalid_candidate_rule) {
            (Some(cid), _) => cid,
            (None, InvalidCandidateRule::Drop) => {
                warn!(
                    "sanitize_ballot: {}: dropping unknown candidate {:?}",
                    raw.voter, name
                );
                continue;
            }
            (None, InvalidCandidateRule::Reject) => {
                return InvalidCandidateSnafu {
                    voter: raw.voter.clone(),
                    name: name.clone(),
                }
                .fail();
            }
        };

        if !seen_candidates.insert(cid) {
            debug!(
                "sanitize_ballot: {}: {:?} is ranked more than once, keeping the first rank",
                raw.voter, name
            );
            continue;
        }

        if let Some(holder) = rank_holders.get(&rank) {
            match rules.duplicate_rank_rule {
                DuplicateRankRule::KeepFirst => {
                    warn!(
                        "sanitize_ballot: {}: rank {} already given to {:?}, dropping {:?}",
                        raw.voter,
                        rank,
                        roster.name(*holder),
                        name
                    );
                    continue;
                }
                DuplicateRankRule::Reject => {
                    return MalformedBallotSnafu {
                        voter: raw.voter.clone(),
                        rank,
                    }
                    .fail();
                }
                DuplicateRankRule::Split => {}
            }
        } else {
            rank_holders.insert(rank, cid);
        }
        ranking.push((cid, rank));
    }

    ranking.sort_by_key(|(cid, rank)| (*rank, *cid));
    Ok(Ballot {
        voter: raw.voter.clone(),
        ranking,
    })
}

/// Sanitizes a single set of preferences, outside of any tabulation.
///
/// The result lists the kept candidates by increasing rank.
///
/// ```
/// use instant_runoff::{sanitize_preferences, RawBallot, VoteRules};
///
/// let candidates = vec!["A".to_string(), "B".to_string(), "C".to_string()];
/// let ballot = RawBallot::new("v").rank("A", 0).rank("B", 2.4).rank("C", 3.6);
/// let ranks = sanitize_preferences(&ballot, &candidates, &VoteRules::DEFAULT_RULES)?;
/// assert_eq!(ranks, vec![("B".to_string(), 2)]);
/// # Ok::<(), instant_runoff::VotingErrors>(())
/// ```
pub fn sanitize_preferences(
    raw: &RawBallot,
    candidates: &[String],
    rules: &VoteRules,
) -> Result<Vec<(String, u32)>, VotingErrors> {
    let roster = Roster::new(candidates)?;
    let ballot = sanitize_ballot(raw, &roster, rules)?;
    Ok(ballot
        .ranking
        .iter()
        .map(|(cid, rank)| (roster.name(*cid).to_string(), *rank))
        .collect())
}
