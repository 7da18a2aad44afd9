use log::debug;

use std::collections::{BTreeMap, HashSet};

use crate::count::VoteCount;
use crate::sanitize::Ballot;
use crate::CandidateId;

/// Where the votes of one eliminated candidate went.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub(crate) struct Transfers {
    pub(crate) to: BTreeMap<CandidateId, VoteCount>,
    pub(crate) exhausted: VoteCount,
}

/// The outcome of removing candidates from all the ballots.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Redistribution {
    pub(crate) eliminated: Vec<CandidateId>,
    pub(crate) transfers: BTreeMap<CandidateId, Transfers>,
    pub(crate) newly_exhausted: u64,
}

/// Removes the eliminated candidates from every ballot.
///
/// This is destructive: the ranks of the eliminated candidates are lost. Ballots
/// left without any continuing candidate become exhausted but stay in the
/// collection. For every ballot whose current top choice was eliminated, the
/// share of that candidate is recorded as transferred to the new top choice(s)
/// of the ballot, or as exhausted.
pub(crate) fn redistribute(
    ballots: &mut [Ballot],
    eliminated: &[CandidateId],
    continuing: &[CandidateId],
) -> Redistribution {
    let eliminated_set: HashSet<CandidateId> = eliminated.iter().cloned().collect();
    let active_after: HashSet<CandidateId> = continuing.iter().cloned().collect();
    let active_before: HashSet<CandidateId> = active_after
        .iter()
        .chain(eliminated.iter())
        .cloned()
        .collect();

    let mut transfers: BTreeMap<CandidateId, Transfers> = eliminated
        .iter()
        .map(|cid| (*cid, Transfers::default()))
        .collect();
    let mut newly_exhausted: u64 = 0;

    for ballot in ballots.iter_mut() {
        let old_top = ballot.top_choices(&active_before);
        ballot.remove(&eliminated_set);
        if old_top.is_empty() {
            // Already exhausted before this round.
            continue;
        }
        let moved: Vec<(CandidateId, VoteCount)> = old_top
            .iter()
            .cloned()
            .zip(VoteCount::ONE.split(old_top.len()))
            .filter(|(cid, _)| eliminated_set.contains(cid))
            .collect();
        if moved.is_empty() {
            // Nothing to do, the first choice is the same.
            continue;
        }

        let new_top = ballot.top_choices(&active_after);
        if new_top.is_empty() {
            debug!("redistribute: ballot of {} is now exhausted", ballot.voter);
            newly_exhausted += 1;
        }
        for (from, share) in moved {
            let stats = transfers.entry(from).or_default();
            if new_top.is_empty() {
                stats.exhausted += share;
            } else {
                for (to, part) in new_top.iter().zip(share.split(new_top.len())) {
                    *stats.to.entry(*to).or_insert(VoteCount::EMPTY) += part;
                }
            }
        }
    }

    debug!(
        "redistribute: eliminated {:?}, transfers: {:?}, newly exhausted: {}",
        eliminated, transfers, newly_exhausted
    );
    Redistribution {
        eliminated: eliminated.to_vec(),
        transfers,
        newly_exhausted,
    }
}
