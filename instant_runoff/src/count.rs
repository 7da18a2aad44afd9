use log::debug;
use num_rational::Ratio;

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    ops::{Add, AddAssign},
};

use crate::sanitize::Ballot;
use crate::{CandidateId, MajorityRule};

/// A number of votes.
///
/// Votes are whole numbers unless a ballot splits its vote between candidates
/// ranked at the same level. Counts are exact fractions, so equal shares always
/// compare equal.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct VoteCount(Ratio<u64>);

impl VoteCount {
    pub const EMPTY: VoteCount = VoteCount(Ratio::new_raw(0, 1));
    pub const ONE: VoteCount = VoteCount(Ratio::new_raw(1, 1));

    pub fn whole(votes: u64) -> VoteCount {
        VoteCount(Ratio::from_integer(votes))
    }

    /// The count `numer / denom`. Returns `None` for a zero denominator.
    pub fn fraction(numer: u64, denom: u64) -> Option<VoteCount> {
        if denom == 0 {
            None
        } else {
            Some(VoteCount(Ratio::new(numer, denom)))
        }
    }

    pub fn is_whole(self) -> bool {
        self.0.is_integer()
    }

    pub fn as_f64(self) -> f64 {
        *self.0.numer() as f64 / *self.0.denom() as f64
    }

    /// Splits this count into `parts` equal shares.
    ///
    /// ```
    /// use instant_runoff::VoteCount;
    ///
    /// let shares = VoteCount::ONE.split(3);
    /// assert_eq!(shares.iter().cloned().sum::<VoteCount>(), VoteCount::ONE);
    /// assert_eq!(shares[0], shares[2]);
    /// assert_eq!(shares[0], VoteCount::fraction(1, 3).unwrap());
    /// ```
    pub fn split(self, parts: usize) -> Vec<VoteCount> {
        if parts == 0 {
            return Vec::new();
        }
        let share = VoteCount(self.0 / Ratio::from_integer(parts as u64));
        vec![share; parts]
    }
}

impl Default for VoteCount {
    fn default() -> Self {
        VoteCount::EMPTY
    }
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(VoteCount::EMPTY, |acc, vc| acc + vc)
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

/// Whole counts are printed as integers, the others with at most 4 decimals.
impl Display for VoteCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.0.to_integer())
        } else {
            let digits = format!("{:.4}", self.as_f64());
            write!(f, "{}", digits.trim_end_matches('0').trim_end_matches('.'))
        }
    }
}

/// The first-choice votes of the continuing candidates for one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Tally {
    // In candidate order.
    counts: Vec<(CandidateId, VoteCount)>,
    continuing_ballots: u64,
}

impl Tally {
    pub(crate) fn iter(&self) -> impl Iterator<Item = &(CandidateId, VoteCount)> {
        self.counts.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    pub(crate) fn get(&self, cid: CandidateId) -> Option<VoteCount> {
        self.counts
            .iter()
            .find(|(c, _)| *c == cid)
            .map(|(_, vc)| *vc)
    }

    pub(crate) fn total(&self) -> VoteCount {
        self.counts.iter().map(|(_, vc)| *vc).sum()
    }

    pub(crate) fn continuing_ballots(&self) -> u64 {
        self.continuing_ballots
    }

    pub(crate) fn min_count(&self) -> Option<VoteCount> {
        self.counts.iter().map(|(_, vc)| *vc).min()
    }

    /// True if every continuing candidate has exactly the same count.
    pub(crate) fn all_equal(&self) -> bool {
        match self.counts.first() {
            Some((_, first)) => self.counts.iter().all(|(_, vc)| vc == first),
            None => true,
        }
    }

    /// The share of the continuing ballots held by each candidate, in percent.
    ///
    /// Everybody gets 0 when no ballot is continuing.
    pub(crate) fn percentages(&self) -> Vec<(CandidateId, f64)> {
        let denominator = VoteCount::whole(self.continuing_ballots);
        self.counts
            .iter()
            .map(|(cid, vc)| {
                let pct = if denominator == VoteCount::EMPTY {
                    0.0
                } else {
                    vc.as_f64() / denominator.as_f64() * 100.0
                };
                (*cid, pct)
            })
            .collect()
    }
}

/// Computes the tally for the given continuing candidates.
///
/// Every ballot that still ranks a continuing candidate gives one vote to the
/// candidate with its lowest rank. If several continuing candidates share that
/// rank, the vote is split equally between them.
pub(crate) fn compute_tally(ballots: &[Ballot], active: &[CandidateId]) -> Tally {
    let active_set: HashSet<CandidateId> = active.iter().cloned().collect();
    // Initialize the tally with the current candidates to capture all the candidates who do
    // not even have a vote.
    let mut counts: HashMap<CandidateId, VoteCount> =
        active.iter().map(|cid| (*cid, VoteCount::EMPTY)).collect();
    let mut continuing_ballots: u64 = 0;
    for ballot in ballots.iter() {
        let top = ballot.top_choices(&active_set);
        if top.is_empty() {
            continue;
        }
        continuing_ballots += 1;
        for (cid, share) in top.iter().zip(VoteCount::ONE.split(top.len())) {
            if let Some(vc) = counts.get_mut(cid) {
                *vc += share;
            }
        }
    }
    let tally = Tally {
        counts: active
            .iter()
            .map(|cid| (*cid, counts.get(cid).cloned().unwrap_or(VoteCount::EMPTY)))
            .collect(),
        continuing_ballots,
    };
    debug!("compute_tally: {:?}", tally);
    tally
}

/// Checks a count against the majority rule, using exact arithmetic.
///
/// Nobody has a majority of zero ballots.
pub(crate) fn has_majority(count: VoteCount, total: VoteCount, rule: MajorityRule) -> bool {
    if total == VoteCount::EMPTY {
        return false;
    }
    match rule {
        MajorityRule::StrictMajority => count.0 * 2 > total.0,
        MajorityRule::AtLeastHalf => count.0 * 2 >= total.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot(ranking: &[(u32, u32)]) -> Ballot {
        Ballot {
            voter: "v".to_string(),
            ranking: ranking
                .iter()
                .map(|(cid, rank)| (CandidateId(*cid), *rank))
                .collect(),
        }
    }

    fn ids(xs: &[u32]) -> Vec<CandidateId> {
        xs.iter().map(|x| CandidateId(*x)).collect()
    }

    #[test]
    fn display_vote_counts() {
        assert_eq!(VoteCount::whole(3).to_string(), "3");
        assert_eq!(VoteCount::fraction(3, 2).unwrap().to_string(), "1.5");
        assert_eq!(VoteCount::fraction(4, 3).unwrap().to_string(), "1.3333");
        assert_eq!(VoteCount::fraction(2, 3).unwrap().to_string(), "0.6667");
        assert_eq!(VoteCount::EMPTY.to_string(), "0");
        assert_eq!(VoteCount::fraction(1, 0), None);
    }

    #[test]
    fn split_keeps_the_total() {
        let shares = VoteCount::whole(2).split(3);
        assert_eq!(shares.len(), 3);
        assert_eq!(shares.iter().cloned().sum::<VoteCount>(), VoteCount::whole(2));
        assert!(shares.iter().all(|vc| *vc == VoteCount::fraction(2, 3).unwrap()));
        assert!(VoteCount::ONE.split(0).is_empty());
    }

    #[test]
    fn tally_counts_first_choices() {
        let ballots = vec![
            ballot(&[(0, 1), (1, 2)]),
            ballot(&[(1, 1)]),
            ballot(&[(1, 1), (2, 2)]),
            ballot(&[]),
        ];
        let tally = compute_tally(&ballots, &ids(&[0, 1, 2]));
        assert_eq!(tally.get(CandidateId(0)), Some(VoteCount::whole(1)));
        assert_eq!(tally.get(CandidateId(1)), Some(VoteCount::whole(2)));
        assert_eq!(tally.get(CandidateId(2)), Some(VoteCount::EMPTY));
        assert_eq!(tally.continuing_ballots(), 3);
        assert_eq!(tally.total(), VoteCount::whole(3));
    }

    #[test]
    fn tally_skips_inactive_candidates() {
        let ballots = vec![ballot(&[(0, 1), (2, 3)])];
        let tally = compute_tally(&ballots, &ids(&[1, 2]));
        assert_eq!(tally.get(CandidateId(2)), Some(VoteCount::ONE));
        assert_eq!(tally.get(CandidateId(0)), None);
    }

    #[test]
    fn tally_splits_tied_preferences() {
        let ballots = vec![ballot(&[(0, 1), (1, 1), (2, 2)]), ballot(&[(2, 1)])];
        let tally = compute_tally(&ballots, &ids(&[0, 1, 2]));
        let half = VoteCount::fraction(1, 2);
        assert_eq!(tally.get(CandidateId(0)), half);
        assert_eq!(tally.get(CandidateId(1)), half);
        assert_eq!(tally.total(), VoteCount::whole(2));
    }

    #[test]
    fn three_way_split_is_all_equal() {
        let ballots = vec![ballot(&[(0, 1), (1, 1), (2, 1)])];
        let tally = compute_tally(&ballots, &ids(&[0, 1, 2]));
        assert!(tally.all_equal());
        assert_eq!(tally.get(CandidateId(2)), VoteCount::fraction(1, 3));
        assert_eq!(tally.total(), VoteCount::ONE);
    }

    #[test]
    fn percentages_of_empty_tally() {
        let tally = compute_tally(&[], &ids(&[0, 1]));
        assert!(tally.all_equal());
        assert_eq!(
            tally.percentages(),
            vec![(CandidateId(0), 0.0), (CandidateId(1), 0.0)]
        );
    }

    #[test]
    fn percentages_use_continuing_ballots() {
        let ballots = vec![
            ballot(&[(0, 1)]),
            ballot(&[(0, 1)]),
            ballot(&[(1, 1)]),
            ballot(&[(1, 1)]),
        ];
        let tally = compute_tally(&ballots, &ids(&[0, 1]));
        assert_eq!(
            tally.percentages(),
            vec![(CandidateId(0), 50.0), (CandidateId(1), 50.0)]
        );
    }

    #[test]
    fn majority_rules() {
        let half = VoteCount::whole(2);
        let total = VoteCount::whole(4);
        assert!(!has_majority(half, total, MajorityRule::StrictMajority));
        assert!(has_majority(half, total, MajorityRule::AtLeastHalf));
        assert!(has_majority(VoteCount::whole(3), total, MajorityRule::StrictMajority));
        assert!(!has_majority(VoteCount::EMPTY, VoteCount::EMPTY, MajorityRule::AtLeastHalf));
    }
}
