pub mod builder;
mod config;
mod count;
mod elimination;
mod history;
pub mod manual;
mod redistribution;
mod sanitize;

use log::{debug, info, warn};

use std::collections::HashMap;

pub use crate::config::*;
pub use crate::count::VoteCount;
pub use crate::sanitize::{sanitize_preferences, sanitize_rank};

use crate::count::{compute_tally, has_majority, Tally};
use crate::elimination::{select_eliminated, Selection};
use crate::history::RoundHistory;
use crate::redistribution::{redistribute, Redistribution};
use crate::sanitize::{sanitize_ballot, Ballot};

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

/// The registered candidates. A candidate id is its position in the list.
#[derive(Eq, PartialEq, Debug, Clone)]
struct Roster {
    names: Vec<String>,
    ids: HashMap<String, CandidateId>,
}

impl Roster {
    fn new(names: &[String]) -> Result<Roster, VotingErrors> {
        let mut ids: HashMap<String, CandidateId> = HashMap::new();
        for (idx, name) in names.iter().enumerate() {
            if ids.insert(name.clone(), CandidateId(idx as u32)).is_some() {
                return Err(VotingErrors::DuplicateCandidate { name: name.clone() });
            }
        }
        Ok(Roster {
            names: names.to_vec(),
            ids,
        })
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn lookup(&self, name: &str) -> Option<CandidateId> {
        self.ids.get(name).cloned()
    }

    fn name(&self, cid: CandidateId) -> &str {
        self.names[cid.0 as usize].as_str()
    }

    fn ids(&self) -> Vec<CandidateId> {
        (0..self.names.len() as u32).map(CandidateId).collect()
    }

    fn names_of(&self, cids: &[CandidateId]) -> Vec<String> {
        cids.iter().map(|cid| self.name(*cid).to_string()).collect()
    }
}

/// The states of a tabulation.
///
/// `Initial -> Tallying -> (MajorityFound | AllTied | Eliminating) -> Tallying -> ... -> Terminated`
#[derive(PartialEq, Debug, Clone)]
enum TabulationState {
    Initial,
    /// Counting the votes. Carries the elimination that led to this count, if any.
    Tallying(Option<Redistribution>),
    MajorityFound {
        winner: CandidateId,
        by_majority: bool,
    },
    AllTied(Vec<CandidateId>),
    Eliminating(Vec<CandidateId>),
    Terminated(Outcome),
}

/// The state of one election, exclusively owned by one tabulation.
struct Election<'a> {
    rules: &'a VoteRules,
    raw_ballots: &'a [RawBallot],
    roster: Roster,
    // The continuing candidates, in candidate order.
    active: Vec<CandidateId>,
    ballots: Vec<Ballot>,
    history: RoundHistory,
    warnings: Vec<TabulationWarning>,
}

impl<'a> Election<'a> {
    fn new(
        candidates: &[String],
        raw_ballots: &'a [RawBallot],
        rules: &'a VoteRules,
    ) -> Result<Election<'a>, VotingErrors> {
        if candidates.is_empty() {
            return Err(VotingErrors::EmptyElection {});
        }
        let roster = Roster::new(candidates)?;
        Ok(Election {
            rules,
            raw_ballots,
            active: roster.ids(),
            roster,
            ballots: Vec::new(),
            history: RoundHistory::new(),
            warnings: Vec::new(),
        })
    }

    fn step(&mut self, state: TabulationState) -> Result<TabulationState, VotingErrors> {
        let next = match state {
            TabulationState::Initial => {
                self.load()?;
                TabulationState::Tallying(None)
            }
            TabulationState::Tallying(previous) => {
                let tally = self.tally_and_record(previous);
                self.decide(&tally)
            }
            TabulationState::Eliminating(eliminated) => {
                TabulationState::Tallying(Some(self.eliminate(&eliminated)))
            }
            TabulationState::MajorityFound {
                winner,
                by_majority,
            } => {
                let name = self.roster.name(winner).to_string();
                info!(
                    "Round {}: {} is elected{}",
                    self.history.len(),
                    name,
                    if by_majority { "" } else { " by default" }
                );
                TabulationState::Terminated(Outcome::Winner {
                    name,
                    final_percentages: self
                        .history
                        .last()
                        .map(|r| r.percentages.clone())
                        .unwrap_or_default(),
                    by_majority,
                })
            }
            TabulationState::AllTied(cids) => {
                let tied_winners = self.roster.names_of(&cids);
                info!(
                    "Round {}: tie between {:?}",
                    self.history.len(),
                    tied_winners
                );
                TabulationState::Terminated(Outcome::Tie { tied_winners })
            }
            TabulationState::Terminated(outcome) => TabulationState::Terminated(outcome),
        };
        Ok(next)
    }

    fn load(&mut self) -> Result<(), VotingErrors> {
        if self.raw_ballots.is_empty() {
            warn!("No ballots were provided, all the candidates are tied");
            self.warnings.push(TabulationWarning::NoBallots);
        }
        let mut ballots: Vec<Ballot> = Vec::with_capacity(self.raw_ballots.len());
        for raw in self.raw_ballots.iter() {
            ballots.push(sanitize_ballot(raw, &self.roster, self.rules)?);
        }
        let empty = ballots.iter().filter(|b| b.is_exhausted()).count() as u64;
        if empty > 0 {
            warn!("{} ballots do not contain any valid preference", empty);
            self.warnings
                .push(TabulationWarning::EmptyBallots { count: empty });
        }
        info!(
            "Loaded {} ballots for {} candidates",
            ballots.len(),
            self.roster.len()
        );
        self.ballots = ballots;
        Ok(())
    }

    fn tally_and_record(&mut self, previous: Option<Redistribution>) -> Tally {
        let tally = compute_tally(&self.ballots, &self.active);
        let (eliminated, transfers) = match previous {
            Some(r) => (
                self.roster.names_of(&r.eliminated),
                self.elimination_stats(&r),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let continuing = tally.continuing_ballots();
        let round = self.history.record(
            eliminated,
            transfers,
            tally
                .iter()
                .map(|(cid, vc)| (self.roster.name(*cid).to_string(), *vc))
                .collect(),
            tally
                .percentages()
                .iter()
                .map(|(cid, pct)| (self.roster.name(*cid).to_string(), *pct))
                .collect(),
            continuing,
            self.ballots.len() as u64 - continuing,
        );
        info!(
            "Round {} ({} continuing ballots): {:?}",
            round.round, round.continuing_ballots, round.tally
        );
        tally
    }

    fn elimination_stats(&self, r: &Redistribution) -> Vec<EliminationStats> {
        r.transfers
            .iter()
            .map(|(from, t)| EliminationStats {
                name: self.roster.name(*from).to_string(),
                transfers: t
                    .to
                    .iter()
                    .map(|(to, vc)| (self.roster.name(*to).to_string(), *vc))
                    .collect(),
                exhausted: t.exhausted,
            })
            .collect()
    }

    fn decide(&self, tally: &Tally) -> TabulationState {
        // Only one candidate. It is the winner by any standard.
        if let [winner] = self.active.as_slice() {
            let by_majority = has_majority(
                tally.get(*winner).unwrap_or(VoteCount::EMPTY),
                tally.total(),
                self.rules.majority_rule,
            );
            return TabulationState::MajorityFound {
                winner: *winner,
                by_majority,
            };
        }

        let total = tally.total();
        let winners: Vec<CandidateId> = tally
            .iter()
            .filter(|(_, vc)| has_majority(*vc, total, self.rules.majority_rule))
            .map(|(cid, _)| *cid)
            .collect();
        debug!("decide: candidates with a majority: {:?}", winners);
        match winners.as_slice() {
            [winner] => {
                return TabulationState::MajorityFound {
                    winner: *winner,
                    by_majority: true,
                }
            }
            [] => {}
            // Two candidates at exactly half under the at-least-half rule.
            _ => return TabulationState::AllTied(winners),
        }

        match select_eliminated(
            tally,
            self.rules,
            &self.roster,
            self.history.len() as u32,
        ) {
            Selection::AllTied(cids) => TabulationState::AllTied(cids),
            Selection::Eliminate(cids) => TabulationState::Eliminating(cids),
        }
    }

    fn eliminate(&mut self, eliminated: &[CandidateId]) -> Redistribution {
        info!(
            "Round {}: eliminating {:?}",
            self.history.len(),
            self.roster.names_of(eliminated)
        );
        self.active.retain(|cid| !eliminated.contains(cid));
        let res = redistribute(&mut self.ballots, eliminated, &self.active);
        if res.newly_exhausted > 0 {
            debug!("eliminate: {} ballots became exhausted", res.newly_exhausted);
        }
        res
    }

    fn into_result(self, outcome: Outcome) -> TabulationResult {
        TabulationResult {
            outcome,
            rounds: self.history.into_rounds(),
            warnings: self.warnings,
        }
    }
}

/// Runs the instant-runoff tabulation on the given ballots.
///
/// Arguments:
/// * `candidates` the registered candidates for this election, in order. The
/// order matters for reporting and for the `UseCandidateOrder` tiebreak.
/// * `ballots` the ballots to count. Voter identifiers are expected to be unique.
/// * `rules` the rules that govern this election
///
/// ```
/// use instant_runoff::*;
///
/// let candidates = vec!["A".to_string(), "B".to_string()];
/// let ballots = vec![
///     RawBallot::new("v1").rank("A", 1).rank("B", 2),
///     RawBallot::new("v2").rank("B", 1),
///     RawBallot::new("v3").rank("A", 1),
/// ];
/// let result = run_election(&candidates, &ballots, &VoteRules::DEFAULT_RULES)?;
/// assert_eq!(result.winner(), Some("A"));
/// # Ok::<(), VotingErrors>(())
/// ```
pub fn run_election(
    candidates: &[String],
    ballots: &[RawBallot],
    rules: &VoteRules,
) -> Result<TabulationResult, VotingErrors> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, rules: {:?}",
        ballots.len(),
        candidates,
        rules
    );
    let mut election = Election::new(candidates, ballots, rules)?;

    // Every elimination round removes at least one candidate.
    let max_rounds = candidates.len() as u32;
    let mut state = TabulationState::Initial;
    loop {
        state = match election.step(state)? {
            TabulationState::Terminated(outcome) => {
                return Ok(election.into_result(outcome));
            }
            _ if election.history.len() as u32 > max_rounds => {
                return Err(VotingErrors::NoConvergence { rounds: max_rounds });
            }
            next => next,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn ballot(voter: &str, ranking: &[&str]) -> RawBallot {
        ranking
            .iter()
            .enumerate()
            .fold(RawBallot::new(voter), |b, (idx, name)| {
                b.rank(name, idx as i64 + 1)
            })
    }

    #[test]
    fn state_machine_goes_through_all_states() {
        init();
        let candidates = names(&["A", "B", "C"]);
        let ballots = vec![
            ballot("v1", &["A"]),
            ballot("v2", &["B"]),
            ballot("v3", &["C", "A"]),
        ];
        let rules = VoteRules::DEFAULT_RULES;
        let mut election = Election::new(&candidates, &ballots, &rules).unwrap();
        let state = election.step(TabulationState::Initial).unwrap();
        assert_eq!(state, TabulationState::Tallying(None));
        // A:1 B:1 C:1 is a full tie.
        let state = election.step(state).unwrap();
        assert_eq!(
            state,
            TabulationState::AllTied(vec![CandidateId(0), CandidateId(1), CandidateId(2)])
        );
        let state = election.step(state).unwrap();
        assert!(matches!(state, TabulationState::Terminated(Outcome::Tie { .. })));
    }

    #[test]
    fn elimination_feeds_the_next_tally() {
        init();
        let candidates = names(&["A", "B", "C"]);
        let ballots = vec![
            ballot("v1", &["A"]),
            ballot("v2", &["A"]),
            ballot("v3", &["B"]),
            ballot("v4", &["B"]),
            ballot("v5", &["C", "B"]),
        ];
        let rules = VoteRules::DEFAULT_RULES;
        let mut election = Election::new(&candidates, &ballots, &rules).unwrap();
        let state = election.step(TabulationState::Initial).unwrap();
        let state = election.step(state).unwrap();
        assert_eq!(state, TabulationState::Eliminating(vec![CandidateId(2)]));
        let state = election.step(state).unwrap();
        assert!(matches!(state, TabulationState::Tallying(Some(_))));
        let state = election.step(state).unwrap();
        assert_eq!(
            state,
            TabulationState::MajorityFound {
                winner: CandidateId(1),
                by_majority: true
            }
        );
        assert_eq!(election.active, vec![CandidateId(0), CandidateId(1)]);
    }

    #[test]
    fn duplicate_candidates_are_refused() {
        let res = run_election(&names(&["A", "A"]), &[], &VoteRules::DEFAULT_RULES);
        assert_eq!(
            res,
            Err(VotingErrors::DuplicateCandidate {
                name: "A".to_string()
            })
        );
    }
}
