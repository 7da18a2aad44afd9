use crate::config::{EliminationStats, RoundSnapshot};
use crate::count::VoteCount;

/// The ordered record of all the rounds of a tabulation.
///
/// Rounds can only be appended. Once recorded, a round is only handed out
/// through shared references. The history is meant for reporting; the
/// tabulation never reads it back to take a decision.
#[derive(PartialEq, Debug, Clone, Default)]
pub(crate) struct RoundHistory {
    rounds: Vec<RoundSnapshot>,
}

impl RoundHistory {
    pub(crate) fn new() -> RoundHistory {
        RoundHistory { rounds: Vec::new() }
    }

    /// Appends a new round and returns it. Rounds are numbered from 1.
    pub(crate) fn record(
        &mut self,
        eliminated: Vec<String>,
        transfers: Vec<EliminationStats>,
        tally: Vec<(String, VoteCount)>,
        percentages: Vec<(String, f64)>,
        continuing_ballots: u64,
        exhausted_ballots: u64,
    ) -> &RoundSnapshot {
        let round = self.rounds.len() as u32 + 1;
        self.rounds.push(RoundSnapshot {
            round,
            eliminated,
            transfers,
            tally,
            percentages,
            continuing_ballots,
            exhausted_ballots,
        });
        &self.rounds[self.rounds.len() - 1]
    }

    pub(crate) fn len(&self) -> usize {
        self.rounds.len()
    }

    pub(crate) fn last(&self) -> Option<&RoundSnapshot> {
        self.rounds.last()
    }

    pub(crate) fn into_rounds(self) -> Vec<RoundSnapshot> {
        self.rounds
    }
}
