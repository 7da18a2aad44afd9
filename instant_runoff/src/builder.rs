use std::collections::HashSet;

use snafu::prelude::*;

pub use crate::config::*;

/// A builder for adding ballots one at a time.
///
/// Voter identifiers must be unique within one builder.
///
/// ```
/// pub use instant_runoff::builder::Builder;
/// pub use instant_runoff::VoteRules;
/// # use instant_runoff::VotingErrors;
///
/// let mut builder = Builder::new(&VoteRules::DEFAULT_RULES)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ranking("v1", &["Anna".to_string(), "".to_string(), "Bob".to_string()])?;
/// builder.add_ranking("v2", &["Bob".to_string()])?;
/// builder.add_ranking("v3", &["Anna".to_string()])?;
///
/// let result = builder.run()?;
/// assert_eq!(result.winner(), Some("Anna"));
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    rules: VoteRules,
    candidates: Vec<String>,
    ballots: Vec<RawBallot>,
    voters: HashSet<String>,
}

impl Builder {
    pub fn new(rules: &VoteRules) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            rules: rules.clone(),
            candidates: Vec::new(),
            ballots: Vec::new(),
            voters: HashSet::new(),
        })
    }

    /// Registers the candidates. Any ballot added before is discarded.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for name in cands.iter() {
            ensure!(
                seen.insert(name.as_str()),
                DuplicateCandidateSnafu { name: name.clone() }
            );
        }
        Ok(Builder {
            rules: self.rules,
            candidates: cands.to_vec(),
            ballots: Vec::new(),
            voters: HashSet::new(),
        })
    }

    /// Adds a ballot given as an ordered list of choices.
    ///
    /// The position in the list is the rank: the first choice gets rank 1.
    /// Empty strings are blank choices. They keep their position, so the ranks
    /// of the following choices are not shifted.
    pub fn add_ranking(&mut self, voter: &str, choices: &[String]) -> Result<(), VotingErrors> {
        let ballot = choices
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .fold(RawBallot::new(voter), |b, (idx, name)| {
                b.rank(name, idx as i64 + 1)
            });
        self.add_ballot(ballot)
    }

    pub fn add_ballot(&mut self, ballot: RawBallot) -> Result<(), VotingErrors> {
        ensure!(
            self.voters.insert(ballot.voter.clone()),
            DuplicateVoterSnafu {
                voter: ballot.voter.clone()
            }
        );
        self.ballots.push(ballot);
        Ok(())
    }

    pub fn run(&self) -> Result<TabulationResult, VotingErrors> {
        crate::run_election(&self.candidates, &self.ballots, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_voters_are_refused() {
        let mut builder = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&names(&["A", "B"]))
            .unwrap();
        builder.add_ranking("v1", &names(&["A"])).unwrap();
        assert_eq!(
            builder.add_ranking("v1", &names(&["B"])),
            Err(VotingErrors::DuplicateVoter {
                voter: "v1".to_string()
            })
        );
    }

    #[test]
    fn blank_choices_keep_their_position() {
        let mut builder = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&names(&["A", "B"]))
            .unwrap();
        builder.add_ranking("v1", &names(&["", "B", "A"])).unwrap();
        assert_eq!(
            builder.ballots[0],
            RawBallot::new("v1").rank("B", 2).rank("A", 3)
        );
    }

    #[test]
    fn duplicate_candidates_are_refused() {
        let res = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&names(&["A", "B", "A"]));
        assert!(matches!(
            res,
            Err(VotingErrors::DuplicateCandidate { .. })
        ));
    }
}
