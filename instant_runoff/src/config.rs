// ********* Input data structures ***********

use snafu::Snafu;

use crate::count::VoteCount;

/// The value written next to a candidate on a ballot, before any validation.
///
/// Loaders are expected to convert their cells to the closest variant: a cell
/// containing `2` is an `Integer`, `2.5` is a `Float`, an empty cell is `Missing`
/// and anything else is kept as `Text` (and will be treated as no preference).
#[derive(PartialEq, Debug, Clone)]
pub enum RawPreference {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl From<i64> for RawPreference {
    fn from(x: i64) -> Self {
        RawPreference::Integer(x)
    }
}

impl From<i32> for RawPreference {
    fn from(x: i32) -> Self {
        RawPreference::Integer(x as i64)
    }
}

impl From<f64> for RawPreference {
    fn from(x: f64) -> Self {
        RawPreference::Float(x)
    }
}

impl From<&str> for RawPreference {
    fn from(s: &str) -> Self {
        RawPreference::Text(s.to_string())
    }
}

/// The preferences of one voter, in the order in which they were read.
///
/// The order matters: when two candidates receive the same rank, the
/// first one encountered is the one that is kept by default.
#[derive(PartialEq, Debug, Clone)]
pub struct RawBallot {
    pub voter: String,
    pub preferences: Vec<(String, RawPreference)>,
}

impl RawBallot {
    pub fn new(voter: &str) -> RawBallot {
        RawBallot {
            voter: voter.to_string(),
            preferences: Vec::new(),
        }
    }

    /// Appends a preference for a candidate.
    ///
    /// ```
    /// use instant_runoff::RawBallot;
    ///
    /// let ballot = RawBallot::new("voter 1").rank("Anna", 1).rank("Bob", 2.0);
    /// assert_eq!(ballot.preferences.len(), 2);
    /// ```
    pub fn rank(mut self, candidate: &str, value: impl Into<RawPreference>) -> RawBallot {
        self.preferences.push((candidate.to_string(), value.into()));
        self
    }
}

// ******** Output data structures *********

/// Where the votes of an eliminated candidate went.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    pub name: String,
    /// The continuing candidates that received votes, in candidate order.
    pub transfers: Vec<(String, VoteCount)>,
    /// The votes that did not have any further preference.
    pub exhausted: VoteCount,
}

/// Statistics for one round
#[derive(PartialEq, Debug, Clone)]
pub struct RoundSnapshot {
    pub round: u32,
    /// The candidates eliminated in the step that led to this round.
    /// Always empty for the first round.
    pub eliminated: Vec<String>,
    pub transfers: Vec<EliminationStats>,
    /// The votes of every continuing candidate, in candidate order.
    pub tally: Vec<(String, VoteCount)>,
    pub percentages: Vec<(String, f64)>,
    pub continuing_ballots: u64,
    pub exhausted_ballots: u64,
}

impl RoundSnapshot {
    pub fn votes_for(&self, name: &str) -> Option<VoteCount> {
        self.tally
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, count)| *count)
    }

    pub fn percentage_of(&self, name: &str) -> Option<f64> {
        self.percentages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, pct)| *pct)
    }

    pub fn total(&self) -> VoteCount {
        self.tally.iter().map(|(_, count)| *count).sum()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Outcome {
    /// A single candidate won, either with a majority of the continuing
    /// ballots or because it was the last candidate standing.
    Winner {
        name: String,
        final_percentages: Vec<(String, f64)>,
        by_majority: bool,
    },
    /// No elimination could separate the remaining candidates.
    Tie { tied_winners: Vec<String> },
}

/// Conditions that do not prevent the tabulation but that should be reported.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TabulationWarning {
    NoBallots,
    /// Ballots that did not contain a single valid preference.
    EmptyBallots { count: u64 },
}

#[derive(PartialEq, Debug, Clone)]
pub struct TabulationResult {
    pub outcome: Outcome,
    pub rounds: Vec<RoundSnapshot>,
    pub warnings: Vec<TabulationWarning>,
}

impl TabulationResult {
    /// The name of the winner, if the election did not end in a tie.
    pub fn winner(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Winner { name, .. } => Some(name.as_str()),
            Outcome::Tie { .. } => None,
        }
    }

    /// All the candidates that were declared winners (one, or several for a tie).
    pub fn winners(&self) -> Vec<String> {
        match &self.outcome {
            Outcome::Winner { name, .. } => vec![name.clone()],
            Outcome::Tie { tied_winners } => tied_winners.clone(),
        }
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Debug, Snafu, Eq, PartialEq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum VotingErrors {
    #[snafu(display("the election does not have any candidate"))]
    EmptyElection {},

    #[snafu(display("candidate {name:?} is registered more than once"))]
    DuplicateCandidate { name: String },

    #[snafu(display("voter {voter:?} has more than one ballot"))]
    DuplicateVoter { voter: String },

    #[snafu(display("ballot of {voter:?} ranks {name:?}, which is not a candidate"))]
    InvalidCandidate { voter: String, name: String },

    #[snafu(display("ballot of {voter:?} gives rank {rank} to more than one candidate"))]
    MalformedBallot { voter: String, rank: u32 },

    #[snafu(display("the tabulation did not terminate after {rounds} rounds"))]
    NoConvergence { rounds: u32 },
}

// ********* Configuration **********

/// When a candidate has enough votes to win outright.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MajorityRule {
    /// Strictly more than half of the continuing ballots.
    StrictMajority,
    /// At least half of the continuing ballots.
    AtLeastHalf,
}

/// The elimination algorithm to apply.
///
/// - Batch eliminates in the same round all the candidates that are tied
/// for the lowest count.
///
/// - Single eliminates exactly one candidate per round. When several candidates
/// are tied for the lowest count, the [TieBreakMode] decides which one goes.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum EliminationAlgorithm {
    Batch,
    Single,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// The candidate that comes last in the candidate list is eliminated.
    UseCandidateOrder,
    /// The candidate with the greatest name in lexical order is eliminated.
    Lexical,
    /// The tied candidates are ordered by a SHA-256 hash of the seed, the round
    /// and their name. The order is hard to guess in advance but is fully
    /// reproducible for a given seed.
    Random(u32),
}

/// What to do when a ballot gives the same rank to several candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicateRankRule {
    /// Keep the first candidate encountered at that rank, drop the others.
    KeepFirst,
    /// Refuse the ballot, and the election with it.
    Reject,
    /// Keep all of them and split the vote equally when they are at the top.
    Split,
}

/// What to do when a ballot ranks a name that is not a candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InvalidCandidateRule {
    Drop,
    Reject,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    pub majority_rule: MajorityRule,
    pub elimination_algorithm: EliminationAlgorithm,
    pub tiebreak_mode: TieBreakMode,
    pub duplicate_rank_rule: DuplicateRankRule,
    pub invalid_candidate_rule: InvalidCandidateRule,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        majority_rule: MajorityRule::StrictMajority,
        elimination_algorithm: EliminationAlgorithm::Batch,
        tiebreak_mode: TieBreakMode::UseCandidateOrder,
        duplicate_rank_rule: DuplicateRankRule::KeepFirst,
        invalid_candidate_rule: InvalidCandidateRule::Drop,
    };
}

impl Default for VoteRules {
    fn default() -> Self {
        VoteRules::DEFAULT_RULES
    }
}
