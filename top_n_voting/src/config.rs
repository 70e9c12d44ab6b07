// ********* Input data structures ***********

use snafu::Snafu;
use std::fmt::Display;

/// The identifier of a candidate.
///
/// Candidates are compared exactly: no normalization of case or whitespace
/// is applied, so callers must provide canonical names.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(name: impl Into<String>) -> Candidate {
        Candidate(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Candidate {
    fn from(name: &str) -> Candidate {
        Candidate(name.to_string())
    }
}

impl From<String> for Candidate {
    fn from(name: String) -> Candidate {
        Candidate(name)
    }
}

/// The ranked preferences of one voter, from the most preferred to the least preferred.
///
/// A ballot may be partial. Ballots are never modified after being submitted:
/// removing candidates always produces a new ballot.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Ballot(Vec<Candidate>);

impl Ballot {
    pub fn new(choices: Vec<Candidate>) -> Ballot {
        Ballot(choices)
    }

    pub fn choices(&self) -> &[Candidate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Zero-based rank of the candidate in this ballot, if it was ranked at all.
    pub fn position(&self, candidate: &Candidate) -> Option<usize> {
        self.0.iter().position(|c| c == candidate)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.0.iter()
    }
}

impl<C: Into<Candidate>> FromIterator<C> for Ballot {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Ballot(iter.into_iter().map(|c| c.into()).collect())
    }
}

// ******** Output data structures *********

/// The outcome of a single instant-runoff round, once normalized.
///
/// Invariant: a tie always contains at least two candidates.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum RoundResult {
    Winner(Candidate),
    Tied(Vec<Candidate>),
}

/// How the winner of one extraction round was decided.
#[derive(PartialEq, Debug, Clone)]
pub enum Decision {
    /// The resolver designated the winner directly.
    Direct,
    /// The resolver reported tied finalists. The scores of the finalists
    /// are listed from the highest to the lowest.
    TieBreak { scores: Vec<(Candidate, f64)> },
}

/// Statistics for one round
#[derive(PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// The number of candidates still eligible at the start of this round.
    pub remaining_candidates: usize,
    pub winner: Candidate,
    pub decision: Decision,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TopNResult {
    /// The winners, from the first place to the last place.
    pub winners: Vec<Candidate>,
    pub round_stats: Vec<RoundStats>,
}

/// The reasons for which a single extraction round may fail.
#[derive(PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RoundError {
    #[snafu(display("ballot #{ballot_index} references an unknown candidate: {candidate}"))]
    InvalidBallot {
        candidate: Candidate,
        ballot_index: usize,
    },
    #[snafu(display("no candidates left after excluding {excluded:?}"))]
    EmptyPool { excluded: Vec<Candidate> },
    #[snafu(display("the resolver returned neither a winner nor tied finalists"))]
    NoResult,
    #[snafu(display("the resolver returned {candidate}, which is not in the current pool"))]
    ForeignCandidate { candidate: Candidate },
    #[snafu(display("a tiebreak needs at least two finalists, got {count}"))]
    NotEnoughFinalists { count: usize },
    #[snafu(display("unresolved tie between {candidates:?} (score {score:.5})"))]
    UnresolvedTie {
        candidates: Vec<Candidate>,
        score: f64,
    },
}

/// Errors that prevent the extraction from completing successfully.
#[derive(PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VotingErrors {
    #[snafu(display("round {round} failed: {source}"))]
    Round { round: u32, source: RoundError },
    #[snafu(display("no candidates were registered"))]
    NoCandidates,
    #[snafu(display("candidate registered more than once: {candidate}"))]
    DuplicateCandidate { candidate: Candidate },
    #[snafu(display("empty candidate names are not allowed"))]
    EmptyCandidateName,
    #[snafu(display("ballot #{ballot_index} ranks {candidate} more than once"))]
    RepeatedChoice {
        candidate: Candidate,
        ballot_index: usize,
    },
    #[snafu(display("tiebreak precision {precision} is above the maximum of {max} decimals"))]
    InvalidPrecision { precision: u32, max: u32 },
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    /// How many winners to extract.
    pub number_of_winners: u32,
    /// Two tie-break scores that are equal once rounded to this many
    /// decimal places are considered a genuine tie.
    pub tiebreak_precision: u32,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        number_of_winners: 1,
        tiebreak_precision: 5,
    };

    /// Beyond this many decimals, the digits of a f64 score are noise.
    pub const MAX_TIEBREAK_PRECISION: u32 = 12;

    pub fn with_winners(number_of_winners: u32) -> VoteRules {
        VoteRules {
            number_of_winners,
            ..VoteRules::DEFAULT_RULES
        }
    }
}

impl Default for VoteRules {
    fn default() -> Self {
        VoteRules::DEFAULT_RULES
    }
}
