pub use crate::config::*;

use snafu::ensure;
use std::collections::HashSet;

use crate::{check_ballot, run_top_n, RunoffResolver};

/// A builder for registering candidates and ballots before an extraction.
///
/// The builder checks the inputs as they are added: candidates must be unique
/// and ballots must not rank the same candidate twice.
///
/// ```
/// pub use top_n_voting::builder::Builder;
/// pub use top_n_voting::{InstantRunoff, VoteRules};
/// # use top_n_voting::VotingErrors;
///
/// let mut builder = Builder::new(&VoteRules::with_winners(2))?
///     .candidates(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_ballot(&["Anna".to_string(), "Clara".to_string()])?;
/// builder.add_ballot(&["Clara".to_string(), "Anna".to_string()])?;
/// builder.add_ballot(&["Anna".to_string()])?;
///
/// let res = builder.run(&InstantRunoff)?;
/// assert_eq!(res.winners.len(), 2);
/// assert_eq!(res.winners[0].name(), "Anna");
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: VoteRules,
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &VoteRules) -> Result<Builder, VotingErrors> {
        ensure!(
            rules.tiebreak_precision <= VoteRules::MAX_TIEBREAK_PRECISION,
            InvalidPrecisionSnafu {
                precision: rules.tiebreak_precision,
                max: VoteRules::MAX_TIEBREAK_PRECISION,
            }
        );
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _ballots: Vec::new(),
        })
    }

    /// Registers the candidates, in order. The order is kept in the pool
    /// that is passed to the resolver.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for name in cands.iter() {
            ensure!(!name.is_empty(), EmptyCandidateNameSnafu);
            ensure!(
                seen.insert(name.as_str()),
                DuplicateCandidateSnafu {
                    candidate: name.as_str()
                }
            );
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.iter().map(|name| Candidate::new(name.clone())).collect(),
            _ballots: self._ballots,
        })
    }

    /// Adds a ballot, from the most preferred candidate to the least preferred one.
    ///
    /// Ranking the same candidate twice is an error. Whether the candidates exist is
    /// only checked when running, against the pool of each round.
    pub fn add_ballot(&mut self, choices: &[String]) -> Result<(), VotingErrors> {
        let ballot: Ballot = choices.iter().map(|c| Candidate::new(c.clone())).collect();
        self.add_ballot_2(&ballot)
    }

    pub fn add_ballot_2(&mut self, ballot: &Ballot) -> Result<(), VotingErrors> {
        check_ballot(ballot, self._ballots.len())?;
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn num_ballots(&self) -> usize {
        self._ballots.len()
    }

    /// Runs the extraction on the registered candidates and ballots.
    pub fn run<R: RunoffResolver + ?Sized>(&self, resolver: &R) -> Result<TopNResult, VotingErrors> {
        ensure!(!self._candidates.is_empty(), NoCandidatesSnafu);
        run_top_n(&self._candidates, &self._ballots, &self._rules, resolver)
    }
}
