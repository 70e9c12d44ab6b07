use log::debug;
use snafu::ensure;

use std::{
    collections::{HashMap, HashSet},
    ops::AddAssign,
};

use crate::config::*;

/// The result of a single-winner count, as reported by a resolver.
///
/// A well-behaved resolver either fills `winner`, or leaves it empty and lists
/// the finalists that it could not separate in `tie_options`.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunoffOutcome {
    pub winner: Option<Candidate>,
    pub tie_options: Vec<Candidate>,
}

impl RunoffOutcome {
    pub fn winner(candidate: Candidate) -> RunoffOutcome {
        RunoffOutcome {
            winner: Some(candidate),
            tie_options: Vec::new(),
        }
    }

    pub fn tie(candidates: Vec<Candidate>) -> RunoffOutcome {
        RunoffOutcome {
            winner: None,
            tie_options: candidates,
        }
    }
}

/// A single-winner ranked-choice count.
///
/// The pool given to a resolver is never empty and has no duplicates. All the
/// ballots only reference candidates from the pool. Resolvers are expected to be
/// deterministic.
pub trait RunoffResolver {
    fn run(&self, pool: &[Candidate], ballots: &[Ballot]) -> RunoffOutcome;
}

impl<F> RunoffResolver for F
where
    F: Fn(&[Candidate], &[Ballot]) -> RunoffOutcome,
{
    fn run(&self, pool: &[Candidate], ballots: &[Ballot]) -> RunoffOutcome {
        self(pool, ballots)
    }
}

/// Runs the resolver and normalizes its outcome.
///
/// A winner takes precedence over tie options. A tie with a single finalist is
/// that finalist winning.
pub fn resolve<R: RunoffResolver + ?Sized>(
    resolver: &R,
    pool: &[Candidate],
    ballots: &[Ballot],
) -> Result<RoundResult, RoundError> {
    let outcome = resolver.run(pool, ballots);
    debug!("resolve: resolver outcome: {:?}", outcome);
    let known: HashSet<&Candidate> = pool.iter().collect();

    if let Some(winner) = outcome.winner {
        ensure!(
            known.contains(&winner),
            ForeignCandidateSnafu { candidate: winner }
        );
        return Ok(RoundResult::Winner(winner));
    }

    let mut finalists: Vec<Candidate> = Vec::new();
    for c in outcome.tie_options {
        ensure!(known.contains(&c), ForeignCandidateSnafu { candidate: c });
        if !finalists.contains(&c) {
            finalists.push(c);
        }
    }
    match finalists.len() {
        0 => NoResultSnafu.fail(),
        1 => Ok(RoundResult::Winner(finalists.remove(0))),
        _ => Ok(RoundResult::Tied(finalists)),
    }
}

// **** Default resolver ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

/// A plain instant-runoff count.
///
/// Each round, the ballots count for their first choice that is still running.
/// A candidate with a majority of the counted ballots wins. Otherwise all the
/// candidates with the lowest count are eliminated together. When all the
/// running candidates have the same count, they are reported as tied.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct InstantRunoff;

impl RunoffResolver for InstantRunoff {
    fn run(&self, pool: &[Candidate], ballots: &[Ballot]) -> RunoffOutcome {
        // The candidates that are still running, in pool order.
        let mut running: Vec<&Candidate> = pool.iter().collect();
        let mut num_round = 1;
        while !running.is_empty() {
            if running.len() == 1 {
                return RunoffOutcome::winner(running[0].clone());
            }
            let tally = compute_tally(ballots, &running);
            let threshold = get_threshold(&tally);
            debug!(
                "InstantRunoff: round {}: tally {:?} threshold {:?}",
                num_round, tally, threshold
            );

            if threshold > VoteCount::EMPTY {
                if let Some(winner) = running.iter().find(|c| tally[**c] >= threshold) {
                    return RunoffOutcome::winner((*winner).clone());
                }
            }

            let min_count = running
                .iter()
                .map(|c| tally[*c])
                .min()
                .unwrap_or(VoteCount::EMPTY);
            let eliminated: HashSet<&Candidate> = running
                .iter()
                .filter(|c| tally[**c] <= min_count)
                .copied()
                .collect();
            if eliminated.len() == running.len() {
                return RunoffOutcome::tie(running.into_iter().cloned().collect());
            }
            debug!(
                "InstantRunoff: round {}: eliminating {:?}",
                num_round, eliminated
            );
            running.retain(|c| !eliminated.contains(c));
            num_round += 1;
        }
        RunoffOutcome::default()
    }
}

fn compute_tally<'a>(
    ballots: &[Ballot],
    running: &[&'a Candidate],
) -> HashMap<&'a Candidate, VoteCount> {
    let mut tally: HashMap<&Candidate, VoteCount> =
        running.iter().map(|c| (*c, VoteCount::EMPTY)).collect();
    for b in ballots.iter() {
        // Exhausted ballots do not count.
        if let Some(first) = b.iter().find(|c| tally.contains_key(*c)) {
            if let Some(vc) = tally.get_mut(first) {
                *vc += VoteCount(1);
            }
        }
    }
    tally
}

fn get_threshold(tally: &HashMap<&Candidate, VoteCount>) -> VoteCount {
    let total_count: VoteCount = tally.values().cloned().sum();
    if total_count == VoteCount::EMPTY {
        VoteCount::EMPTY
    } else {
        VoteCount((total_count.0 / 2) + 1)
    }
}
