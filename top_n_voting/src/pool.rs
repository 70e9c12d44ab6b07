use log::debug;
use snafu::ensure;

use std::collections::HashSet;

use crate::config::*;

/// The candidates and the ballots that take part in one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundPool {
    pub candidates: Vec<Candidate>,
    pub ballots: Vec<Ballot>,
}

/// Checks that every choice in every ballot is a candidate of the pool.
///
/// The ballots are scanned in order, and each ballot from its first choice,
/// so that the reported violation is always the same one for the same input.
pub fn validate(pool: &[Candidate], ballots: &[Ballot]) -> Result<(), RoundError> {
    let known: HashSet<&Candidate> = pool.iter().collect();
    for (ballot_index, ballot) in ballots.iter().enumerate() {
        if let Some(candidate) = ballot.iter().find(|c| !known.contains(c)) {
            return InvalidBallotSnafu {
                candidate: candidate.clone(),
                ballot_index,
            }
            .fail();
        }
    }
    Ok(())
}

/// Removes the excluded candidates from the pool and from every ballot.
///
/// The relative order of the remaining candidates is preserved, both in the pool
/// and in the ballots. Ballots that end up empty are kept.
pub fn reduce(
    pool: &[Candidate],
    ballots: &[Ballot],
    exclude: &[Candidate],
) -> Result<RoundPool, RoundError> {
    let excluded: HashSet<&Candidate> = exclude.iter().collect();
    let candidates: Vec<Candidate> = pool
        .iter()
        .filter(|c| !excluded.contains(c))
        .cloned()
        .collect();
    ensure!(
        !candidates.is_empty(),
        EmptyPoolSnafu {
            excluded: exclude.to_vec()
        }
    );

    let ballots: Vec<Ballot> = ballots
        .iter()
        .map(|b| {
            b.iter()
                .filter(|c| !excluded.contains(c))
                .cloned()
                .collect::<Ballot>()
        })
        .collect();
    debug!(
        "reduce: {} candidates left after excluding {:?}, {} exhausted ballots",
        candidates.len(),
        exclude,
        ballots.iter().filter(|b| b.is_empty()).count()
    );
    Ok(RoundPool {
        candidates,
        ballots,
    })
}
