use log::debug;
use snafu::ensure;

use crate::config::*;

/// The score of a candidate for a single ballot.
///
/// A candidate that is not ranked gets 0. Otherwise the score decreases linearly
/// with the position, normalized by the length of the ballot:
/// - first position (0) in a ballot of 10 candidates: 10/10
/// - second position (1) in a ballot of 10 candidates: 9/10
/// - last position (9) in a ballot of 10 candidates: 1/10
pub fn ballot_score(candidate: &Candidate, ballot: &Ballot) -> f64 {
    match ballot.position(candidate) {
        None => 0.0,
        Some(position) => {
            let len = ballot.len() as f64;
            (len - position as f64) / len
        }
    }
}

/// The average of the ballot scores of a candidate over all the ballots.
///
/// Ballots that do not rank the candidate count as zero.
pub fn candidate_score(candidate: &Candidate, ballots: &[Ballot]) -> f64 {
    if ballots.is_empty() {
        return 0.0;
    }
    let total: f64 = ballots.iter().map(|b| ballot_score(candidate, b)).sum();
    total / ballots.len() as f64
}

/// Rounds the score to the given number of decimals, as an integer number of units.
///
/// The precision is capped at `VoteRules::MAX_TIEBREAK_PRECISION`, which keeps
/// the key of any score in `[0, 1]` far from the bounds of `i64`.
fn score_key(score: f64, precision: u32) -> i64 {
    let precision = precision.min(VoteRules::MAX_TIEBREAK_PRECISION);
    (score * 10f64.powi(precision as i32)).round() as i64
}

/// True if the two scores cannot be told apart at the given precision.
///
/// Precisions above `VoteRules::MAX_TIEBREAK_PRECISION` behave like the maximum.
pub fn same_score(left: f64, right: f64, precision: u32) -> bool {
    score_key(left, precision) == score_key(right, precision)
}

/// The winner of a tiebreak, along with the scores of all the finalists.
#[derive(PartialEq, Debug, Clone)]
pub struct TiebreakOutcome {
    pub winner: Candidate,
    /// Sorted by decreasing score. Finalists with equal scores keep their input order.
    pub scores: Vec<(Candidate, f64)>,
}

/// Breaks a tie between finalists by looking at where each of them was placed
/// in each ballot.
///
/// Fails if the two best scores are equal at the given precision: the tiebreak
/// never picks arbitrarily between candidates that are genuinely equal.
pub fn break_tie(
    finalists: &[Candidate],
    ballots: &[Ballot],
    precision: u32,
) -> Result<TiebreakOutcome, RoundError> {
    ensure!(
        finalists.len() >= 2,
        NotEnoughFinalistsSnafu {
            count: finalists.len()
        }
    );

    let mut scores: Vec<(Candidate, f64)> = finalists
        .iter()
        .map(|c| (c.clone(), candidate_score(c, ballots)))
        .collect();
    // Stable sort: equal scores stay in the order of the finalists.
    scores.sort_by(|(_, s1), (_, s2)| s2.total_cmp(s1));
    debug!("break_tie: scores {:?}", scores);

    let (best, best_score) = scores[0].clone();
    let top: Vec<Candidate> = scores
        .iter()
        .filter(|(_, s)| same_score(*s, best_score, precision))
        .map(|(c, _)| c.clone())
        .collect();
    ensure!(
        top.len() == 1,
        UnresolvedTieSnafu {
            candidates: top,
            score: best_score,
        }
    );

    Ok(TiebreakOutcome {
        winner: best,
        scores,
    })
}
