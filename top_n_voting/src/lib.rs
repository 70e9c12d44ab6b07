/*!
Extraction of the top N winners of a ranked-choice election.

The winners are found one at a time: an instant-runoff count designates the
first place, this candidate is then removed from the pool and from all the
ballots, and the count runs again to find the second place, and so on.

When the count ends with tied finalists, the tie is broken by looking at how
high each finalist was ranked in every ballot (see [`break_tie`]). Ties that
survive this procedure stop the extraction: no winner is ever picked at random.

```
use top_n_voting::*;

let pool: Vec<Candidate> = vec!["A".into(), "B".into(), "C".into()];
let ballots: Vec<Ballot> = vec![
    ["A", "B"].into_iter().collect(),
    ["A", "C"].into_iter().collect(),
    ["B", "A"].into_iter().collect(),
];
let res = run_top_n(&pool, &ballots, &VoteRules::with_winners(2), &InstantRunoff)?;
assert_eq!(res.winners, vec![Candidate::from("A"), Candidate::from("B")]);
# Ok::<(), VotingErrors>(())
```
*/
pub mod builder;
mod config;
pub mod manual;
mod pool;
mod resolver;
mod tiebreak;

use log::{debug, info};
use snafu::{ensure, ResultExt};

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::pool::{reduce, validate, RoundPool};
pub use crate::resolver::{resolve, InstantRunoff, RunoffOutcome, RunoffResolver};
pub use crate::tiebreak::{
    ballot_score, break_tie, candidate_score, same_score, TiebreakOutcome,
};

type RoundId = u32;

// The state of an extraction. Failures are carried by the Result of each step.
#[derive(PartialEq, Debug, Clone)]
enum Extraction {
    Collecting {
        // The winners so far, in order. This is also the exclusion set.
        winners: Vec<Candidate>,
        round_stats: Vec<RoundStats>,
    },
    Done(TopNResult),
}

/// Extracts the top winners of an election.
///
/// Arguments:
/// * `pool` the candidates, without duplicates
/// * `ballots` the ranked ballots. They must only reference candidates from the pool,
///   and never rank a candidate twice.
/// * `rules` the number of winners to extract and the tiebreak precision, at most
///   `VoteRules::MAX_TIEBREAK_PRECISION` decimals
/// * `resolver` the single-winner count to run at each round
///
/// Returns exactly `rules.number_of_winners` winners, or the error of the
/// round that failed. Inputs that break the conditions above on the pool, the
/// repeated choices or the precision are rejected before the first round.
pub fn run_top_n<R: RunoffResolver + ?Sized>(
    pool: &[Candidate],
    ballots: &[Ballot],
    rules: &VoteRules,
    resolver: &R,
) -> Result<TopNResult, VotingErrors> {
    info!(
        "Processing {:?} ballots, {:?} candidates, rules: {:?}",
        ballots.len(),
        pool.len(),
        rules
    );
    ensure!(
        rules.tiebreak_precision <= VoteRules::MAX_TIEBREAK_PRECISION,
        InvalidPrecisionSnafu {
            precision: rules.tiebreak_precision,
            max: VoteRules::MAX_TIEBREAK_PRECISION,
        }
    );
    check_pool(pool)?;
    for (ballot_index, ballot) in ballots.iter().enumerate() {
        check_ballot(ballot, ballot_index)?;
    }

    let mut state = Extraction::Collecting {
        winners: Vec::new(),
        round_stats: Vec::new(),
    };
    loop {
        state = match state {
            Extraction::Done(result) => return Ok(result),
            Extraction::Collecting {
                winners,
                round_stats,
            } => step(pool, ballots, rules, resolver, winners, round_stats)?,
        }
    }
}

fn check_pool(pool: &[Candidate]) -> Result<(), VotingErrors> {
    let mut seen: HashSet<&Candidate> = HashSet::new();
    for c in pool.iter() {
        ensure!(
            seen.insert(c),
            DuplicateCandidateSnafu {
                candidate: c.clone()
            }
        );
    }
    Ok(())
}

/// Fails if the ballot ranks the same candidate more than once.
pub(crate) fn check_ballot(ballot: &Ballot, ballot_index: usize) -> Result<(), VotingErrors> {
    let mut seen: HashSet<&Candidate> = HashSet::new();
    for c in ballot.iter() {
        ensure!(
            seen.insert(c),
            RepeatedChoiceSnafu {
                candidate: c.clone(),
                ballot_index
            }
        );
    }
    Ok(())
}

fn step<R: RunoffResolver + ?Sized>(
    pool: &[Candidate],
    ballots: &[Ballot],
    rules: &VoteRules,
    resolver: &R,
    mut winners: Vec<Candidate>,
    mut round_stats: Vec<RoundStats>,
) -> Result<Extraction, VotingErrors> {
    if winners.len() >= rules.number_of_winners as usize {
        return Ok(Extraction::Done(TopNResult {
            winners,
            round_stats,
        }));
    }
    let round_id: RoundId = (winners.len() + 1) as u32;

    let stats = run_one_round(pool, ballots, &winners, rules, resolver, round_id)
        .context(RoundSnafu { round: round_id })?;
    info!("{}. {}", round_id, stats.winner);
    debug_assert!(!winners.contains(&stats.winner));

    winners.push(stats.winner.clone());
    round_stats.push(stats);
    Ok(Extraction::Collecting {
        winners,
        round_stats,
    })
}

/// Finds the winner among the candidates that have not been excluded yet.
fn run_one_round<R: RunoffResolver + ?Sized>(
    pool: &[Candidate],
    ballots: &[Ballot],
    excluded: &[Candidate],
    rules: &VoteRules,
    resolver: &R,
    round_id: RoundId,
) -> Result<RoundStats, RoundError> {
    let round_pool = reduce(pool, ballots, excluded)?;
    validate(&round_pool.candidates, &round_pool.ballots)?;
    debug!(
        "run_one_round: round {}: candidates {:?}",
        round_id, round_pool.candidates
    );

    let (winner, decision) =
        match resolve(resolver, &round_pool.candidates, &round_pool.ballots)? {
            RoundResult::Winner(c) => (c, Decision::Direct),
            RoundResult::Tied(finalists) => {
                info!("Round {}: tie between {:?}", round_id, finalists);
                let tb = break_tie(&finalists, &round_pool.ballots, rules.tiebreak_precision)?;
                debug!("run_one_round: tiebreak scores: {:?}", tb.scores);
                (tb.winner, Decision::TieBreak { scores: tb.scores })
            }
        };

    Ok(RoundStats {
        round: round_id,
        remaining_candidates: round_pool.candidates.len(),
        winner,
        decision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cands(names: &[&str]) -> Vec<Candidate> {
        names.iter().map(|n| Candidate::from(*n)).collect()
    }

    fn ballots(bs: &[&[&str]]) -> Vec<Ballot> {
        bs.iter()
            .map(|b| b.iter().copied().collect::<Ballot>())
            .collect()
    }

    #[test]
    fn clear_winner() {
        init();
        let pool = cands(&["A", "B", "C"]);
        let bs = ballots(&[&["A", "B"], &["A", "C"], &["B", "A"]]);
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(1), &InstantRunoff).unwrap();
        assert_eq!(res.winners, cands(&["A"]));
        assert_eq!(res.round_stats.len(), 1);
        assert_eq!(res.round_stats[0].decision, Decision::Direct);
        assert_eq!(res.round_stats[0].remaining_candidates, 3);
    }

    #[test]
    fn zero_winners() {
        init();
        let pool = cands(&["A"]);
        let res = run_top_n(&pool, &[], &VoteRules::with_winners(0), &InstantRunoff).unwrap();
        assert!(res.winners.is_empty());
        assert!(res.round_stats.is_empty());
    }

    #[test]
    fn tie_broken_in_round() {
        init();
        let pool = cands(&["X", "Y"]);
        let bs = ballots(&[&["X", "Y"], &["Y", "X"], &["X"]]);
        // Always report a tie between everyone still running.
        let tied = |p: &[Candidate], _: &[Ballot]| RunoffOutcome::tie(p.to_vec());
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(2), &tied).unwrap();
        assert_eq!(res.winners, cands(&["X", "Y"]));
        match &res.round_stats[0].decision {
            Decision::TieBreak { scores } => {
                assert_eq!(scores[0].0, "X".into());
                assert!((scores[0].1 - 2.5 / 3.0).abs() < 1e-9);
            }
            d => panic!("unexpected decision {:?}", d),
        }
        // Y is alone in the second round: the single finalist wins directly.
        assert_eq!(res.round_stats[1].decision, Decision::Direct);
    }

    #[test]
    fn unresolved_tie_aborts() {
        init();
        let pool = cands(&["X", "Y"]);
        let bs = ballots(&[&["X", "Y"], &["Y", "X"]]);
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(1), &InstantRunoff);
        assert_eq!(
            res,
            Err(VotingErrors::Round {
                round: 1,
                source: RoundError::UnresolvedTie {
                    candidates: cands(&["X", "Y"]),
                    score: 0.75
                }
            })
        );
    }

    #[test]
    fn invalid_ballot() {
        init();
        let pool = cands(&["A", "B"]);
        let bs = ballots(&[&["A", "C"]]);
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(1), &InstantRunoff);
        assert_eq!(
            res,
            Err(VotingErrors::Round {
                round: 1,
                source: RoundError::InvalidBallot {
                    candidate: "C".into(),
                    ballot_index: 0
                }
            })
        );
    }

    #[test]
    fn exhausted_pool() {
        init();
        let pool = cands(&["A", "B"]);
        let bs = ballots(&[&["A", "B"], &["A"], &["B", "A"]]);
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(3), &InstantRunoff);
        assert_eq!(
            res,
            Err(VotingErrors::Round {
                round: 3,
                source: RoundError::EmptyPool {
                    excluded: cands(&["A", "B"])
                }
            })
        );
    }

    #[test]
    fn duplicate_candidates_rejected() {
        init();
        let pool = cands(&["A", "B", "A"]);
        let res = run_top_n(&pool, &[], &VoteRules::with_winners(1), &InstantRunoff);
        assert_eq!(
            res,
            Err(VotingErrors::DuplicateCandidate {
                candidate: "A".into()
            })
        );
    }

    #[test]
    fn no_result_is_fatal() {
        init();
        let pool = cands(&["A", "B"]);
        let nothing = |_: &[Candidate], _: &[Ballot]| RunoffOutcome::default();
        let res = run_top_n(&pool, &[], &VoteRules::with_winners(1), &nothing);
        assert_eq!(
            res,
            Err(VotingErrors::Round {
                round: 1,
                source: RoundError::NoResult
            })
        );
    }

    #[test]
    fn error_reports_failing_round() {
        init();
        let pool = cands(&["A", "B", "C"]);
        // The second round cannot separate B and C.
        let bs = ballots(&[&["A", "B", "C"], &["A", "C", "B"], &["A"]]);
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(3), &InstantRunoff);
        match res {
            Err(VotingErrors::Round {
                round: 2,
                source: RoundError::UnresolvedTie { candidates, .. },
            }) => assert_eq!(candidates, cands(&["B", "C"])),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn resolver_sees_reduced_inputs() {
        init();
        let pool = cands(&["A", "B", "C"]);
        let bs = ballots(&[&["A", "B", "C"], &["C", "A"], &["A"]]);
        let seen: RefCell<Vec<(Vec<Candidate>, Vec<Ballot>)>> = RefCell::new(Vec::new());
        let first = |p: &[Candidate], b: &[Ballot]| {
            seen.borrow_mut().push((p.to_vec(), b.to_vec()));
            RunoffOutcome::winner(p[0].clone())
        };
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(3), &first).unwrap();
        assert_eq!(res.winners, cands(&["A", "B", "C"]));

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].0, cands(&["B", "C"]));
        assert_eq!(seen[1].1, ballots(&[&["B", "C"], &["C"], &[]]));
        assert_eq!(seen[2].0, cands(&["C"]));
        assert_eq!(seen[2].1, ballots(&[&["C"], &["C"], &[]]));
        // The inputs are never modified.
        assert_eq!(bs[0], ["A", "B", "C"].into_iter().collect::<Ballot>());
    }

    #[test]
    fn tiebreak_uses_reduced_ballots() {
        init();
        // After A is excluded, the second ballot becomes [Y, X] and the third [X].
        let pool = cands(&["A", "X", "Y"]);
        let bs = ballots(&[&["A", "X", "Y"], &["Y", "A", "X"], &["A", "X"]]);
        let script = |p: &[Candidate], _: &[Ballot]| {
            if p.len() == 3 {
                RunoffOutcome::winner("A".into())
            } else {
                RunoffOutcome::tie(p.to_vec())
            }
        };
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(2), &script).unwrap();
        assert_eq!(res.winners, cands(&["A", "X"]));
    }

    #[test]
    fn winners_are_distinct_and_ordered() {
        init();
        let pool = cands(&["A", "B", "C", "D", "E"]);
        let bs = ballots(&[
            &["A", "B", "C", "D", "E"],
            &["A", "C", "B", "E", "D"],
            &["B", "A", "D", "C", "E"],
            &["C", "B", "A", "E", "D"],
            &["D", "E", "A", "B", "C"],
        ]);
        let res = run_top_n(&pool, &bs, &VoteRules::with_winners(5), &InstantRunoff).unwrap();
        assert_eq!(res.winners.len(), 5);
        let distinct: HashSet<&Candidate> = res.winners.iter().collect();
        assert_eq!(distinct.len(), 5);
        for (idx, rs) in res.round_stats.iter().enumerate() {
            assert_eq!(rs.round, idx as u32 + 1);
            assert_eq!(rs.remaining_candidates, 5 - idx);
            assert_eq!(rs.winner, res.winners[idx]);
        }
    }

    #[test]
    fn rejects_excessive_precision() {
        init();
        let pool = cands(&["X", "Y"]);
        let bs = ballots(&[&["X", "Y"], &["Y", "X"], &["X"]]);
        let tied = |p: &[Candidate], _: &[Ballot]| RunoffOutcome::tie(p.to_vec());
        for precision in [19, 400, u32::MAX] {
            let rules = VoteRules {
                number_of_winners: 1,
                tiebreak_precision: precision,
            };
            assert_eq!(
                run_top_n(&pool, &bs, &rules, &tied),
                Err(VotingErrors::InvalidPrecision {
                    precision,
                    max: VoteRules::MAX_TIEBREAK_PRECISION
                })
            );
        }
        // The largest accepted precision still separates the finalists.
        let rules = VoteRules {
            number_of_winners: 1,
            tiebreak_precision: VoteRules::MAX_TIEBREAK_PRECISION,
        };
        let res = run_top_n(&pool, &bs, &rules, &tied).unwrap();
        assert_eq!(res.winners, cands(&["X"]));
    }

    #[test]
    fn rejects_repeated_choices() {
        init();
        let pool = cands(&["A", "B"]);
        let bs = ballots(&[&["A", "B"], &["B", "A", "B"]]);
        assert_eq!(
            run_top_n(&pool, &bs, &VoteRules::with_winners(1), &InstantRunoff),
            Err(VotingErrors::RepeatedChoice {
                candidate: "B".into(),
                ballot_index: 1
            })
        );
    }

    fn arb_extraction() -> impl Strategy<Value = (Vec<Candidate>, Vec<Ballot>, u32)> {
        (1usize..7).prop_flat_map(|num_cands| {
            let pool: Vec<Candidate> = (0..num_cands)
                .map(|i| Candidate::new(format!("c{}", i)))
                .collect();
            let ballots = prop::collection::vec(
                prop::sample::subsequence(pool.clone(), 0..=num_cands)
                    .prop_shuffle()
                    .prop_map(Ballot::new),
                0..12,
            );
            (Just(pool), ballots, 0..=(num_cands as u32))
        })
    }

    proptest! {
        #[test]
        fn exclusion_shrinks_the_pool_each_round((pool, bs, n) in arb_extraction()) {
            // Any deterministic choice among the running candidates.
            let script = |p: &[Candidate], b: &[Ballot]| {
                let total: usize = b.iter().map(|x| x.len()).sum();
                RunoffOutcome::winner(p[total % p.len()].clone())
            };
            let res = run_top_n(&pool, &bs, &VoteRules::with_winners(n), &script).unwrap();
            prop_assert_eq!(res.winners.len(), n as usize);
            prop_assert_eq!(res.round_stats.len(), n as usize);
            let distinct: HashSet<&Candidate> = res.winners.iter().collect();
            prop_assert_eq!(distinct.len(), res.winners.len());
            for (idx, rs) in res.round_stats.iter().enumerate() {
                prop_assert_eq!(rs.round, idx as u32 + 1);
                prop_assert_eq!(rs.remaining_candidates, pool.len() - idx);
                prop_assert_eq!(&rs.winner, &res.winners[idx]);
                prop_assert!(pool.contains(&rs.winner));
            }
        }
    }
}
