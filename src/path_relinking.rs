//! Path-relinking (spec §4.8): directed recombination from a `source`
//! schedule toward a `guide` schedule, one differing gene at a time,
//! tracking the best intermediate found. Used by the island model (C8)
//! as an extra migrant when an island stagnates.

use rand::seq::SliceRandom;
use rand_pcg::Pcg64;

use crate::dag::Dag;
use crate::local_search::critical_path_local_search;
use crate::schedule::{evaluate, Schedule};

/// Walks from `source` to `guide`, reassigning one differing task per
/// step and refining with critical-path local search. An empty diff
/// (the two schedules already agree everywhere) returns `source`
/// unchanged — not an error (spec §7).
pub fn path_relink(dag: &Dag, source: &Schedule, guide: &Schedule, rng: &mut Pcg64) -> Schedule {
    let mut diff: Vec<usize> = (0..source.assignment.len())
        .filter(|&t| source.assignment[t] != guide.assignment[t])
        .collect();
    if diff.is_empty() {
        return source.clone();
    }
    diff.shuffle(rng);

    let mut assignment = source.assignment.clone();
    let mut best = source.clone();
    for t in diff {
        assignment[t] = guide.assignment[t];
        let candidate = evaluate(dag, &assignment, &source.order);
        let refined = critical_path_local_search(dag, &candidate);
        if refined.makespan < best.makespan {
            best = refined;
        }
    }
    best
}
