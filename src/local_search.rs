//! Critical-path local search (spec §2 C4, §4.3) — the "memetic"
//! refinement operator shared by the ant engine and the genetic engine.
//! Neighborhood is restricted to critical-path tasks, which is what
//! keeps this tractable on large DAGs; the execution order is never
//! touched.

use crate::dag::Dag;
use crate::schedule::{evaluate, Schedule};

/// Best-improvement local search (spec §9's choice between
/// first-improvement and best-improvement): each sweep scans every
/// (critical-path task, alternative processor) pair and applies only the
/// single strictly-improving move with the lowest resulting makespan.
/// Repeats until a sweep finds no improving move. Idempotent at a local
/// optimum (spec §8): a second call returns a schedule identical to its
/// input.
pub fn critical_path_local_search(dag: &Dag, schedule: &Schedule) -> Schedule {
    let mut current = schedule.clone();
    loop {
        let critical_path = current.critical_path();
        let mut best: Option<(usize, usize, f64)> = None;

        for &t in &critical_path {
            let current_p = current.assignment[t];
            for p in 0..dag.m() {
                if p == current_p {
                    continue;
                }
                let mut assignment = current.assignment.clone();
                assignment[t] = p;
                let candidate = evaluate(dag, &assignment, &current.order);
                if candidate.makespan < current.makespan
                    && best.map_or(true, |(_, _, best_makespan)| candidate.makespan < best_makespan)
                {
                    best = Some((t, p, candidate.makespan));
                }
            }
        }

        match best {
            Some((t, p, _)) => {
                let mut assignment = current.assignment.clone();
                assignment[t] = p;
                current = evaluate(dag, &assignment, &current.order);
            }
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Dag;
    use crate::task::Task;

    fn fork_join_heterogeneous() -> Dag {
        // Task 0 is 10x cheaper on P0; tasks 1-4 fork from 0 and are 10x
        // cheaper on P1; task 5 joins.
        let mut t0 = Task::new(0, vec![1.0, 10.0]);
        let mut forks: Vec<Task> = (1..=4).map(|i| Task::new(i, vec![10.0, 1.0])).collect();
        let mut join = Task::new(5, vec![5.0, 5.0]);

        t0.succs = (1..=4).collect();
        for i in 1..=4 {
            t0.volume.insert(i, 0);
        }
        for fork in forks.iter_mut() {
            fork.preds = vec![0];
            fork.succs = vec![5];
            fork.volume.insert(5, 0);
        }
        join.preds = (1..=4).collect();

        let mut tasks = vec![t0];
        tasks.append(&mut forks);
        tasks.push(join);
        let rate = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        Dag::new(tasks, rate).unwrap()
    }

    #[test]
    fn local_search_improves_a_bad_initial_assignment() {
        let dag = fork_join_heterogeneous();
        // Deliberately wrong: everything on P0, where the forks are expensive.
        let assignment = vec![0usize; 6];
        let order: Vec<usize> = dag.ranked_tasks().to_vec();
        let before = crate::schedule::evaluate(&dag, &assignment, &order);
        let after = critical_path_local_search(&dag, &before);
        assert!(after.makespan <= before.makespan);
    }

    #[test]
    fn local_search_is_idempotent_at_a_local_optimum() {
        let dag = fork_join_heterogeneous();
        let assignment = vec![0usize; 6];
        let order: Vec<usize> = dag.ranked_tasks().to_vec();
        let schedule = crate::schedule::evaluate(&dag, &assignment, &order);
        let once = critical_path_local_search(&dag, &schedule);
        let twice = critical_path_local_search(&dag, &once);
        assert_eq!(once.makespan, twice.makespan);
        assert_eq!(once.assignment, twice.assignment);
    }

    #[test]
    fn local_search_never_touches_order() {
        let dag = fork_join_heterogeneous();
        let assignment = vec![0usize; 6];
        let order: Vec<usize> = dag.ranked_tasks().to_vec();
        let schedule = crate::schedule::evaluate(&dag, &assignment, &order);
        let refined = critical_path_local_search(&dag, &schedule);
        assert_eq!(refined.order, schedule.order);
    }
}
