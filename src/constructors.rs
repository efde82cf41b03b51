//! PEFT and HEFT list-scheduling constructors (spec §2 C5, §4.4). Both
//! produce deterministic baseline schedules used to scale the ant
//! engine's pheromone bounds and to seed the genetic engine's initial
//! population.

use itertools::Itertools;

use crate::dag::Dag;
use crate::schedule::{evaluate, Schedule};

/// HEFT: tasks in Upward-Rank-descending order, each assigned to the
/// processor minimizing `est + comp[t][p]`.
pub fn heft_schedule(dag: &Dag) -> Schedule {
    list_schedule(dag, dag.ranked_tasks(), false)
}

/// PEFT: tasks in PEFT-rank-descending order, each assigned to the
/// processor minimizing `est + comp[t][p] + OCT[t][p]`.
pub fn peft_schedule(dag: &Dag) -> Schedule {
    list_schedule(dag, dag.peft_order(), true)
}

/// Shared list-scheduling walk. `priority_order` ranks tasks by urgency;
/// since neither Upward Rank nor PEFT rank is guaranteed a strict
/// topological order in pathological DAGs, each step picks the
/// highest-priority task whose predecessors are all already placed
/// rather than assuming `priority_order` itself is ready-respecting.
fn list_schedule(dag: &Dag, priority_order: &[usize], use_oct: bool) -> Schedule {
    let n = dag.n();
    let m = dag.m();
    let mut assignment = vec![0usize; n];
    let mut finish = vec![0.0_f64; n];
    let mut proc_ready = vec![0.0_f64; m];
    let mut scheduled = vec![false; n];
    let mut order = Vec::with_capacity(n);

    for _ in 0..n {
        let task_id = *priority_order
            .iter()
            .find(|&&t| !scheduled[t] && dag.task(t).preds.iter().all(|&d| scheduled[d]))
            .expect("a ready task must exist while unscheduled tasks remain in an acyclic DAG");

        let candidate_finish: Vec<f64> = (0..m)
            .map(|p| {
                let max_data = dag
                    .task(task_id)
                    .preds
                    .iter()
                    .map(|&d| finish[d] + dag.comm_cost(d, task_id, assignment[d], p))
                    .fold(0.0_f64, f64::max);
                proc_ready[p].max(max_data) + dag.task(task_id).comp[p]
            })
            .collect();
        let best_p = (0..m)
            .position_min_by(|&p1, &p2| {
                let metric = |p: usize| if use_oct { candidate_finish[p] + dag.oct()[task_id][p] } else { candidate_finish[p] };
                metric(p1).total_cmp(&metric(p2))
            })
            .expect("every task has at least one processor");
        let best_finish = candidate_finish[best_p];

        assignment[task_id] = best_p;
        finish[task_id] = best_finish;
        proc_ready[best_p] = best_finish;
        scheduled[task_id] = true;
        order.push(task_id);
    }

    evaluate(dag, &assignment, &order)
}
