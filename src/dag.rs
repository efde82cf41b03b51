//! The DAG model (spec §2 C1, §3). Arena representation: tasks live in a
//! single `Vec` indexed by id, never behind a graph library's node-index
//! type (see the cyclic-cache redesign note in spec §9) — every derived
//! cache is computed once, here, at construction time and never
//! recomputed or re-entered.

use std::collections::VecDeque;

use crate::error::ScheduleError;
use crate::heuristics;
use crate::task::Task;

pub struct Dag {
    tasks: Vec<Task>,
    m: usize,
    rate: Vec<Vec<f64>>,
    avg_rate: f64,
    topo: Vec<usize>,
    reach: Vec<Vec<bool>>,
    upward_rank: Vec<f64>,
    ranked: Vec<usize>,
    oct: Vec<Vec<f64>>,
    peft_rank: Vec<f64>,
    peft_order: Vec<usize>,
}

impl Dag {
    /// Validates and builds a `Dag`, computing every derived cache.
    ///
    /// Computing the topological order is unavoidable here anyway (it's
    /// how acyclicity is checked), so the Upward Rank/OCT/reachability
    /// caches are piggy-backed onto the same construction pass rather
    /// than deferred behind interior mutability — there is no point
    /// introducing a lazy-cache mechanism for data that never changes
    /// once the DAG exists.
    pub fn new(tasks: Vec<Task>, rate: Vec<Vec<f64>>) -> Result<Self, ScheduleError> {
        let n = tasks.len();
        if n == 0 {
            return Err(ScheduleError::InputFormat("DAG has zero tasks".into()));
        }
        let m = rate.len();
        if m == 0 {
            return Err(ScheduleError::InputFormat("DAG has zero processors".into()));
        }
        for (p, row) in rate.iter().enumerate() {
            if row.len() != m {
                return Err(ScheduleError::InputFormat(format!(
                    "comm-rate row {p} has {} entries, expected {m}",
                    row.len()
                )));
            }
            if row.iter().any(|&v| v < 0.0) {
                return Err(ScheduleError::InputFormat(format!("comm-rate row {p} has a negative entry")));
            }
        }
        for task in &tasks {
            if task.comp.len() != m {
                return Err(ScheduleError::InputFormat(format!(
                    "task {} has {} processor costs, expected {m}",
                    task.id,
                    task.comp.len()
                )));
            }
            if task.comp.iter().any(|&c| c < 0.0) {
                return Err(ScheduleError::InputFormat(format!(
                    "task {} has a negative computation cost",
                    task.id
                )));
            }
            for &succ in &task.succs {
                if succ >= n {
                    return Err(ScheduleError::InputFormat(format!(
                        "task {} has an edge to out-of-range task {succ}",
                        task.id
                    )));
                }
            }
        }

        let topo = kahn_topo_order(&tasks)?;

        if !tasks.iter().any(Task::is_source) {
            return Err(ScheduleError::DagConsistency("DAG has no source task".into()));
        }
        if !tasks.iter().any(Task::is_sink) {
            return Err(ScheduleError::DagConsistency("DAG has no sink task".into()));
        }

        let avg_rate = average_off_diagonal(&rate);
        let reach = transitive_closure(&tasks, &topo);

        let upward_rank = heuristics::upward_rank(&tasks, avg_rate, &topo);
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| upward_rank[b].total_cmp(&upward_rank[a]));

        let oct = heuristics::optimistic_cost_table(&tasks, m, &rate, &topo);
        let peft_rank = heuristics::peft_rank(&oct);
        let mut peft_order: Vec<usize> = (0..n).collect();
        peft_order.sort_by(|&a, &b| peft_rank[b].total_cmp(&peft_rank[a]));

        Ok(Dag {
            tasks,
            m,
            rate,
            avg_rate,
            topo,
            reach,
            upward_rank,
            ranked,
            oct,
            peft_rank,
            peft_order,
        })
    }

    pub fn n(&self) -> usize {
        self.tasks.len()
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn task(&self, id: usize) -> &Task {
        &self.tasks[id]
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn rate(&self, p1: usize, p2: usize) -> f64 {
        self.rate[p1][p2]
    }

    pub fn avg_rate(&self) -> f64 {
        self.avg_rate
    }

    pub fn topo_order(&self) -> &[usize] {
        &self.topo
    }

    pub fn reachable(&self, i: usize, j: usize) -> bool {
        self.reach[i][j]
    }

    pub fn upward_rank(&self, t: usize) -> f64 {
        self.upward_rank[t]
    }

    /// Tasks ordered by Upward Rank descending (spec §4.1) — also a
    /// valid topological order, since rank strictly decreases along
    /// every edge.
    pub fn ranked_tasks(&self) -> &[usize] {
        &self.ranked
    }

    pub fn oct(&self) -> &Vec<Vec<f64>> {
        &self.oct
    }

    pub fn peft_rank(&self, t: usize) -> f64 {
        self.peft_rank[t]
    }

    /// Tasks ordered by PEFT rank descending (spec §4.1/§4.4).
    pub fn peft_order(&self) -> &[usize] {
        &self.peft_order
    }

    /// `comm(i, j, p1, p2) = volume(i, j) * R[p1][p2]` when `p1 != p2`,
    /// else `0` (spec §3).
    pub fn comm_cost(&self, i: usize, j: usize, p1: usize, p2: usize) -> f64 {
        if p1 == p2 {
            return 0.0;
        }
        let vol = *self.tasks[i].volume.get(&j).unwrap_or(&0) as f64;
        vol * self.rate[p1][p2]
    }

    /// Whether `order` is a topological order of this DAG (spec §4.2's
    /// contract that callers must supply one).
    pub fn is_valid_topo_order(&self, order: &[usize]) -> bool {
        if order.len() != self.n() {
            return false;
        }
        let mut pos = vec![0usize; self.n()];
        for (i, &t) in order.iter().enumerate() {
            pos[t] = i;
        }
        self.tasks.iter().all(|task| task.succs.iter().all(|&s| pos[task.id] < pos[s]))
    }
}

fn kahn_topo_order(tasks: &[Task]) -> Result<Vec<usize>, ScheduleError> {
    let n = tasks.len();
    let mut indeg = vec![0usize; n];
    for t in tasks {
        for &s in &t.succs {
            indeg[s] += 1;
        }
    }
    // Deterministic: tasks enter the ready queue in ascending id order.
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indeg[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(t) = queue.pop_front() {
        order.push(t);
        for &s in &tasks[t].succs {
            indeg[s] -= 1;
            if indeg[s] == 0 {
                queue.push_back(s);
            }
        }
    }
    if order.len() != n {
        return Err(ScheduleError::DagConsistency(format!(
            "cycle detected: only {} of {n} tasks are orderable",
            order.len()
        )));
    }
    Ok(order)
}

fn average_off_diagonal(rate: &[Vec<f64>]) -> f64 {
    let m = rate.len();
    if m < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for p1 in 0..m {
        for p2 in 0..m {
            if p1 != p2 {
                sum += rate[p1][p2];
                count += 1;
            }
        }
    }
    sum / count as f64
}

fn transitive_closure(tasks: &[Task], topo: &[usize]) -> Vec<Vec<bool>> {
    let n = tasks.len();
    let mut reach = vec![vec![false; n]; n];
    for &t in topo.iter().rev() {
        for &s in &tasks[t].succs {
            reach[t][s] = true;
            for j in 0..n {
                if reach[s][j] {
                    reach[t][j] = true;
                }
            }
        }
    }
    reach
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Dag {
        // A -> B, A -> C, B -> D, C -> D; homogeneous costs, zero comm.
        let mut a = Task::new(0, vec![10.0, 10.0]);
        let mut b = Task::new(1, vec![10.0, 10.0]);
        let mut c = Task::new(2, vec![10.0, 10.0]);
        let d = Task::new(3, vec![10.0, 10.0]);
        a.succs = vec![1, 2];
        a.volume.insert(1, 1);
        a.volume.insert(2, 1);
        b.succs = vec![3];
        b.preds = vec![0];
        b.volume.insert(3, 1);
        c.succs = vec![3];
        c.preds = vec![0];
        c.volume.insert(3, 1);
        let mut d = d;
        d.preds = vec![1, 2];
        let rate = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        Dag::new(vec![a, b, c, d], rate).unwrap()
    }

    #[test]
    fn topo_order_respects_precedence() {
        let dag = diamond();
        assert!(dag.is_valid_topo_order(dag.topo_order()));
    }

    #[test]
    fn reachability_matches_transitive_closure() {
        let dag = diamond();
        assert!(dag.reachable(0, 3));
        assert!(!dag.reachable(1, 2));
        assert!(!dag.reachable(3, 0));
    }

    #[test]
    fn cycle_is_rejected() {
        let mut a = Task::new(0, vec![1.0]);
        let mut b = Task::new(1, vec![1.0]);
        a.succs = vec![1];
        a.preds = vec![1];
        b.succs = vec![0];
        b.preds = vec![0];
        let err = Dag::new(vec![a, b], vec![vec![0.0]]).unwrap_err();
        assert!(matches!(err, ScheduleError::DagConsistency(_)));
    }

    #[test]
    fn mismatched_processor_count_is_input_format_error() {
        let task = Task::new(0, vec![1.0, 2.0]);
        let err = Dag::new(vec![task], vec![vec![0.0]]).unwrap_err();
        assert!(matches!(err, ScheduleError::InputFormat(_)));
    }

    #[test]
    fn single_task_dag_has_itself_as_source_and_sink() {
        let task = Task::new(0, vec![5.0, 2.0, 7.0]);
        let dag = Dag::new(vec![task], vec![vec![0.0; 3]; 3]).unwrap();
        assert_eq!(dag.n(), 1);
        assert_eq!(dag.topo_order(), &[0]);
    }
}
