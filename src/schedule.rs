//! Schedule encoding and the makespan evaluator (spec §2 C3, §3, §4.2).

use crate::dag::Dag;

/// The predecessor that dictated a task's actual start time: a data
/// dependency, the previous task on the same processor, or nothing (the
/// task started at time zero). Sized `n + 1` on [`Schedule`], with index
/// `n` reserved for the exit-task sentinel (spec §9 — an explicit array
/// slot instead of a `-1` key).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    DataPred(usize),
    ProcPred(usize),
    None,
}

/// An `(assignment, order, makespan, critical-path-links)` tuple (spec
/// §3). Cheap to clone: two `usize`-array-dominated structs.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub assignment: Vec<usize>,
    pub order: Vec<usize>,
    pub makespan: f64,
    pub links: Vec<Link>,
}

impl Schedule {
    /// The chain of tasks from a source to the exit task that determined
    /// the makespan, traced by following [`Link`] pointers backward from
    /// the sentinel entry.
    pub fn critical_path(&self) -> Vec<usize> {
        let n = self.assignment.len();
        let mut path = Vec::new();
        let mut cur = match self.links[n] {
            Link::DataPred(t) => Some(t),
            _ => None,
        };
        while let Some(t) = cur {
            path.push(t);
            cur = match self.links[t] {
                Link::DataPred(p) | Link::ProcPred(p) => Some(p),
                Link::None => None,
            };
        }
        path.reverse();
        path
    }
}

/// Computes the makespan and critical-path links of `(assignment,
/// order)` against `dag`. If `order` is empty, substitutes the DAG's
/// ranked-task order (spec §4.2's contract). `order` is assumed to be a
/// topological order of `dag` otherwise — callers must legalize it
/// themselves (spec §4.2, §9).
///
/// Pure: touches no shared state, so repeated calls with the same inputs
/// are bit-for-bit identical (spec §8).
pub fn evaluate(dag: &Dag, assignment: &[usize], order: &[usize]) -> Schedule {
    let n = dag.n();
    let m = dag.m();
    let order: Vec<usize> = if order.is_empty() {
        dag.ranked_tasks().to_vec()
    } else {
        order.to_vec()
    };

    let mut finish = vec![0.0_f64; n];
    let mut proc_ready = vec![0.0_f64; m];
    let mut last_on: Vec<Option<usize>> = vec![None; m];
    let mut links = vec![Link::None; n + 1];

    for &t in &order {
        let p = assignment[t];
        let proc_ready_time = proc_ready[p];

        let mut max_data = 0.0_f64;
        let mut data_crit_pred: Option<usize> = None;
        for &d in &dag.task(t).preds {
            let data_ready = finish[d] + dag.comm_cost(d, t, assignment[d], p);
            if data_crit_pred.is_none() || data_ready > max_data {
                max_data = data_ready;
                data_crit_pred = Some(d);
            }
        }

        // Ties between procReady and maxData break toward procReady
        // (spec §5), hence `>=` rather than the literal `>` of §4.2.
        let (start, link) = if proc_ready_time >= max_data {
            (proc_ready_time, last_on[p].map(Link::ProcPred).unwrap_or(Link::None))
        } else {
            (max_data, data_crit_pred.map(Link::DataPred).unwrap_or(Link::None))
        };

        let f = start + dag.task(t).comp[p];
        finish[t] = f;
        links[t] = link;
        proc_ready[p] = f;
        last_on[p] = Some(t);
    }

    let (exit_task, makespan) = finish
        .iter()
        .enumerate()
        .fold((0usize, f64::MIN), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) });
    links[n] = Link::DataPred(exit_task);

    Schedule {
        assignment: assignment.to_vec(),
        order,
        makespan,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Dag;
    use crate::task::Task;

    fn diamond() -> Dag {
        let mut a = Task::new(0, vec![10.0, 10.0]);
        let mut b = Task::new(1, vec![10.0, 10.0]);
        let mut c = Task::new(2, vec![10.0, 10.0]);
        let mut d = Task::new(3, vec![10.0, 10.0]);
        a.succs = vec![1, 2];
        a.volume.insert(1, 1);
        a.volume.insert(2, 1);
        b.succs = vec![3];
        b.preds = vec![0];
        b.volume.insert(3, 1);
        c.succs = vec![3];
        c.preds = vec![0];
        c.volume.insert(3, 1);
        d.preds = vec![1, 2];
        let rate = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        Dag::new(vec![a, b, c, d], rate).unwrap()
    }

    #[test]
    fn diamond_makespan_is_thirty() {
        let dag = diamond();
        let assignment = vec![0, 0, 1, 0];
        let order = vec![0, 1, 2, 3];
        let schedule = evaluate(&dag, &assignment, &order);
        assert_eq!(schedule.makespan, 30.0);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let dag = diamond();
        let assignment = vec![0, 0, 1, 0];
        let order = vec![0, 1, 2, 3];
        let first = evaluate(&dag, &assignment, &order);
        let second = evaluate(&dag, &assignment, &order);
        assert_eq!(first.makespan, second.makespan);
    }

    #[test]
    fn single_task_schedule() {
        let task = Task::new(0, vec![5.0, 2.0, 7.0]);
        let dag = Dag::new(vec![task], vec![vec![0.0; 3]; 3]).unwrap();
        let schedule = evaluate(&dag, &[1], &[0]);
        assert_eq!(schedule.makespan, 2.0);
    }

    #[test]
    fn critical_path_ends_at_exit_task() {
        let dag = diamond();
        let assignment = vec![0, 0, 1, 0];
        let order = vec![0, 1, 2, 3];
        let schedule = evaluate(&dag, &assignment, &order);
        let cp = schedule.critical_path();
        assert_eq!(*cp.last().unwrap(), 3);
        assert_eq!(cp[0], 0);
    }

    #[test]
    fn empty_order_falls_back_to_ranked_tasks() {
        let dag = diamond();
        let assignment = vec![0, 0, 1, 0];
        let schedule = evaluate(&dag, &assignment, &[]);
        assert_eq!(schedule.order.len(), dag.n());
    }
}
