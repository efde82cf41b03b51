//! Upward Rank and the Optimistic Cost Table (spec §4.1).
//!
//! Free functions over the raw task/rate arrays rather than over
//! [`crate::dag::Dag`] directly: `Dag::new` must compute these before the
//! `Dag` it caches them on fully exists.

use crate::task::Task;

/// `u[t] = avg_comp(t) + max_succ(avg_comm(t, s) + u[s])`, computed in
/// reverse topological order so every successor's rank is already known.
pub fn upward_rank(tasks: &[Task], avg_rate: f64, topo: &[usize]) -> Vec<f64> {
    let n = tasks.len();
    let mut rank = vec![0.0_f64; n];
    for &t in topo.iter().rev() {
        let task = &tasks[t];
        let succ_term = task
            .succs
            .iter()
            .map(|&s| {
                let vol = *task.volume.get(&s).unwrap_or(&0) as f64;
                vol * avg_rate + rank[s]
            })
            .fold(0.0_f64, f64::max);
        rank[t] = task.avg_comp() + succ_term;
    }
    rank
}

/// `OCT[t][p]`: expected remaining-path cost from `t` on `p` assuming the
/// best successor placement. Iterated to a fixed point (capped at `n`
/// passes) per spec's robustness note; a single reverse-topological pass
/// already suffices for an acyclic DAG, the extra passes are a guard, not
/// a requirement.
pub fn optimistic_cost_table(tasks: &[Task], m: usize, rate: &[Vec<f64>], topo: &[usize]) -> Vec<Vec<f64>> {
    let n = tasks.len();
    let mut oct = vec![vec![0.0_f64; m]; n];
    for _pass in 0..n.max(1) {
        let mut changed = false;
        for &t in topo.iter().rev() {
            let task = &tasks[t];
            for p in 0..m {
                let best = task
                    .succs
                    .iter()
                    .map(|&s| {
                        let vol = *task.volume.get(&s).unwrap_or(&0) as f64;
                        let stask = &tasks[s];
                        (0..m)
                            .map(|q| {
                                let comm = if p == q { 0.0 } else { vol * rate[p][q] };
                                oct[s][q] + stask.comp[q] + comm
                            })
                            .fold(f64::MAX, f64::min)
                    })
                    .fold(0.0_f64, f64::max);
                if (best - oct[t][p]).abs() > 1e-12 {
                    changed = true;
                }
                oct[t][p] = best;
            }
        }
        if !changed {
            break;
        }
    }
    oct
}

/// `peft[t] = mean_p(OCT[t][p])`.
pub fn peft_rank(oct: &[Vec<f64>]) -> Vec<f64> {
    oct.iter()
        .map(|row| row.iter().sum::<f64>() / row.len() as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(costs: &[f64]) -> Vec<Task> {
        let mut tasks: Vec<Task> = costs.iter().map(|&c| Task::new(0, vec![c])).collect();
        for (i, task) in tasks.iter_mut().enumerate() {
            task.id = i;
        }
        for i in 0..tasks.len() - 1 {
            let (a, b) = (i, i + 1);
            tasks[a].succs.push(b);
            tasks[b].preds.push(a);
            tasks[a].volume.insert(b, 0);
        }
        tasks
    }

    #[test]
    fn upward_rank_of_exit_task_is_its_avg_comp() {
        let tasks = chain(&[3.0, 5.0]);
        let topo = vec![0, 1];
        let rank = upward_rank(&tasks, 0.0, &topo);
        assert_eq!(rank[1], 5.0);
        assert_eq!(rank[0], 3.0 + 5.0);
    }

    #[test]
    fn oct_of_exit_task_is_zero_on_every_processor() {
        let tasks = chain(&[3.0, 5.0]);
        let rate = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let topo = vec![0, 1];
        let oct = optimistic_cost_table(&tasks, 2, &rate, &topo);
        assert_eq!(oct[1], vec![0.0, 0.0]);
    }

    #[test]
    fn peft_rank_is_mean_of_oct_row() {
        let oct = vec![vec![2.0, 4.0], vec![0.0, 0.0]];
        let ranks = peft_rank(&oct);
        assert_eq!(ranks, vec![3.0, 0.0]);
    }
}
