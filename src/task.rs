//! Task records held in a [`crate::dag::Dag`]'s task arena.

use std::collections::HashMap;

/// One DAG task, immutable once the owning [`crate::dag::Dag`] is built.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: usize,
    /// `comp[p]` is the computation cost of this task on processor `p`.
    pub comp: Vec<f64>,
    pub preds: Vec<usize>,
    pub succs: Vec<usize>,
    /// Successor id -> data volume transferred on that edge.
    pub volume: HashMap<usize, u64>,
}

impl Task {
    pub fn new(id: usize, comp: Vec<f64>) -> Self {
        Task {
            id,
            comp,
            preds: Vec::new(),
            succs: Vec::new(),
            volume: HashMap::new(),
        }
    }

    pub fn avg_comp(&self) -> f64 {
        self.comp.iter().sum::<f64>() / self.comp.len() as f64
    }

    pub fn is_source(&self) -> bool {
        self.preds.is_empty()
    }

    pub fn is_sink(&self) -> bool {
        self.succs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avg_comp_is_the_mean_across_processors() {
        let task = Task::new(0, vec![2.0, 4.0, 6.0]);
        assert_eq!(task.avg_comp(), 4.0);
    }

    #[test]
    fn fresh_task_has_no_edges() {
        let task = Task::new(0, vec![1.0]);
        assert!(task.is_source());
        assert!(task.is_sink());
    }
}
