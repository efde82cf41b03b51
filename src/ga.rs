//! Memetic genetic engine (spec §4.6). One population; islands compose
//! many of these (see [`crate::island`]). All schedules start from a
//! shared PEFT-derived order, so crossover never needs an order-repair
//! pass — a deliberate simplification the order-swap mutation is still
//! allowed to perturb per-individual.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::config::GaConfig;
use crate::constructors::peft_schedule;
use crate::dag::Dag;
use crate::local_search::critical_path_local_search;
use crate::schedule::{evaluate, Schedule};

/// Runs the genetic engine to completion and returns the best schedule
/// plus its convergence series (spec §6).
pub fn ga_run(dag: &Dag, config: &GaConfig) -> (Schedule, Vec<f64>) {
    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut population = initial_population(dag, config, &mut rng);
    let mut best = best_of(&population).clone();
    let mut convergence = Vec::with_capacity(config.generations);

    let mut stagnation: u32 = 0;
    let mut exploring = false;
    let mut exploration_remaining: u32 = 0;

    for _gen in 0..config.generations {
        let (mutation_rate, local_search_rate) = if exploring {
            ((config.mutation_rate * 5.0).min(1.0), config.local_search_rate / 5.0)
        } else {
            (config.mutation_rate, config.local_search_rate)
        };

        let mut next = Vec::with_capacity(population.len());
        next.push(best.clone());

        while next.len() < population.len() {
            let parent1 = tournament_select(&population, config.tournament_size, &mut rng);
            let parent2 = tournament_select(&population, config.tournament_size, &mut rng);
            let mut child_assignment = crossover(parent1, parent2, &mut rng);
            let mut child_order = parent1.order.clone();

            smart_assignment_mutation(dag, &mut child_assignment, mutation_rate, &mut rng);
            local_swap_order_mutation(dag, &mut child_order, &mut rng);

            let mut child = evaluate(dag, &child_assignment, &child_order);
            let beats_a_parent = child.makespan < parent1.makespan || child.makespan < parent2.makespan;
            let apply_local_search = if exploring {
                rng.gen::<f64>() < local_search_rate
            } else {
                beats_a_parent && rng.gen::<f64>() < local_search_rate
            };
            if apply_local_search {
                child = critical_path_local_search(dag, &child);
            }
            next.push(child);
        }
        population = next;

        let candidate = best_of(&population);
        let improved = candidate.makespan < best.makespan;
        if improved {
            best = candidate.clone();
            stagnation = 0;
            exploring = false;
        } else {
            stagnation += 1;
            if exploring {
                exploration_remaining = exploration_remaining.saturating_sub(1);
                if exploration_remaining == 0 {
                    exploring = false;
                }
            } else if stagnation >= config.stagnation_threshold {
                exploring = true;
                exploration_remaining = config.exploration_length;
            }
        }

        convergence.push(best.makespan);
    }

    (best, convergence)
}

pub(crate) fn initial_population(dag: &Dag, config: &GaConfig, rng: &mut Pcg64) -> Vec<Schedule> {
    let peft = peft_schedule(dag);
    let order = peft.order.clone();
    let mut population = Vec::with_capacity(config.population_size);
    population.push(peft);
    while population.len() < config.population_size {
        let assignment: Vec<usize> = (0..dag.n()).map(|_| rng.gen_range(0..dag.m())).collect();
        population.push(evaluate(dag, &assignment, &order));
    }
    population
}

pub(crate) fn best_of(population: &[Schedule]) -> &Schedule {
    population.iter().min_by(|a, b| a.makespan.total_cmp(&b.makespan)).expect("population is never empty")
}

pub(crate) fn tournament_select<'a>(population: &'a [Schedule], size: usize, rng: &mut Pcg64) -> &'a Schedule {
    (0..size)
        .map(|_| &population[rng.gen_range(0..population.len())])
        .min_by(|a, b| a.makespan.total_cmp(&b.makespan))
        .expect("tournament size is never zero")
}

pub(crate) fn crossover(parent1: &Schedule, parent2: &Schedule, rng: &mut Pcg64) -> Vec<usize> {
    parent1
        .assignment
        .iter()
        .zip(&parent2.assignment)
        .map(|(&a, &b)| if rng.gen_bool(0.5) { a } else { b })
        .collect()
}

pub(crate) fn smart_assignment_mutation(dag: &Dag, assignment: &mut [usize], rate: f64, rng: &mut Pcg64) {
    for t in 0..assignment.len() {
        if rng.gen::<f64>() >= rate {
            continue;
        }
        let oct_row = &dag.oct()[t];
        let (best_p, _) = oct_row
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .expect("every task has at least one processor");
        assignment[t] = if best_p == assignment[t] {
            if dag.m() > 1 {
                (best_p + 1 + rng.gen_range(0..dag.m() - 1)) % dag.m()
            } else {
                best_p
            }
        } else {
            best_p
        };
    }
}

pub(crate) fn local_swap_order_mutation(dag: &Dag, order: &mut [usize], rng: &mut Pcg64) {
    if rng.gen::<f64>() >= 0.1 {
        return;
    }
    for i in 0..order.len().saturating_sub(1) {
        if rng.gen::<f64>() >= 0.05 {
            continue;
        }
        let (a, b) = (order[i], order[i + 1]);
        if !dag.reachable(a, b) && !dag.reachable(b, a) {
            order.swap(i, i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn fork_join_heterogeneous() -> Dag {
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
    fn ga_matches_or_beats_peft() {
        let dag = fork_join_heterogeneous();
        let config = GaConfig { population_size: 12, generations: 25, seed: 1, ..GaConfig::default() };
        let (schedule, _) = ga_run(&dag, &config);
        assert!(schedule.makespan <= peft_schedule(&dag).makespan + 1e-9);
    }

    #[test]
    fn convergence_is_non_increasing() {
        let dag = fork_join_heterogeneous();
        let config = GaConfig { population_size: 12, generations: 40, seed: 5, ..GaConfig::default() };
        let (_, convergence) = ga_run(&dag, &config);
        for w in convergence.windows(2) {
            assert!(w[1] <= w[0] + 1e-9);
        }
    }

    #[test]
    fn reproducible_under_a_fixed_seed() {
        let dag = fork_join_heterogeneous();
        let config = GaConfig { population_size: 10, generations: 20, seed: 99, ..GaConfig::default() };
        let (first, first_conv) = ga_run(&dag, &config);
        let (second, second_conv) = ga_run(&dag, &config);
        assert_eq!(first.makespan, second.makespan);
        assert_eq!(first_conv, second_conv);
    }

    #[test]
    fn order_mutation_never_breaks_topological_validity() {
        let dag = fork_join_heterogeneous();
        let config = GaConfig { population_size: 10, generations: 30, seed: 11, ..GaConfig::default() };
        let (schedule, _) = ga_run(&dag, &config);
        assert!(dag.is_valid_topo_order(&schedule.order));
    }
}
