//! Island-model orchestration (spec §4.7). Each island is its own
//! actor: it owns its population and RNG outright, and migration is a
//! message that atomically replaces its worst schedules and resets its
//! counters — no counter or population is ever shared by reference
//! across islands (spec §9's redesign note).

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::config::IslandConfig;
use crate::dag::Dag;
use crate::ga::{best_of, crossover, initial_population, local_swap_order_mutation, smart_assignment_mutation, tournament_select};
use crate::local_search::critical_path_local_search;
use crate::path_relinking::path_relink;
use crate::schedule::{evaluate, Schedule};

struct Island {
    population: Vec<Schedule>,
    best: Schedule,
    stagnation: u32,
    exploring: bool,
    exploration_remaining: u32,
    rng: Pcg64,
}

/// Runs `config.num_islands` GA populations in lockstep for
/// `config.total_generations` outer generations, migrating on demand
/// whenever an island's stagnation counter crosses its threshold, and
/// returns the best schedule found by any island.
pub fn island_run(dag: &Dag, config: &IslandConfig) -> Schedule {
    let mut islands: Vec<Island> = (0..config.num_islands)
        .map(|i| {
            let seed = config.seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            let mut rng = Pcg64::seed_from_u64(seed);
            let population = initial_population(dag, &config.ga_config_for_island(seed), &mut rng);
            let best = best_of(&population).clone();
            Island { population, best, stagnation: 0, exploring: false, exploration_remaining: 0, rng }
        })
        .collect();

    for _gen in 0..config.total_generations {
        for island in islands.iter_mut() {
            evolve_once(dag, island, config);
        }

        let best_idx = islands
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.best.makespan.total_cmp(&b.best.makespan))
            .map(|(i, _)| i)
            .expect("at least one island always exists");
        let best_island_schedule = islands[best_idx].best.clone();
        let mut best_island_population = islands[best_idx].population.clone();
        best_island_population.sort_by(|a, b| a.makespan.total_cmp(&b.makespan));

        for i in 0..islands.len() {
            if i == best_idx || islands[i].stagnation < config.stagnation_threshold {
                continue;
            }
            log::warn!("island {i} stagnated; migrating from island {best_idx}");
            let source = islands[i].best.clone();
            let relinked = path_relink(dag, &source, &best_island_schedule, &mut islands[i].rng);

            let mut migrants: Vec<Schedule> = best_island_population.iter().take(config.migration_size).cloned().collect();
            migrants.push(relinked);

            islands[i].population.sort_by(|a, b| b.makespan.total_cmp(&a.makespan));
            let keep = islands[i].population.len().saturating_sub(migrants.len());
            islands[i].population.truncate(keep);
            islands[i].population.extend(migrants);

            islands[i].stagnation = 0;
            islands[i].exploring = false;
            islands[i].exploration_remaining = 0;
            islands[i].best = best_of(&islands[i].population).clone();
        }
    }

    islands
        .into_iter()
        .map(|island| island.best)
        .min_by(|a, b| a.makespan.total_cmp(&b.makespan))
        .expect("at least one island always exists")
}

fn evolve_once(dag: &Dag, island: &mut Island, config: &IslandConfig) {
    let (mutation_rate, local_search_rate) = if island.exploring {
        ((config.mutation_rate * 5.0).min(1.0), config.local_search_rate / 5.0)
    } else {
        (config.mutation_rate, config.local_search_rate)
    };

    let mut next = Vec::with_capacity(island.population.len());
    next.push(island.best.clone());
    while next.len() < island.population.len() {
        let parent1 = tournament_select(&island.population, config.tournament_size, &mut island.rng);
        let parent2 = tournament_select(&island.population, config.tournament_size, &mut island.rng);
        let mut child_assignment = crossover(parent1, parent2, &mut island.rng);
        let mut child_order = parent1.order.clone();

        smart_assignment_mutation(dag, &mut child_assignment, mutation_rate, &mut island.rng);
        local_swap_order_mutation(dag, &mut child_order, &mut island.rng);

        let mut child = evaluate(dag, &child_assignment, &child_order);
        let beats_a_parent = child.makespan < parent1.makespan || child.makespan < parent2.makespan;
        let apply_local_search = if island.exploring {
            island.rng.gen::<f64>() < local_search_rate
        } else {
            beats_a_parent && island.rng.gen::<f64>() < local_search_rate
        };
        if apply_local_search {
            child = critical_path_local_search(dag, &child);
        }
        next.push(child);
    }
    island.population = next;

    let candidate = best_of(&island.population).clone();
    if candidate.makespan < island.best.makespan {
        island.best = candidate;
        island.stagnation = 0;
        island.exploring = false;
    } else {
        island.stagnation += 1;
        if island.exploring {
            island.exploration_remaining = island.exploration_remaining.saturating_sub(1);
            if island.exploration_remaining == 0 {
                island.exploring = false;
            }
        } else if island.stagnation >= config.stagnation_threshold {
            island.exploring = true;
            island.exploration_remaining = config.exploration_length;
        }
    }
}
