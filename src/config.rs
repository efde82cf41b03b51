//! Solver tuning, kept as plain configuration structs rather than
//! constants (spec §9's directive — every tunable named in §4 is a
//! runtime knob, never hard-coded).

/// Configuration for [`crate::aco::aco_run`] (spec §6).
#[derive(Debug, Clone)]
pub struct AcoConfig {
    pub num_ants: usize,
    pub generations: usize,
    pub alpha: f64,
    pub beta: f64,
    pub rho: f64,
    pub q0: f64,
    pub elitist_weight: f64,
    pub ranked_ants_k: usize,
    pub smoothing_s: f64,
    pub seed: u64,
    pub soft_stagnation: u32,
    pub hard_stagnation: u32,
    pub convergence_generations: u32,
    pub convergence_epsilon: f64,
    pub min_diversity: f64,
}

impl Default for AcoConfig {
    fn default() -> Self {
        AcoConfig {
            num_ants: 20,
            generations: 200,
            alpha: 1.0,
            beta: 1.0,
            rho: 0.1,
            q0: 0.9,
            elitist_weight: 1.0,
            ranked_ants_k: 6,
            smoothing_s: 0.0,
            seed: 0,
            soft_stagnation: 25,
            hard_stagnation: 50,
            convergence_generations: 30,
            convergence_epsilon: 1e-6,
            min_diversity: 0.05,
        }
    }
}

/// Configuration for [`crate::ga::ga_run`] (spec §6).
#[derive(Debug, Clone)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub local_search_rate: f64,
    pub seed: u64,
    pub tournament_size: usize,
    pub stagnation_threshold: u32,
    pub exploration_length: u32,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            population_size: 40,
            generations: 200,
            mutation_rate: 0.05,
            local_search_rate: 0.3,
            seed: 0,
            tournament_size: 5,
            stagnation_threshold: 30,
            exploration_length: 15,
        }
    }
}

/// Configuration for [`crate::island::island_run`] (spec §6).
#[derive(Debug, Clone)]
pub struct IslandConfig {
    pub num_islands: usize,
    pub total_generations: usize,
    pub migration_size: usize,
    pub population_per_island: usize,
    pub mutation_rate: f64,
    pub local_search_rate: f64,
    pub seed: u64,
    pub tournament_size: usize,
    pub stagnation_threshold: u32,
    pub exploration_length: u32,
}

impl Default for IslandConfig {
    fn default() -> Self {
        IslandConfig {
            num_islands: 4,
            total_generations: 200,
            migration_size: 3,
            population_per_island: 40,
            mutation_rate: 0.05,
            local_search_rate: 0.3,
            seed: 0,
            tournament_size: 5,
            stagnation_threshold: 30,
            exploration_length: 15,
        }
    }
}

impl IslandConfig {
    pub(crate) fn ga_config_for_island(&self, island_seed: u64) -> GaConfig {
        GaConfig {
            population_size: self.population_per_island,
            generations: self.total_generations,
            mutation_rate: self.mutation_rate,
            local_search_rate: self.local_search_rate,
            seed: island_seed,
            tournament_size: self.tournament_size,
            stagnation_threshold: self.stagnation_threshold,
            exploration_length: self.exploration_length,
        }
    }
}
