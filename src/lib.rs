//! Heterogeneous multiprocessor DAG scheduling: deterministic PEFT/HEFT
//! list-scheduling baselines, a Max-Min Ant System with rank-based
//! updates (MMAS-AS_rank), and a memetic island-model genetic algorithm
//! with on-demand path-relinking migration.
//!
//! Everything here is single-threaded and deterministic under a fixed
//! RNG seed; parallelizing ant construction or island evolution is a
//! caller-level concern, not this crate's.

mod aco;
mod config;
mod constructors;
mod dag;
mod error;
mod ga;
mod heuristics;
mod island;
mod local_search;
mod path_relinking;
mod reader;
mod schedule;
mod task;

pub use aco::aco_run;
pub use config::{AcoConfig, GaConfig, IslandConfig};
pub use constructors::{heft_schedule, peft_schedule};
pub use dag::Dag;
pub use error::ScheduleError;
pub use ga::ga_run;
pub use island::island_run;
pub use local_search::critical_path_local_search;
pub use reader::load_dag;
pub use schedule::{evaluate, Link, Schedule};
pub use task::Task;
