//! Error taxonomy surfaced by the scheduling core (spec §7).
//!
//! Everything else named in §7 — non-finite desirability, an empty
//! path-relinking diff — is absorbed locally with a defined fallback and
//! never reaches this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("malformed DAG input: {0}")]
    InputFormat(String),

    #[error("DAG consistency violation: {0}")]
    DagConsistency(String),

    #[error("ant construction stuck before placing task {task}")]
    ConstructionStuck { task: usize },
}
