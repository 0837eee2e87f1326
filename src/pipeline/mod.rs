// Classification pipeline: phases, runner and run reports

pub mod curation;
pub mod invariants;
pub mod phase;
pub mod processing;
pub mod runner;
pub mod summary;

pub use curation::{unresolved_cas_report, UnresolvedCas};
pub use invariants::{check_event_consistency, event_conflict, EventField};
pub use phase::{Phase, PhaseReport};
pub use runner::{Pipeline, PipelineReport};
pub use summary::RunSummary;
