//! Scan pipeline: work partitioning, probe workers, the single result
//! collector, and the orchestrator that joins them.

pub mod checker;
pub mod collector;
pub mod plan;
pub mod worker;

pub use checker::{HandleChecker, ScanReport};
pub use collector::{MatchHandler, PrintHandler, RunStats};
pub use plan::{partition, resolve_worker_count, Range, WorkPlan};
