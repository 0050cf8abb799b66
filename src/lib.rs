pub mod input;
pub mod probe;
pub mod runtime;
pub mod scan;

pub use input::NameList;
pub use probe::client::{AvailabilityProbe, HttpProbe, ProbeError, ProbeVerdict};
pub use probe::session::SignupSession;
pub use runtime::config::{CheckerConfig, CheckerConfigBuilder, CheckerConfigParams};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use scan::checker::{HandleChecker, ScanReport};
pub use scan::collector::{MatchHandler, PrintHandler, RunStats};
pub use scan::plan::{partition, resolve_worker_count, Range, WorkPlan};
