//! Generation task lifecycle: state machine, backoff, registry and the
//! tracker that drives each task to a terminal state.

pub mod backoff;
pub mod id_gen;
pub mod registry;
pub mod tracker;
pub mod transitions;
pub mod types;

pub use backoff::BackoffPolicy;
pub use id_gen::TimestampIdGenerator;
pub use registry::TaskRegistry;
pub use tracker::{PersistencePolicy, ReportState, StatusReport, TaskTracker, TrackerError};
pub use transitions::{StateTransition, TransitionError};
pub use types::{Task, TaskState};
