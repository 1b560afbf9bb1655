//! Import/export job domain types
//!
//! A job is created by the remote service and tracked locally until it
//! reaches a terminal status. All local mutation goes through
//! [`Job::apply`], which enforces the lifecycle state machine.

mod model;
mod status;
mod update;

pub use model::{Job, JobId, JobKind, ResultSummary};
pub use status::JobStatus;
pub use update::{ApplyOutcome, JobUpdate};
