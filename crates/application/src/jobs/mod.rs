//! Import/export job lifecycle: submission, polling and history.

mod history_store;
mod poller;
mod submission;
mod wire;
mod workflow;

pub use history_store::{HistoryEvent, JobHistoryStore, UpdateOutcome};
pub use poller::{JobPoller, PollHandle, PollOutcome, PollerConfig};
pub use submission::{IDEMPOTENCY_HEADER, JOBS_PATH, JobSubmissionPipeline, SubmittedJob};
pub use wire::{JobCreated, JobStatusReport};
pub use workflow::{JobWorkflow, JobWorkflowSettings};
