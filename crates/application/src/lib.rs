//! `OpsDeck` Application - Environment registry, API access and job workflows
//!
//! This crate defines the application layer with:
//! - Port traits (transport, clock, record repositories)
//! - The environment registry and the environment-aware API client
//! - Job submission, polling and the session job history
//! - Application-level error handling

pub mod api_client;
pub mod environment;
pub mod error;
pub mod jobs;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use api_client::{ApiClient, DEFAULT_REQUEST_TIMEOUT, REQUEST_ID_HEADER};
pub use environment::{EnvironmentRegistry, RegistryError};
pub use error::{
    ApiError, ApiErrorKind, JobFailed, PollError, SubmissionError, UnknownEnvironment,
    WorkflowError,
};
pub use jobs::{
    HistoryEvent, JobHistoryStore, JobPoller, JobSubmissionPipeline, JobWorkflow,
    JobWorkflowSettings, PollHandle, PollOutcome, PollerConfig, SubmittedJob, UpdateOutcome,
};
pub use ports::{
    ApiRequest, ApiResponse, Clock, ConfigurationRepository, HttpMethod, MultipartForm,
    RequestBody, Transport, UserRepository,
};
