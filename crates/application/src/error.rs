//! Application error types

use std::time::Duration;

use opsdeck_domain::{JobId, ValidationError};
use thiserror::Error;

/// Category of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request could not be built (bad URL, unserializable body).
    InvalidRequest,
    /// Connection-level failure (DNS, refused, reset).
    Network,
    /// No response within the request timeout.
    Timeout,
    /// The service answered with a non-2xx status.
    Status,
    /// The response body could not be decoded.
    Decode,
}

/// Failure talking to the remote service.
///
/// Network failures, timeouts, non-2xx statuses and malformed bodies all
/// surface as this one type. The API client never retries; callers decide
/// based on [`ApiError::is_transient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    /// Error category.
    pub kind: ApiErrorKind,
    /// HTTP status, when the service answered.
    pub status_code: Option<u16>,
    /// Human-readable message.
    pub message: String,
    /// Underlying cause, if any.
    pub cause: Option<String>,
}

impl ApiError {
    fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
            cause: None,
        }
    }

    /// The request could not be built.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    /// Connection-level failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    /// The request exceeded its timeout.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ApiErrorKind::Timeout,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    /// The service answered with a non-2xx status.
    #[must_use]
    pub fn status(status_code: u16, message: impl AsRef<str>) -> Self {
        let message = message.as_ref();
        let text = if message.is_empty() {
            format!("HTTP {status_code}")
        } else {
            format!("HTTP {status_code}: {message}")
        };
        Self {
            status_code: Some(status_code),
            ..Self::new(ApiErrorKind::Status, text)
        }
    }

    /// The response body was malformed.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns true for failures worth retrying: timeouts, network errors
    /// and 5xx responses. 4xx and malformed bodies are definitive.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self.kind {
            ApiErrorKind::Network | ApiErrorKind::Timeout => true,
            ApiErrorKind::Status => self.status_code.is_some_and(|code| code >= 500),
            ApiErrorKind::InvalidRequest | ApiErrorKind::Decode => false,
        }
    }
}

/// A selection named an environment the registry does not know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

/// The service declared a job failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("job {job_id} failed: {detail}")]
pub struct JobFailed {
    /// Failed job.
    pub job_id: JobId,
    /// Failure detail for display.
    pub detail: String,
}

/// Errors from submitting a job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// The submission was rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service call failed. Submissions are never retried automatically.
    #[error("submission failed: {0}")]
    Api(#[from] ApiError),

    /// The service accepted the submission but returned no usable job id.
    #[error("submission response is malformed: {0}")]
    MalformedResponse(String),
}

/// Errors from starting or awaiting a poller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PollError {
    /// A poller is already tracking this job.
    #[error("job {0} is already being polled")]
    AlreadyPolling(JobId),

    /// The polling task ended abnormally.
    #[error("polling task failed: {0}")]
    Task(String),
}

/// Errors surfaced by the job workflow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Submission failed.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Polling could not be started or awaited.
    #[error(transparent)]
    Poll(#[from] PollError),

    /// The job ended in FAILED.
    #[error(transparent)]
    JobFailed(#[from] JobFailed),

    /// The job was cancelled.
    #[error("job {0} was cancelled")]
    Cancelled(JobId),

    /// No job with this id is known to the session.
    #[error("unknown job: {0}")]
    UnknownJob(JobId),
}
