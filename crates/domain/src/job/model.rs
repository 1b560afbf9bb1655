//! Job entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::JobStatus;
use super::update::{ApplyOutcome, JobUpdate};
use crate::error::{DomainError, DomainResult};

/// Default failure detail when the service reports FAILED without one.
const UNSPECIFIED_FAILURE: &str = "job failed without details";

/// Opaque job identifier assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps a service-assigned identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    /// File upload into the platform.
    Import,
    /// Data extraction out of the platform.
    Export,
}

impl JobKind {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "IMPORT",
            Self::Export => "EXPORT",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result metadata reported by the service once a job is terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultSummary {
    /// Number of records handled.
    pub records_processed: Option<u64>,
    /// Number of records rejected.
    pub records_failed: Option<u64>,
    /// Free-form message from the service.
    pub message: Option<String>,
    /// Download location of an export artifact.
    pub artifact_url: Option<String>,
}

/// A server-tracked unit of import or export work.
///
/// Identifier and kind are fixed at creation. Status only moves forward
/// along the lifecycle (see [`JobStatus::can_transition_to`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    id: JobId,
    kind: JobKind,
    status: JobStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    progress: Option<u8>,
    result_summary: Option<ResultSummary>,
    error_detail: Option<String>,
}

impl Job {
    /// Creates a job in PENDING status, as returned by a fresh submission.
    #[must_use]
    pub fn pending(id: impl Into<JobId>, kind: JobKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind,
            status: JobStatus::Pending,
            created_at,
            updated_at: created_at,
            progress: None,
            result_summary: None,
            error_detail: None,
        }
    }

    /// Job identifier.
    #[must_use]
    pub const fn id(&self) -> &JobId {
        &self.id
    }

    /// Job kind.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the last applied update.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Completion percentage while running.
    #[must_use]
    pub const fn progress(&self) -> Option<u8> {
        self.progress
    }

    /// Result metadata, only present in terminal states.
    #[must_use]
    pub const fn result_summary(&self) -> Option<&ResultSummary> {
        self.result_summary.as_ref()
    }

    /// Failure detail, only present in FAILED.
    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Returns true once the job can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a partial update.
    ///
    /// Updates older than the last applied one are ignored (last write wins
    /// by `updated_at`). Terminal jobs ignore repeats of their own status.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` when the update would move the job
    /// backwards or out of a terminal state.
    pub fn apply(&mut self, update: &JobUpdate) -> DomainResult<ApplyOutcome> {
        if update.updated_at < self.updated_at {
            return Ok(ApplyOutcome::Ignored);
        }

        let next = update.status.unwrap_or(self.status);
        if self.status.is_terminal() {
            if next == self.status {
                return Ok(ApplyOutcome::Ignored);
            }
            return Err(self.illegal(next));
        }
        if next != self.status && !self.status.can_transition_to(next) {
            return Err(self.illegal(next));
        }

        self.status = next;
        self.updated_at = update.updated_at;

        match next {
            JobStatus::Pending | JobStatus::Uploading | JobStatus::Processing => {
                if let Some(progress) = update.progress {
                    self.progress = Some(progress.min(100));
                }
            }
            JobStatus::Succeeded => {
                self.progress = Some(100);
                self.result_summary = update.result_summary.clone();
            }
            JobStatus::Failed => {
                self.progress = None;
                self.result_summary = update.result_summary.clone();
                self.error_detail = Some(
                    update
                        .error_detail
                        .clone()
                        .unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string()),
                );
            }
            JobStatus::Cancelled => {
                self.progress = None;
                self.result_summary = update.result_summary.clone();
            }
        }

        Ok(ApplyOutcome::Applied)
    }

    fn illegal(&self, to: JobStatus) -> DomainError {
        DomainError::IllegalTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_pending_job() {
        let job = Job::pending("job-1", JobKind::Import, t(0));
        assert_eq!(job.id().as_str(), "job-1");
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.created_at(), job.updated_at());
        assert!(job.result_summary().is_none());
        assert!(job.error_detail().is_none());
    }

    #[test]
    fn test_progress_updates_while_running() {
        let mut job = Job::pending("job-1", JobKind::Import, t(0));
        let outcome = job
            .apply(&JobUpdate::status(JobStatus::Processing, t(1)).with_progress(40))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(job.progress(), Some(40));

        job.apply(&JobUpdate::progress(250, t(2))).unwrap();
        assert_eq!(job.progress(), Some(100));
        assert_eq!(job.status(), JobStatus::Processing);
    }

    #[test]
    fn test_success_carries_summary() {
        let mut job = Job::pending("job-1", JobKind::Export, t(0));
        let summary = ResultSummary {
            records_processed: Some(10),
            artifact_url: Some("https://cdn/export.csv".to_string()),
            ..ResultSummary::default()
        };
        job.apply(&JobUpdate::status(JobStatus::Succeeded, t(5)).with_summary(summary.clone()))
            .unwrap();
        assert_eq!(job.status(), JobStatus::Succeeded);
        assert_eq!(job.result_summary(), Some(&summary));
        assert!(job.error_detail().is_none());
    }

    #[test]
    fn test_error_detail_only_on_failure() {
        let mut job = Job::pending("job-1", JobKind::Import, t(0));
        job.apply(&JobUpdate::status(JobStatus::Processing, t(1)).with_error("ignored"))
            .unwrap();
        assert!(job.error_detail().is_none());

        job.apply(&JobUpdate::failed("bad row 17", t(2))).unwrap();
        assert_eq!(job.error_detail(), Some("bad row 17"));
    }

    #[test]
    fn test_failure_without_detail_gets_default() {
        let mut job = Job::pending("job-1", JobKind::Import, t(0));
        job.apply(&JobUpdate::status(JobStatus::Failed, t(1))).unwrap();
        assert_eq!(job.error_detail(), Some(UNSPECIFIED_FAILURE));
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut job = Job::pending("job-1", JobKind::Import, t(0));
        job.apply(&JobUpdate::status(JobStatus::Processing, t(1))).unwrap();
        let result = job.apply(&JobUpdate::status(JobStatus::Uploading, t(2)));
        assert!(matches!(result, Err(DomainError::IllegalTransition { .. })));
        assert_eq!(job.status(), JobStatus::Processing);
    }

    #[test]
    fn test_terminal_is_final() {
        let mut job = Job::pending("job-1", JobKind::Import, t(0));
        job.apply(&JobUpdate::cancelled(t(1))).unwrap();

        let repeat = job.apply(&JobUpdate::cancelled(t(2))).unwrap();
        assert_eq!(repeat, ApplyOutcome::Ignored);

        let result = job.apply(&JobUpdate::status(JobStatus::Succeeded, t(3)));
        assert!(result.is_err());
        assert_eq!(job.status(), JobStatus::Cancelled);
    }

    #[test]
    fn test_stale_update_ignored() {
        let mut job = Job::pending("job-1", JobKind::Import, t(0));
        job.apply(&JobUpdate::status(JobStatus::Processing, t(10))).unwrap();

        let stale = job
            .apply(&JobUpdate::status(JobStatus::Succeeded, t(10) - Duration::seconds(5)))
            .unwrap();
        assert_eq!(stale, ApplyOutcome::Ignored);
        assert_eq!(job.status(), JobStatus::Processing);
        assert_eq!(job.updated_at(), t(10));
    }
}
