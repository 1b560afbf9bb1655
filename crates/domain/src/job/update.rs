//! Partial job updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::ResultSummary;
use super::status::JobStatus;

/// Result of applying a [`JobUpdate`] to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The job changed.
    Applied,
    /// The update was stale or repeated a terminal status.
    Ignored,
}

/// A partial change to a job, stamped with the time it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    /// New status, if it changed.
    pub status: Option<JobStatus>,
    /// Completion percentage.
    pub progress: Option<u8>,
    /// Result metadata (kept only in terminal states).
    pub result_summary: Option<ResultSummary>,
    /// Failure detail (kept only in FAILED).
    pub error_detail: Option<String>,
    /// When the change was observed.
    pub updated_at: DateTime<Utc>,
}

impl JobUpdate {
    /// An update that only moves the status.
    #[must_use]
    pub const fn status(status: JobStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            progress: None,
            result_summary: None,
            error_detail: None,
            updated_at,
        }
    }

    /// A progress-only update.
    #[must_use]
    pub const fn progress(progress: u8, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            progress: Some(progress),
            result_summary: None,
            error_detail: None,
            updated_at,
        }
    }

    /// A transition to FAILED with the given detail.
    #[must_use]
    pub fn failed(detail: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self::status(JobStatus::Failed, updated_at).with_error(detail)
    }

    /// A transition to CANCELLED.
    #[must_use]
    pub const fn cancelled(updated_at: DateTime<Utc>) -> Self {
        Self::status(JobStatus::Cancelled, updated_at)
    }

    /// Sets the progress percentage.
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the result summary.
    #[must_use]
    pub fn with_summary(mut self, summary: ResultSummary) -> Self {
        self.result_summary = Some(summary);
        self
    }

    /// Sets the failure detail.
    #[must_use]
    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.error_detail = Some(detail.into());
        self
    }
}
