//! Job endpoint payloads

use chrono::{DateTime, Utc};
use opsdeck_domain::{ExportRequest, JobStatus, JobUpdate, ResultSummary};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Response of `POST /jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobCreated {
    /// Identifier assigned by the service.
    pub id: String,
}

/// JSON body of an export submission.
#[derive(Debug, Serialize)]
pub struct ExportJobBody<'a> {
    /// Always `EXPORT`.
    pub kind: &'static str,
    /// Selection and format, flattened.
    #[serde(flatten)]
    pub request: &'a ExportRequest,
}

/// Response of `GET /jobs/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    /// Lifecycle state as reported by the service.
    pub status: String,
    /// Completion percentage. Some services send fractions.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Result metadata for terminal jobs.
    #[serde(default)]
    pub result_summary: Option<ResultSummary>,
    /// Failure detail for FAILED jobs.
    #[serde(default, alias = "error")]
    pub error_detail: Option<String>,
}

impl JobStatusReport {
    /// Converts the report into an update stamped with `observed_at`.
    ///
    /// # Errors
    ///
    /// An unrecognized status is a decode error.
    pub fn into_update(self, observed_at: DateTime<Utc>) -> Result<JobUpdate, ApiError> {
        let status: JobStatus = self
            .status
            .parse()
            .map_err(|e| ApiError::decode(format!("unexpected job status: {e}")))?;

        let mut update = JobUpdate::status(status, observed_at);
        if let Some(progress) = self.progress.filter(|p| p.is_finite()) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let percent = progress.round().clamp(0.0, 100.0) as u8;
            update = update.with_progress(percent);
        }
        if let Some(summary) = self.result_summary {
            update = update.with_summary(summary);
        }
        if let Some(detail) = self.error_detail {
            update = update.with_error(detail);
        }
        Ok(update)
    }
}
