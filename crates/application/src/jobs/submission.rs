//! Job submission pipeline
//!
//! Validates a submission locally, uploads it with a single `POST /jobs`,
//! and records the resulting PENDING job. Either a job id comes back and
//! the job is in history, or nothing is recorded.

use std::sync::Arc;

use opsdeck_domain::{
    EnvironmentBinding, ExportRequest, ImportRequest, Job, JobId, JobKind, SubmissionLimits,
    SubmissionRequest, generate_id,
};
use tracing::{info, warn};

use super::history_store::JobHistoryStore;
use super::wire::{ExportJobBody, JobCreated};
use crate::api_client::ApiClient;
use crate::error::{ApiError, SubmissionError};
use crate::ports::{Clock, HttpMethod, MultipartForm, RequestBody};

/// Path of the job collection endpoint.
pub const JOBS_PATH: &str = "/jobs";

/// Header that lets the service deduplicate a resubmitted request.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Multipart field carrying the uploaded files.
const FILES_FIELD: &str = "files";

/// A job accepted by the service, with the environment it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    /// The job as recorded (PENDING).
    pub job: Job,
    /// Environment the job was submitted to.
    pub binding: EnvironmentBinding,
}

/// Use case for submitting import and export jobs.
///
/// Submissions are never retried; a failure is reported to the caller,
/// who may resubmit explicitly.
pub struct JobSubmissionPipeline {
    api: ApiClient,
    history: Arc<JobHistoryStore>,
    clock: Arc<dyn Clock>,
    limits: SubmissionLimits,
}

impl JobSubmissionPipeline {
    /// Creates a pipeline with default limits.
    #[must_use]
    pub fn new(api: ApiClient, history: Arc<JobHistoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            history,
            clock,
            limits: SubmissionLimits::default(),
        }
    }

    /// Replaces the submission limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: SubmissionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits applied before upload.
    #[must_use]
    pub const fn limits(&self) -> &SubmissionLimits {
        &self.limits
    }

    /// Submits an import job.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_import(
        &self,
        request: ImportRequest,
    ) -> Result<SubmittedJob, SubmissionError> {
        self.submit(SubmissionRequest::Import(request)).await
    }

    /// Submits an export job.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_export(
        &self,
        request: ExportRequest,
    ) -> Result<SubmittedJob, SubmissionError> {
        self.submit(SubmissionRequest::Export(request)).await
    }

    /// Validates and uploads a submission, then records the PENDING job.
    ///
    /// The active environment is captured once up front; the upload and the
    /// history entry both use that binding even if the environment is
    /// switched while the upload is in flight.
    ///
    /// # Errors
    ///
    /// - `Validation` if the input is rejected locally (nothing is sent)
    /// - `Api` if the upload fails
    /// - `MalformedResponse` if the service returns an empty job id
    pub async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmittedJob, SubmissionError> {
        request.validate(&self.limits)?;

        let kind = request.kind();
        let binding = self.api.registry().binding();
        let api = self.api.pinned(binding.clone());
        let body = build_body(request)?;
        let headers = vec![(IDEMPOTENCY_HEADER.to_string(), generate_id())];

        let created: JobCreated = api
            .request_json(HttpMethod::Post, JOBS_PATH, body, headers)
            .await
            .inspect_err(|error| {
                let environment = &binding.environment_id;
                warn!(%kind, %environment, %error, "job submission failed");
            })?;

        let id = created.id.trim();
        if id.is_empty() {
            return Err(SubmissionError::MalformedResponse(
                "job id is empty".to_string(),
            ));
        }

        let now = self.clock.now();
        let job = Job::pending(JobId::new(id), kind, now);
        self.history.record(job.clone(), binding.clone(), now);

        info!(
            job_id = %job.id(),
            %kind,
            environment = %binding.environment_id,
            version = %binding.version,
            "job submitted"
        );
        Ok(SubmittedJob { job, binding })
    }
}

fn build_body(request: SubmissionRequest) -> Result<RequestBody, SubmissionError> {
    match request {
        SubmissionRequest::Import(import) => {
            let mut form = MultipartForm::new(FILES_FIELD)
                .field("kind", JobKind::Import.as_str())
                .field("processId", import.target.process_id);
            if let Some(category) = import.target.category {
                form = form.field("category", category);
            }
            Ok(RequestBody::Multipart(form.files(import.files)))
        }
        SubmissionRequest::Export(export) => {
            let body = ExportJobBody {
                kind: JobKind::Export.as_str(),
                request: &export,
            };
            serde_json::to_value(&body).map(RequestBody::Json).map_err(|e| {
                ApiError::invalid_request(format!("cannot serialize export request: {e}")).into()
            })
        }
    }
}
