//! Session job workflow
//!
//! Long-lived composition of the submission pipeline, the poller and the
//! history store. Views talk to this type and subscribe to the history
//! store for updates; nothing here depends on presentation.

use std::collections::HashMap;
use std::sync::Arc;

use opsdeck_domain::{
    ExportRequest, ImportRequest, Job, JobId, JobStatus, SubmissionLimits, SubmissionRequest,
};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::history_store::{HistoryEvent, JobHistoryStore};
use super::poller::{JobPoller, PollHandle, PollerConfig};
use super::submission::{JobSubmissionPipeline, SubmittedJob};
use crate::api_client::ApiClient;
use crate::environment::EnvironmentRegistry;
use crate::error::{JobFailed, WorkflowError};
use crate::ports::Clock;

/// Tunables for a [`JobWorkflow`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JobWorkflowSettings {
    /// Poller parameters.
    pub poller: PollerConfig,
    /// Submission limits.
    pub limits: SubmissionLimits,
    /// Optional bound on retained history entries.
    pub history_limit: Option<usize>,
}

/// Submits jobs and keeps exactly one poller per non-terminal job.
pub struct JobWorkflow {
    registry: Arc<EnvironmentRegistry>,
    history: Arc<JobHistoryStore>,
    pipeline: JobSubmissionPipeline,
    poller: JobPoller,
    pollers: Mutex<HashMap<JobId, PollHandle>>,
}

impl JobWorkflow {
    /// Creates a workflow on top of an API client.
    #[must_use]
    pub fn new(api: ApiClient, clock: Arc<dyn Clock>, settings: JobWorkflowSettings) -> Self {
        let history = Arc::new(
            settings
                .history_limit
                .map_or_else(JobHistoryStore::new, JobHistoryStore::with_capacity_limit),
        );
        let pipeline =
            JobSubmissionPipeline::new(api.clone(), Arc::clone(&history), Arc::clone(&clock))
                .with_limits(settings.limits);
        let poller = JobPoller::new(api.clone(), Arc::clone(&history), clock, settings.poller);

        Self {
            registry: Arc::clone(api.registry()),
            history,
            pipeline,
            poller,
            pollers: Mutex::new(HashMap::new()),
        }
    }

    /// The environment registry jobs are submitted against.
    #[must_use]
    pub const fn registry(&self) -> &Arc<EnvironmentRegistry> {
        &self.registry
    }

    /// The session's job history.
    #[must_use]
    pub const fn history(&self) -> &Arc<JobHistoryStore> {
        &self.history
    }

    /// Submits an import and starts polling it.
    ///
    /// # Errors
    ///
    /// Returns the submission error, or a poll error if a poller for the
    /// returned id already exists.
    pub async fn submit_import(
        &self,
        request: ImportRequest,
    ) -> Result<SubmittedJob, WorkflowError> {
        self.submit(SubmissionRequest::Import(request)).await
    }

    /// Submits an export and starts polling it.
    ///
    /// # Errors
    ///
    /// See [`submit_import`](Self::submit_import).
    pub async fn submit_export(
        &self,
        request: ExportRequest,
    ) -> Result<SubmittedJob, WorkflowError> {
        self.submit(SubmissionRequest::Export(request)).await
    }

    async fn submit(&self, request: SubmissionRequest) -> Result<SubmittedJob, WorkflowError> {
        let submitted = self.pipeline.submit(request).await?;
        let handle = self
            .poller
            .spawn(submitted.job.id().clone(), submitted.binding.clone())?;
        self.pollers.lock().insert(submitted.job.id().clone(), handle);
        Ok(submitted)
    }

    /// Cancels a job.
    ///
    /// Terminal jobs are left alone. A job without a live poller (for
    /// example after its poller stopped) is cancelled through a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJob` if the id is not in history.
    pub fn cancel(&self, id: &JobId) -> Result<(), WorkflowError> {
        let entry = self
            .history
            .get(id)
            .ok_or_else(|| WorkflowError::UnknownJob(id.clone()))?;
        if entry.job.is_terminal() {
            debug!(job_id = %id, status = %entry.job.status(), "cancel ignored for finished job");
            return Ok(());
        }

        let mut pollers = self.pollers.lock();
        if let Some(handle) = pollers.get(id).filter(|h| !h.is_finished()) {
            handle.cancel();
            return Ok(());
        }
        let handle = self.poller.spawn(id.clone(), entry.binding)?;
        handle.cancel();
        pollers.insert(id.clone(), handle);
        Ok(())
    }

    /// Waits until a job is terminal.
    ///
    /// # Errors
    ///
    /// - `JobFailed` with the failure detail if the job failed
    /// - `Cancelled` if it was cancelled
    /// - `UnknownJob` if the id is not (or no longer) in history
    pub async fn wait(&self, id: &JobId) -> Result<Job, WorkflowError> {
        let mut events = self.history.subscribe();
        loop {
            let job = self
                .history
                .get(id)
                .map(|entry| entry.job)
                .ok_or_else(|| WorkflowError::UnknownJob(id.clone()))?;
            if job.is_terminal() {
                return finished(job);
            }

            loop {
                match events.recv().await {
                    Ok(HistoryEvent::Updated(job)) if job.id() == id => break,
                    Ok(HistoryEvent::Cleared(cleared)) if &cleared == id => break,
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => break,
                    Err(RecvError::Closed) => return Err(WorkflowError::UnknownJob(id.clone())),
                }
            }
        }
    }

    /// Drops finished poller handles and resumes polling for non-terminal
    /// jobs that have none, each against its own recorded environment.
    ///
    /// Returns the number of pollers started.
    pub fn reconcile(&self) -> usize {
        let mut pollers = self.pollers.lock();
        pollers.retain(|_, handle| !handle.is_finished());

        let mut resumed = 0;
        for entry in self.history.list() {
            let id = entry.job.id().clone();
            if entry.job.is_terminal() || pollers.contains_key(&id) {
                continue;
            }
            if let Ok(handle) = self.poller.spawn(id.clone(), entry.binding) {
                info!(job_id = %id, "resumed polling");
                pollers.insert(id, handle);
                resumed += 1;
            }
        }
        resumed
    }

    /// Ids of jobs with a live poller.
    #[must_use]
    pub fn active_jobs(&self) -> Vec<JobId> {
        let mut ids: Vec<_> = self
            .pollers
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Cancels every non-terminal job in history, polled or not.
    ///
    /// Returns the number of jobs a cancellation was issued for.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for entry in self.history.list() {
            let id = entry.job.id();
            if entry.job.is_terminal() {
                continue;
            }
            match self.cancel(id) {
                Ok(()) => cancelled += 1,
                Err(error) => warn!(job_id = %id, %error, "cancel failed"),
            }
        }
        cancelled
    }
}

fn finished(job: Job) -> Result<Job, WorkflowError> {
    match job.status() {
        JobStatus::Failed => Err(JobFailed {
            job_id: job.id().clone(),
            detail: job.error_detail().unwrap_or_default().to_string(),
        }
        .into()),
        JobStatus::Cancelled => Err(WorkflowError::Cancelled(job.id().clone())),
        _ => Ok(job),
    }
}
