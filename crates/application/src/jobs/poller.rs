//! Job status poller
//!
//! One tokio task per job issues `GET /jobs/{id}` until the job reaches a
//! terminal state or is cancelled. All calls go to the environment the job
//! was submitted to, regardless of later switches.
//!
//! Failure handling:
//! - transient errors (timeout, network, 5xx) extend a consecutive-failure
//!   streak and back off exponentially; the streak resets on any success
//! - when the streak reaches `max_retries` the job is marked FAILED
//! - definitive errors (4xx, malformed body) fail the job immediately

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use opsdeck_domain::environment::path_segment;
use opsdeck_domain::{EnvironmentBinding, Job, JobId, JobStatus, JobUpdate};
use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::history_store::{JobHistoryStore, UpdateOutcome};
use super::wire::JobStatusReport;
use crate::api_client::ApiClient;
use crate::error::{ApiError, PollError};
use crate::ports::Clock;

/// Upper bound of the random jitter added to a backoff delay.
const MAX_JITTER: f64 = 0.2;

/// Polling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    /// Delay between successful polls; also the delay before the first.
    pub interval: Duration,
    /// Consecutive transient failures that fail the job.
    pub max_retries: u32,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Ceiling for the backoff delay.
    pub max_backoff: Duration,
    /// Upper bound on one status call.
    pub request_timeout: Duration,
    /// Whether to send `POST /jobs/{id}/cancel` on cancellation.
    pub remote_cancel: bool,
    /// Whether to randomize backoff delays.
    pub jitter: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            remote_cancel: true,
            jitter: true,
        }
    }
}

impl PollerConfig {
    /// Delay before the next attempt after `failures` consecutive failures.
    ///
    /// Doubles from `initial_backoff`, capped at `max_backoff`, plus up to
    /// 20% jitter when enabled.
    #[must_use]
    pub fn backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        let base = self
            .initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.max_backoff);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let factor = rand::rng().random_range(0.0..=MAX_JITTER);
        base + base.mul_f64(factor)
    }
}

/// How a polling task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Polled job.
    pub job_id: JobId,
    /// Final status, or `None` if the history entry disappeared.
    pub status: Option<JobStatus>,
    /// Number of status calls issued.
    pub attempts: u32,
}

/// Handle to a running polling task.
#[derive(Debug)]
pub struct PollHandle {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Polled job.
    #[must_use]
    pub const fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Requests cancellation. The task observes it before its next poll or
    /// right after the in-flight one resolves.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this task.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns true once the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the task to end.
    ///
    /// # Errors
    ///
    /// Returns `PollError::Task` if the task panicked or was aborted.
    pub async fn wait(self) -> Result<PollOutcome, PollError> {
        self.task.await.map_err(|e| PollError::Task(e.to_string()))
    }
}

/// Removes a job from the active set when its task ends.
struct ActiveGuard {
    active: Arc<Mutex<HashSet<JobId>>>,
    job_id: JobId,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.job_id);
    }
}

/// Spawns and runs job polling tasks.
#[derive(Clone)]
pub struct JobPoller {
    api: ApiClient,
    history: Arc<JobHistoryStore>,
    clock: Arc<dyn Clock>,
    config: PollerConfig,
    active: Arc<Mutex<HashSet<JobId>>>,
}

impl JobPoller {
    /// Creates a poller with the given configuration.
    #[must_use]
    pub fn new(
        api: ApiClient,
        history: Arc<JobHistoryStore>,
        clock: Arc<dyn Clock>,
        config: PollerConfig,
    ) -> Self {
        Self {
            api,
            history,
            clock,
            config,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Polling parameters.
    #[must_use]
    pub const fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Returns true if a task is currently polling `job_id`.
    #[must_use]
    pub fn is_polling(&self, job_id: &JobId) -> bool {
        self.active.lock().contains(job_id)
    }

    /// Starts polling `job_id` against `binding` in a new task.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPolling` if another task tracks the same job.
    pub fn spawn(
        &self,
        job_id: JobId,
        binding: EnvironmentBinding,
    ) -> Result<PollHandle, PollError> {
        if !self.active.lock().insert(job_id.clone()) {
            return Err(PollError::AlreadyPolling(job_id));
        }
        let guard = ActiveGuard {
            active: Arc::clone(&self.active),
            job_id: job_id.clone(),
        };

        let cancel = CancellationToken::new();
        let poller = self.clone();
        let task_id = job_id.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            poller
                .run_to_completion(task_id, binding, task_cancel)
                .await
        });

        debug!(job_id = %job_id, "poller started");
        Ok(PollHandle {
            job_id,
            cancel,
            task,
        })
    }

    /// Polls in the current task until the job is terminal, cancelled, or
    /// removed from history.
    ///
    /// Does not register the job in the active set; use
    /// [`spawn`](Self::spawn) for that.
    pub async fn run_to_completion(
        &self,
        job_id: JobId,
        binding: EnvironmentBinding,
        cancel: CancellationToken,
    ) -> PollOutcome {
        let api = self
            .api
            .pinned(binding)
            .with_timeout(self.config.request_timeout);
        let path = status_path(&job_id);
        let max_retries = self.config.max_retries.max(1);

        let mut attempts = 0_u32;
        let mut failures = 0_u32;
        let mut delay = self.config.interval;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return self.cancel_job(&api, job_id, attempts).await;
                }
                () = tokio::time::sleep(delay) => {}
            }

            attempts += 1;
            let result = self.poll_once(&api, &path, &job_id).await;

            if cancel.is_cancelled() {
                return self.cancel_job(&api, job_id, attempts).await;
            }

            match result {
                Ok(update) => {
                    failures = 0;
                    delay = self.config.interval;
                    let reported_terminal = update.status.is_some_and(JobStatus::is_terminal);
                    match self.history.update(&job_id, &update) {
                        UpdateOutcome::Unknown => {
                            debug!(job_id = %job_id, "history entry gone, polling stopped");
                            return PollOutcome {
                                job_id,
                                status: None,
                                attempts,
                            };
                        }
                        UpdateOutcome::Applied(job) | UpdateOutcome::Ignored(job)
                            if job.is_terminal() || reported_terminal =>
                        {
                            let status = job.status();
                            if job.is_terminal() {
                                info!(job_id = %job_id, %status, attempts, "job finished");
                            } else {
                                warn!(job_id = %job_id, %status, "terminal report rejected");
                            }
                            return PollOutcome {
                                job_id,
                                status: Some(status),
                                attempts,
                            };
                        }
                        UpdateOutcome::Applied(_) | UpdateOutcome::Ignored(_) => {}
                    }
                }
                Err(error) if error.is_transient() => {
                    failures += 1;
                    warn!(job_id = %job_id, failures, %error, "job status poll failed");
                    if failures >= max_retries {
                        let detail =
                            format!("exhausted retries after {failures} attempts: {error}");
                        return self.fail_job(job_id, detail, attempts);
                    }
                    delay = self.config.backoff(failures);
                }
                Err(error) => {
                    warn!(job_id = %job_id, %error, "job status poll rejected");
                    return self.fail_job(job_id, error.to_string(), attempts);
                }
            }
        }
    }

    async fn poll_once(
        &self,
        api: &ApiClient,
        path: &str,
        job_id: &JobId,
    ) -> Result<JobUpdate, ApiError> {
        let timeout = self.config.request_timeout;
        let report = tokio::time::timeout(timeout, api.get_json::<JobStatusReport>(path))
            .await
            .map_err(|_| ApiError::timeout(timeout))??;
        report.into_update(self.observed_at(job_id))
    }

    /// Stamp for a new observation of `job_id`.
    ///
    /// Never earlier than the stamp already on the entry, so an entry
    /// recorded under another clock (or a wall clock stepping backwards)
    /// cannot make this poller's own observations look stale.
    fn observed_at(&self, job_id: &JobId) -> DateTime<Utc> {
        let now = self.clock.now();
        self.history
            .get(job_id)
            .map_or(now, |entry| now.max(entry.job.updated_at()))
    }

    fn fail_job(&self, job_id: JobId, detail: String, attempts: u32) -> PollOutcome {
        let update = JobUpdate::failed(detail, self.observed_at(&job_id));
        let status = self.history.update(&job_id, &update).job().map(Job::status);
        PollOutcome {
            job_id,
            status,
            attempts,
        }
    }

    async fn cancel_job(&self, api: &ApiClient, job_id: JobId, attempts: u32) -> PollOutcome {
        let status = match self.history.get(&job_id) {
            None => None,
            Some(entry) if entry.job.is_terminal() => Some(entry.job.status()),
            Some(entry) => {
                let observed_at = self.clock.now().max(entry.job.updated_at());
                self.history
                    .update(&job_id, &JobUpdate::cancelled(observed_at))
                    .job()
                    .map(Job::status)
            }
        };

        if status == Some(JobStatus::Cancelled) {
            info!(job_id = %job_id, "job cancelled");
            if self.config.remote_cancel {
                self.cancel_remote(api, &job_id).await;
            }
        }

        PollOutcome {
            job_id,
            status,
            attempts,
        }
    }

    /// Asks the service to stop the job. Best-effort: failures are logged.
    async fn cancel_remote(&self, api: &ApiClient, job_id: &JobId) {
        let path = format!("{}/cancel", status_path(job_id));
        let timeout = self.config.request_timeout;
        let result = tokio::time::timeout(timeout, api.post_empty(&path))
            .await
            .unwrap_or_else(|_| Err(ApiError::timeout(timeout)));
        if let Err(error) = result {
            warn!(job_id = %job_id, %error, "remote cancel failed");
        }
    }
}

fn status_path(job_id: &JobId) -> String {
    format!("/jobs/{}", path_segment(job_id.as_str()))
}

impl std::fmt::Debug for JobPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPoller")
            .field("config", &self.config)
            .field("active", &self.active.lock().len())
            .finish_non_exhaustive()
    }
}
