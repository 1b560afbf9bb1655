//! Session-scoped job history store
//!
//! The only owner of job state. Pollers and the workflow mutate jobs
//! exclusively through [`JobHistoryStore::update`]; every change is also
//! broadcast so views can re-render without polling the store.

use chrono::{DateTime, Utc};
use opsdeck_domain::{
    ApplyOutcome, EnvironmentBinding, Job, JobHistory, JobHistoryEntry, JobId, JobKind, JobUpdate,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the event channel; slow subscribers observe `Lagged`.
const EVENT_CAPACITY: usize = 256;

/// Change notifications emitted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// A job was submitted and recorded.
    Recorded(JobHistoryEntry),
    /// A job changed.
    Updated(Job),
    /// A job was removed from the visible history.
    Cleared(JobId),
}

/// Result of [`JobHistoryStore::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update changed the job; carries the new snapshot.
    Applied(Job),
    /// The update was stale, repeated, or illegal; carries the unchanged job.
    Ignored(Job),
    /// No job with this id is recorded.
    Unknown,
}

impl UpdateOutcome {
    /// Snapshot of the job after the update, if it exists.
    #[must_use]
    pub const fn job(&self) -> Option<&Job> {
        match self {
            Self::Applied(job) | Self::Ignored(job) => Some(job),
            Self::Unknown => None,
        }
    }
}

/// Ordered, session-local log of submitted jobs.
#[derive(Debug)]
pub struct JobHistoryStore {
    history: Mutex<JobHistory>,
    events: broadcast::Sender<HistoryEvent>,
}

impl Default for JobHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobHistoryStore {
    /// Creates an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::from_history(JobHistory::new())
    }

    /// Creates a store that evicts old terminal entries beyond `max_entries`.
    #[must_use]
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self::from_history(JobHistory::with_capacity_limit(max_entries))
    }

    fn from_history(history: JobHistory) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            history: Mutex::new(history),
            events,
        }
    }

    /// Records a freshly submitted job.
    pub fn record(&self, job: Job, binding: EnvironmentBinding, submitted_at: DateTime<Utc>) {
        let entry = JobHistoryEntry::new(job, binding, submitted_at);
        self.history.lock().record(entry.clone());
        debug!(job_id = %entry.job.id(), "recorded job");
        self.emit(HistoryEvent::Recorded(entry));
    }

    /// Applies a partial update to a recorded job.
    ///
    /// Unknown ids are a silent no-op: the entry may have been cleared while
    /// a poll was in flight. Older updates lose to newer ones by
    /// `updated_at`; illegal transitions are logged and dropped.
    pub fn update(&self, id: &JobId, update: &JobUpdate) -> UpdateOutcome {
        let (result, job) = {
            let mut history = self.history.lock();
            let Some(result) = history.update(id, update) else {
                debug!(job_id = %id, "update for unknown job ignored");
                return UpdateOutcome::Unknown;
            };
            let Some(entry) = history.get(id) else {
                return UpdateOutcome::Unknown;
            };
            (result, entry.job.clone())
        };

        match result {
            Ok(ApplyOutcome::Applied) => {
                self.emit(HistoryEvent::Updated(job.clone()));
                UpdateOutcome::Applied(job)
            }
            Ok(ApplyOutcome::Ignored) => UpdateOutcome::Ignored(job),
            Err(error) => {
                warn!(job_id = %id, %error, "rejected job update");
                UpdateOutcome::Ignored(job)
            }
        }
    }

    /// Returns all entries, most recent submission first.
    #[must_use]
    pub fn list(&self) -> Vec<JobHistoryEntry> {
        self.history.lock().entries().cloned().collect()
    }

    /// Returns entries of one kind, most recent submission first.
    #[must_use]
    pub fn list_by_kind(&self, kind: JobKind) -> Vec<JobHistoryEntry> {
        self.history.lock().entries_of(kind).cloned().collect()
    }

    /// Returns the entry for a job.
    #[must_use]
    pub fn get(&self, id: &JobId) -> Option<JobHistoryEntry> {
        self.history.lock().get(id).cloned()
    }

    /// Removes a job from the visible history. The remote job is untouched.
    ///
    /// Returns true if an entry was removed.
    pub fn clear(&self, id: &JobId) -> bool {
        let removed = self.history.lock().remove(id).is_some();
        if removed {
            self.emit(HistoryEvent::Cleared(id.clone()));
        }
        removed
    }

    /// Number of recorded jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: HistoryEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
