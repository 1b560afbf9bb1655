//! Job History Domain Model
//!
//! Session-scoped log of submitted jobs, newest submission first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::environment::{EnvironmentBinding, EnvironmentVersion};
use crate::error::DomainResult;
use crate::job::{ApplyOutcome, Job, JobId, JobKind, JobUpdate};

/// A job snapshot together with the environment it was submitted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHistoryEntry {
    /// Latest known state of the job.
    pub job: Job,
    /// Environment captured at submission time.
    pub binding: EnvironmentBinding,
    /// When the submission completed locally.
    pub submitted_at: DateTime<Utc>,
}

impl JobHistoryEntry {
    /// Creates a new history entry.
    #[must_use]
    pub const fn new(job: Job, binding: EnvironmentBinding, submitted_at: DateTime<Utc>) -> Self {
        Self {
            job,
            binding,
            submitted_at,
        }
    }

    /// Registry version the job was submitted under.
    #[must_use]
    pub const fn environment_version(&self) -> EnvironmentVersion {
        self.binding.version
    }
}

/// Ordered job history with an optional size limit.
///
/// When the limit is exceeded the oldest terminal entries are evicted;
/// jobs that are still running are never dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobHistory {
    /// History entries (newest submission first).
    entries: VecDeque<JobHistoryEntry>,
    /// Maximum number of entries to keep, if bounded.
    #[serde(default)]
    max_entries: Option<usize>,
}

impl JobHistory {
    /// Creates an unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history that keeps at most `max_entries` terminal entries
    /// beyond the running ones.
    #[must_use]
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: Some(max_entries),
        }
    }

    /// Inserts an entry, keeping newest-submission-first order.
    ///
    /// An existing entry with the same job id is replaced.
    pub fn record(&mut self, entry: JobHistoryEntry) {
        self.entries.retain(|e| e.job.id() != entry.job.id());

        let position = self
            .entries
            .iter()
            .position(|e| e.submitted_at <= entry.submitted_at)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);

        self.evict();
    }

    /// Applies an update to the job with the given id.
    ///
    /// Returns `None` when the id is unknown.
    pub fn update(&mut self, id: &JobId, update: &JobUpdate) -> Option<DomainResult<ApplyOutcome>> {
        self.entries
            .iter_mut()
            .find(|e| e.job.id() == id)
            .map(|entry| entry.job.apply(update))
    }

    /// Removes an entry. Returns the removed entry, if any.
    pub fn remove(&mut self, id: &JobId) -> Option<JobHistoryEntry> {
        let position = self.entries.iter().position(|e| e.job.id() == id)?;
        self.entries.remove(position)
    }

    /// Returns an entry by job id.
    #[must_use]
    pub fn get(&self, id: &JobId) -> Option<&JobHistoryEntry> {
        self.entries.iter().find(|e| e.job.id() == id)
    }

    /// Returns all entries (newest submission first).
    pub fn entries(&self) -> impl Iterator<Item = &JobHistoryEntry> {
        self.entries.iter()
    }

    /// Returns entries of one kind (newest submission first).
    pub fn entries_of(&self, kind: JobKind) -> impl Iterator<Item = &JobHistoryEntry> {
        self.entries.iter().filter(move |e| e.job.kind() == kind)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        while self.entries.len() > max {
            let Some(oldest_terminal) = self.entries.iter().rposition(|e| e.job.is_terminal())
            else {
                break;
            };
            self.entries.remove(oldest_terminal);
        }
    }
}
