//! Job lifecycle status and transition rules

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle status of a job.
///
/// ```text
/// PENDING -> UPLOADING -> PROCESSING -> SUCCEEDED | FAILED
///    \___________\_____________\______-> CANCELLED
/// ```
///
/// Intermediate states may be skipped; nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted by the service, not started yet.
    Pending,
    /// Input files are being transferred.
    Uploading,
    /// The service is working on the job.
    Processing,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Abandoned on user request.
    Cancelled,
}

impl JobStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Uploading,
        Self::Processing,
        Self::Succeeded,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns true for SUCCEEDED, FAILED and CANCELLED.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// Position along the lifecycle; all terminal states share the last rank.
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Uploading => 1,
            Self::Processing => 2,
            Self::Succeeded | Self::Failed | Self::Cancelled => 3,
        }
    }

    /// Returns true if a job in this status may move to `next`.
    ///
    /// Staying in the same status is not a transition and returns false.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, Self::Cancelled) {
            return true;
        }
        next.rank() > self.rank()
    }

    /// Wire representation (`PENDING`, `SUCCEEDED`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Uploading => "UPLOADING",
            Self::Processing => "PROCESSING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Uploading.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Uploading));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Uploading.can_transition_to(JobStatus::Succeeded));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Uploading));
        assert!(!JobStatus::Uploading.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Processing));
    }

    #[test]
    fn test_nothing_leaves_terminal() {
        for from in [JobStatus::Succeeded, JobStatus::Failed, JobStatus::Cancelled] {
            for to in JobStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_cancel_from_any_active_state() {
        for from in [JobStatus::Pending, JobStatus::Uploading, JobStatus::Processing] {
            assert!(from.can_transition_to(JobStatus::Cancelled));
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("processing".parse::<JobStatus>(), Ok(JobStatus::Processing));
        assert_eq!(" SUCCEEDED ".parse::<JobStatus>(), Ok(JobStatus::Succeeded));
        assert!("DONE".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_serde_wire_format() {
        let json = serde_json::to_string(&JobStatus::Cancelled).unwrap_or_default();
        assert_eq!(json, "\"CANCELLED\"");
    }
}
