//! Clock port

use chrono::{DateTime, Utc};

/// Source of wall-clock time.
///
/// Job timestamps and history ordering come from this port, so tests can
/// substitute a deterministic clock.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
