//! Environment version counter and submission-time bindings

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Monotonic counter bumped on every environment switch.
///
/// Consumers holding derived state must discard it when the version they
/// captured differs from the registry's current one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EnvironmentVersion(u64);

impl EnvironmentVersion {
    /// The version every registry starts at.
    pub const INITIAL: Self = Self(0);

    /// Creates a version from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the version following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EnvironmentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Snapshot of the active environment taken at a single point in time.
///
/// A job keeps the binding it was submitted under for its whole life, so
/// its status calls never follow a later environment switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentBinding {
    /// Identifier of the environment that was active.
    pub environment_id: String,
    /// Base URL derived from that environment.
    pub base_url: String,
    /// Registry version at capture time.
    pub version: EnvironmentVersion,
}

impl EnvironmentBinding {
    /// Creates a new binding.
    #[must_use]
    pub fn new(
        environment_id: impl Into<String>,
        base_url: impl Into<String>,
        version: EnvironmentVersion,
    ) -> Self {
        Self {
            environment_id: environment_id.into(),
            base_url: base_url.into(),
            version,
        }
    }

    /// Returns true if this binding was captured under `current`.
    #[must_use]
    pub fn is_current(&self, current: EnvironmentVersion) -> bool {
        self.version == current
    }

    /// Joins a path onto the bound base URL.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Joins a base URL and a path with exactly one separating slash.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Percent-encodes `raw` as exactly one URL path segment.
///
/// Identifiers are opaque, so `/`, `?`, `#` and `%` inside them must not
/// change which resource a path addresses.
#[must_use]
pub fn path_segment(raw: &str) -> String {
    if matches!(raw, "." | "..") {
        return raw.replace('.', "%2E");
    }
    let Ok(mut url) = Url::parse("http://segment.invalid/") else {
        return String::new();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}
