//! Console settings loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use opsdeck_application::{JobWorkflowSettings, PollerConfig};
use opsdeck_domain::SubmissionLimits;
use opsdeck_domain::submission::DEFAULT_MAX_FILE_BYTES;

/// Error type for settings parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {name}: {value:?} ({reason})")]
pub struct SettingsError {
    /// Variable name.
    pub name: String,
    /// Offending value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Runtime settings of the console.
///
/// All fields have defaults suitable for interactive use; override them
/// via environment variables or command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    /// Environment selected at start-up, overriding the catalog default.
    pub environment: Option<String>,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Consecutive transient poll failures before a job is failed.
    pub max_retries: u32,
    /// First retry delay.
    pub initial_backoff: Duration,
    /// Retry delay ceiling.
    pub max_backoff: Duration,
    /// Upper bound on one API call.
    pub request_timeout: Duration,
    /// Per-file upload ceiling in bytes.
    pub max_upload_bytes: u64,
    /// Optional cap on files per import.
    pub max_files: Option<usize>,
    /// Whether cancellation is forwarded to the service.
    pub remote_cancel: bool,
    /// Optional bound on retained history entries.
    pub history_limit: Option<usize>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        let poller = PollerConfig::default();
        Self {
            environment: None,
            poll_interval: poller.interval,
            max_retries: poller.max_retries,
            initial_backoff: poller.initial_backoff,
            max_backoff: poller.max_backoff,
            request_timeout: poller.request_timeout,
            max_upload_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: None,
            remote_cancel: poller.remote_cancel,
            history_limit: None,
        }
    }
}

impl ConsoleSettings {
    /// Loads settings from the process environment.
    ///
    /// | Env Var                      | Default     |
    /// |------------------------------|-------------|
    /// | `OPSDECK_ENV`                | catalog     |
    /// | `OPSDECK_POLL_INTERVAL_MS`   | `3000`      |
    /// | `OPSDECK_MAX_RETRIES`        | `3`         |
    /// | `OPSDECK_INITIAL_BACKOFF_MS` | `1000`      |
    /// | `OPSDECK_MAX_BACKOFF_MS`     | `30000`     |
    /// | `OPSDECK_REQUEST_TIMEOUT_MS` | `10000`     |
    /// | `OPSDECK_MAX_UPLOAD_BYTES`   | `52428800`  |
    /// | `OPSDECK_MAX_FILES`          | unlimited   |
    /// | `OPSDECK_REMOTE_CANCEL`      | `true`      |
    /// | `OPSDECK_HISTORY_LIMIT`      | unlimited   |
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` for values that do not parse.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` for values that do not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            environment: var("OPSDECK_ENV").map(|v| v.trim().to_string()),
            poll_interval: millis(&var, "OPSDECK_POLL_INTERVAL_MS")?
                .unwrap_or(defaults.poll_interval),
            max_retries: parse(&var, "OPSDECK_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            initial_backoff: millis(&var, "OPSDECK_INITIAL_BACKOFF_MS")?
                .unwrap_or(defaults.initial_backoff),
            max_backoff: millis(&var, "OPSDECK_MAX_BACKOFF_MS")?.unwrap_or(defaults.max_backoff),
            request_timeout: millis(&var, "OPSDECK_REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout),
            max_upload_bytes: parse(&var, "OPSDECK_MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
            max_files: parse(&var, "OPSDECK_MAX_FILES")?,
            remote_cancel: flag(&var, "OPSDECK_REMOTE_CANCEL")?.unwrap_or(defaults.remote_cancel),
            history_limit: parse(&var, "OPSDECK_HISTORY_LIMIT")?,
        })
    }

    /// Workflow configuration derived from these settings.
    #[must_use]
    pub fn workflow_settings(&self) -> JobWorkflowSettings {
        JobWorkflowSettings {
            poller: PollerConfig {
                interval: self.poll_interval,
                max_retries: self.max_retries,
                initial_backoff: self.initial_backoff,
                max_backoff: self.max_backoff,
                request_timeout: self.request_timeout,
                remote_cancel: self.remote_cancel,
                jitter: true,
            },
            limits: SubmissionLimits {
                max_file_bytes: self.max_upload_bytes,
                max_files: self.max_files,
            },
            history_limit: self.history_limit,
        }
    }
}

fn invalid(name: &str, value: &str, reason: impl ToString) -> SettingsError {
    SettingsError {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, SettingsError>
where
    T: FromStr,
    T::Err: ToString,
{
    var(name)
        .map(|value| value.trim().parse().map_err(|e| invalid(name, &value, e)))
        .transpose()
}

fn millis(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<Duration>, SettingsError> {
    Ok(parse::<u64>(var, name)?.map(Duration::from_millis))
}

fn flag(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<bool>, SettingsError> {
    var(name)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(name, &value, "expected true or false")),
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ConsoleSettings, SettingsError> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        ConsoleSettings::from_lookup(|name| map.get(name).map(|v| (*v).to_string()))
    }

    #[test]
    fn test_defaults() {
        let settings = load(&[]).unwrap();
        assert_eq!(settings, ConsoleSettings::default());
        assert_eq!(settings.poll_interval, Duration::from_secs(3));
        assert_eq!(settings.max_retries, 3);
        assert!(settings.remote_cancel);
    }

    #[test]
    fn test_overrides() {
        let settings = load(&[
            ("OPSDECK_ENV", " staging "),
            ("OPSDECK_POLL_INTERVAL_MS", "500"),
            ("OPSDECK_MAX_RETRIES", "5"),
            ("OPSDECK_REMOTE_CANCEL", "off"),
            ("OPSDECK_MAX_FILES", "10"),
        ])
        .unwrap();
        assert_eq!(settings.environment.as_deref(), Some("staging"));
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.max_retries, 5);
        assert!(!settings.remote_cancel);
        assert_eq!(settings.max_files, Some(10));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let settings = load(&[("OPSDECK_MAX_RETRIES", "  ")]).unwrap();
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn test_invalid_number() {
        let error = load(&[("OPSDECK_MAX_RETRIES", "three")]).unwrap_err();
        assert_eq!(error.name, "OPSDECK_MAX_RETRIES");
        assert_eq!(error.value, "three");
    }

    #[test]
    fn test_invalid_flag() {
        assert!(load(&[("OPSDECK_REMOTE_CANCEL", "maybe")]).is_err());
    }

    #[test]
    fn test_workflow_settings() {
        let settings = load(&[
            ("OPSDECK_MAX_UPLOAD_BYTES", "1024"),
            ("OPSDECK_HISTORY_LIMIT", "50"),
        ])
        .unwrap();
        let workflow = settings.workflow_settings();
        assert_eq!(workflow.limits.max_file_bytes, 1024);
        assert_eq!(workflow.history_limit, Some(50));
        assert_eq!(workflow.poller.request_timeout, Duration::from_secs(10));
    }
}
