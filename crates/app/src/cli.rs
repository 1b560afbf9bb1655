//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use opsdeck_domain::{ExportFormat, Navigation, UserRole};
use opsdeck_infrastructure::ConsoleSettings;

/// Operator console for batch import/export jobs.
#[derive(Debug, Parser)]
#[command(name = "opsdeck")]
#[command(about = "Operator console for batch import/export jobs")]
#[command(version)]
pub struct Cli {
    /// Environment to work against (overrides the catalog default)
    #[arg(long = "env", short = 'e', global = true, env = "OPSDECK_ENV")]
    pub environment: Option<String>,

    /// Environment catalog file (.json, .yaml, .yml)
    #[arg(long, global = true, value_name = "PATH")]
    pub environments: Option<PathBuf>,

    #[command(flatten)]
    pub tuning: Tuning,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags overriding [`ConsoleSettings`].
#[derive(Debug, Default, Args)]
pub struct Tuning {
    /// Delay between status polls
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Consecutive failed polls before a job is marked failed
    #[arg(long, global = true, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Upper bound on a single API call
    #[arg(long, global = true, value_name = "MS")]
    pub request_timeout_ms: Option<u64>,

    /// Do not forward cancellation to the service
    #[arg(long, global = true)]
    pub no_remote_cancel: bool,
}

impl Tuning {
    /// Applies the flags that were given on top of `settings`.
    pub fn apply(&self, settings: &mut ConsoleSettings) {
        if let Some(ms) = self.poll_interval_ms {
            settings.poll_interval = std::time::Duration::from_millis(ms);
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(ms) = self.request_timeout_ms {
            settings.request_timeout = std::time::Duration::from_millis(ms);
        }
        if self.no_remote_cancel {
            settings.remote_cancel = false;
        }
    }
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List configured environments
    Envs,

    /// Upload files into a process and follow the import job
    Import {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target process id
        #[arg(long, short)]
        process: String,
        /// Category within the process
        #[arg(long, short)]
        category: Option<String>,
        /// Return after submission instead of following the job
        #[arg(long)]
        detach: bool,
    },

    /// Request an export and follow the job
    Export {
        /// Process ids to export
        #[arg(long = "process", short, value_name = "ID")]
        processes: Vec<String>,
        /// Free-text filter evaluated by the service
        #[arg(long)]
        filter: Option<String>,
        /// Output format: csv, json or xlsx
        #[arg(long, short, default_value = "csv")]
        format: ExportFormat,
        /// Return after submission instead of following the job
        #[arg(long)]
        detach: bool,
    },

    /// Inspect and edit process configuration
    #[command(subcommand)]
    Processes(ProcessCommand),

    /// Inspect user records
    #[command(subcommand)]
    Users(UserCommand),

    /// Resolve a navigation target such as `configuration:billing`
    Open {
        /// `view` or `view:record`
        target: Navigation,
    },
}

/// `processes` subcommands.
#[derive(Debug, Subcommand)]
pub enum ProcessCommand {
    /// List processes
    List,
    /// Show one process
    Get {
        /// Process id
        id: String,
    },
    /// Set a single process parameter
    SetParam {
        /// Process id
        id: String,
        /// Parameter name
        key: String,
        /// New value
        value: String,
    },
}

/// `users` subcommands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List users
    List {
        /// Only users with this role (viewer, operator, admin)
        #[arg(long)]
        role: Option<UserRole>,
        /// Only active users
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        /// Only inactive users
        #[arg(long)]
        inactive: bool,
        /// Search on username or display name
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one user
    Get {
        /// User id
        id: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use opsdeck_domain::View;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("opsdeck").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_arguments() {
        let cli = parse(&["--env", "staging", "import", "a.csv", "b.csv", "-p", "billing"]);
        assert_eq!(cli.environment.as_deref(), Some("staging"));
        match cli.command {
            Command::Import {
                files,
                process,
                category,
                detach,
            } => {
                assert_eq!(files, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
                assert_eq!(process, "billing");
                assert_eq!(category, None);
                assert!(!detach);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_import_requires_files() {
        assert!(Cli::try_parse_from(["opsdeck", "import", "--process", "billing"]).is_err());
    }

    #[test]
    fn test_export_format() {
        let cli = parse(&["export", "--process", "a", "--process", "b", "-f", "XLSX"]);
        match cli.command {
            Command::Export {
                processes, format, ..
            } => {
                assert_eq!(processes, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(format, ExportFormat::Xlsx);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["opsdeck", "export", "--format", "pdf"]).is_err());
    }

    #[test]
    fn test_open_target() {
        let cli = parse(&["open", "configuration:billing"]);
        match cli.command {
            Command::Open { target } => {
                assert_eq!(target, Navigation::focused(View::Configuration, "billing"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_users_filter_flags() {
        let cli = parse(&["users", "list", "--role", "Admin", "--active"]);
        match cli.command {
            Command::Users(UserCommand::List { role, active, .. }) => {
                assert_eq!(role, Some(UserRole::Admin));
                assert!(active);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        let both = ["opsdeck", "users", "list", "--active", "--inactive"];
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn test_tuning_overrides_settings() {
        let cli = parse(&["--max-retries", "7", "--no-remote-cancel", "envs"]);
        let mut settings = ConsoleSettings::default();
        cli.tuning.apply(&mut settings);
        assert_eq!(settings.max_retries, 7);
        assert!(!settings.remote_cancel);
        assert_eq!(settings.poll_interval, Duration::from_secs(3));
    }
}
