//! Environment catalog loading.
//!
//! The list of deployment environments is resolved, in order, from:
//! 1. an explicit file (`--environments` or `OPSDECK_ENVIRONMENTS_FILE`)
//! 2. inline JSON in `OPSDECK_ENVIRONMENTS`
//! 3. `<config dir>/opsdeck/environments.yaml`, if it exists
//! 4. the built-in local/dev/staging/prod list

use std::fmt;
use std::path::{Path, PathBuf};

use opsdeck_application::{EnvironmentRegistry, RegistryError};
use opsdeck_domain::Environment;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::serialization::{SerializationError, from_json, from_yaml};

/// Variable naming a catalog file.
pub const ENVIRONMENTS_FILE_VAR: &str = "OPSDECK_ENVIRONMENTS_FILE";

/// Variable holding an inline JSON catalog.
pub const ENVIRONMENTS_VAR: &str = "OPSDECK_ENVIRONMENTS";

/// Error type for environment catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentSourceError {
    /// The catalog file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Catalog path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The catalog could not be parsed.
    #[error("invalid environment catalog from {origin}: {source}")]
    Parse {
        /// Where the catalog came from.
        origin: String,
        /// Parse failure.
        source: SerializationError,
    },

    /// The file extension is not `.json`, `.yaml` or `.yml`.
    #[error("unsupported environment file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The catalog does not form a valid registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Serialized list of environments plus the default selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentCatalog {
    /// Environment selected at start-up; the first one if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Known environments in display order.
    pub environments: Vec<Environment>,
}

impl EnvironmentCatalog {
    /// Built-in catalog used when nothing is configured.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            default: Some("local".to_string()),
            environments: vec![
                Environment::new("local", "Local", "http://localhost:8080/api", "local"),
                Environment::new("dev", "Development", "https://dev.opsdeck.internal/api", "eu"),
                Environment::new(
                    "staging",
                    "Staging",
                    "https://staging-{region}.opsdeck.internal/api",
                    "eu",
                ),
                Environment::new("prod", "Production", "https://{region}.opsdeck.io/api", "eu"),
            ],
        }
    }

    /// Builds the registry, honoring `default_override` over the catalog's
    /// own default.
    ///
    /// # Errors
    ///
    /// Returns a `RegistryError` if the catalog is empty, has duplicate or
    /// invalid environments, or names an unknown default.
    pub fn into_registry(
        self,
        default_override: Option<&str>,
    ) -> Result<EnvironmentRegistry, RegistryError> {
        let default = default_override.or(self.default.as_deref());
        EnvironmentRegistry::new(self.environments, default)
    }
}

/// Where a catalog is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentSource {
    /// A JSON or YAML file.
    File(PathBuf),
    /// Inline JSON.
    Inline(String),
    /// The built-in list.
    Builtin,
}

impl fmt::Display for EnvironmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(_) => write!(f, "${ENVIRONMENTS_VAR}"),
            Self::Builtin => f.write_str("built-in defaults"),
        }
    }
}

impl EnvironmentSource {
    /// Picks the source by precedence.
    ///
    /// `lookup` reads environment variables; `config_dir` is the platform
    /// configuration directory, if any.
    pub fn resolve(
        explicit: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
        config_dir: Option<&Path>,
    ) -> Self {
        if let Some(path) = explicit {
            return Self::File(path.to_path_buf());
        }
        if let Some(path) = lookup(ENVIRONMENTS_FILE_VAR).filter(|v| !v.trim().is_empty()) {
            return Self::File(PathBuf::from(path));
        }
        if let Some(inline) = lookup(ENVIRONMENTS_VAR).filter(|v| !v.trim().is_empty()) {
            return Self::Inline(inline);
        }
        if let Some(path) = config_dir
            .map(|dir| dir.join("opsdeck").join("environments.yaml"))
            .filter(|path| path.is_file())
        {
            return Self::File(path);
        }
        Self::Builtin
    }

    /// Picks the source from the process environment and the user's
    /// configuration directory.
    #[must_use]
    pub fn from_process(explicit: Option<&Path>) -> Self {
        Self::resolve(
            explicit,
            |name| std::env::var(name).ok(),
            dirs::config_dir().as_deref(),
        )
    }

    /// Loads the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the catalog does not
    /// parse.
    pub async fn load(&self) -> Result<EnvironmentCatalog, EnvironmentSourceError> {
        debug!(source = %self, "loading environment catalog");
        match self {
            Self::File(path) => load_file(path).await,
            Self::Inline(json) => from_json(json).map_err(|source| EnvironmentSourceError::Parse {
                origin: self.to_string(),
                source,
            }),
            Self::Builtin => Ok(EnvironmentCatalog::builtin()),
        }
    }
}

async fn load_file(path: &Path) -> Result<EnvironmentCatalog, EnvironmentSourceError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let is_yaml = match extension.as_deref() {
        Some("json") => false,
        Some("yaml" | "yml") => true,
        _ => return Err(EnvironmentSourceError::UnsupportedFormat(path.to_path_buf())),
    };

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| EnvironmentSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let parsed = if is_yaml {
        from_yaml(&content)
    } else {
        from_json(&content)
    };
    parsed.map_err(|source| EnvironmentSourceError::Parse {
        origin: path.display().to_string(),
        source,
    })
}
