//! Environment registry
//!
//! Holds the deployment environments known to the session and the single
//! active selection. The active pointer and the version counter change only
//! through [`EnvironmentRegistry::set_active`].

use std::collections::HashSet;

use opsdeck_domain::{DomainError, Environment, EnvironmentBinding, EnvironmentVersion};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::info;

use crate::error::UnknownEnvironment;

/// Errors that prevent a registry from being built.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No environments were supplied.
    #[error("at least one environment must be configured")]
    Empty,

    /// Two environments share an identifier.
    #[error("duplicate environment id: {0}")]
    DuplicateId(String),

    /// An environment definition is invalid.
    #[error("invalid environment {id}: {source}")]
    Invalid {
        /// Offending environment.
        id: String,
        /// What is wrong with it.
        source: DomainError,
    },

    /// The requested default is not among the environments.
    #[error(transparent)]
    UnknownDefault(#[from] UnknownEnvironment),
}

#[derive(Debug, Clone, Copy)]
struct ActiveState {
    index: usize,
    version: EnvironmentVersion,
}

/// Registry of deployment environments with one active selection.
///
/// Shared as `Arc<EnvironmentRegistry>` by every component that talks to the
/// remote service. The base URL is derived from the active environment on
/// every call and never cached.
#[derive(Debug)]
pub struct EnvironmentRegistry {
    environments: Vec<Environment>,
    state: RwLock<ActiveState>,
    version_tx: watch::Sender<EnvironmentVersion>,
}

impl EnvironmentRegistry {
    /// Builds a registry.
    ///
    /// The active environment is `default_id` if given, otherwise the first
    /// one. The version starts at 0.
    ///
    /// # Errors
    ///
    /// Fails if the list is empty, ids are duplicated, an environment does
    /// not validate, or `default_id` is unknown.
    pub fn new(
        environments: Vec<Environment>,
        default_id: Option<&str>,
    ) -> Result<Self, RegistryError> {
        if environments.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for environment in &environments {
            environment
                .validate()
                .map_err(|source| RegistryError::Invalid {
                    id: environment.id.clone(),
                    source,
                })?;
            if !seen.insert(environment.id.as_str()) {
                return Err(RegistryError::DuplicateId(environment.id.clone()));
            }
        }

        let index = match default_id {
            Some(id) => environments
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| UnknownEnvironment(id.to_string()))?,
            None => 0,
        };

        let (version_tx, _) = watch::channel(EnvironmentVersion::INITIAL);
        Ok(Self {
            environments,
            state: RwLock::new(ActiveState {
                index,
                version: EnvironmentVersion::INITIAL,
            }),
            version_tx,
        })
    }

    /// Returns all environments in configuration order.
    #[must_use]
    pub fn list_environments(&self) -> &[Environment] {
        &self.environments
    }

    /// Returns the active environment.
    #[must_use]
    pub fn active(&self) -> Environment {
        let index = self.state.read().index;
        self.environments[index].clone()
    }

    /// Makes the environment with the given id active and bumps the version.
    ///
    /// Re-selecting the active environment is still a switch. In-flight jobs
    /// are not affected; only calls made afterwards see the new target.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEnvironment` without changing anything if the id is
    /// not registered.
    pub fn set_active(&self, id: &str) -> Result<EnvironmentVersion, UnknownEnvironment> {
        let index = self
            .environments
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| UnknownEnvironment(id.to_string()))?;

        let version = {
            let mut state = self.state.write();
            state.index = index;
            state.version = state.version.next();
            state.version
        };
        self.version_tx.send_replace(version);

        info!(environment = id, %version, "switched active environment");
        Ok(version)
    }

    /// Returns the API base URL of the active environment.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        let index = self.state.read().index;
        self.environments[index].api_base_url()
    }

    /// Returns the current version.
    #[must_use]
    pub fn version(&self) -> EnvironmentVersion {
        self.state.read().version
    }

    /// Captures the active environment id, its base URL and the version in
    /// one consistent snapshot.
    #[must_use]
    pub fn binding(&self) -> EnvironmentBinding {
        let state = *self.state.read();
        let environment = &self.environments[state.index];
        EnvironmentBinding::new(
            environment.id.clone(),
            environment.api_base_url(),
            state.version,
        )
    }

    /// Returns a receiver that observes every version change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EnvironmentVersion> {
        self.version_tx.subscribe()
    }
}
