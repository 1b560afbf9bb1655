//! Record repository ports
//!
//! Plain CRUD facades over the remote service. Implementations issue one
//! call per operation against the currently active environment.

use async_trait::async_trait;
use opsdeck_domain::{ProcessConfig, UserFilter, UserRecord};

use crate::error::ApiError;

/// Repository for process configuration records.
#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    /// Lists all processes.
    async fn list(&self) -> Result<Vec<ProcessConfig>, ApiError>;

    /// Loads one process.
    async fn get(&self, id: &str) -> Result<ProcessConfig, ApiError>;

    /// Creates a process and returns the stored record.
    async fn create(&self, process: &ProcessConfig) -> Result<ProcessConfig, ApiError>;

    /// Replaces a process and returns the stored record.
    async fn update(&self, process: &ProcessConfig) -> Result<ProcessConfig, ApiError>;

    /// Sets a single parameter on a process.
    async fn set_parameter(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<ProcessConfig, ApiError> {
        let mut process = self.get(id).await?;
        process.set_parameter(key, value);
        self.update(&process).await
    }
}

/// Repository for user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Lists users matching the filter.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>, ApiError>;

    /// Loads one user.
    async fn get(&self, id: &str) -> Result<UserRecord, ApiError>;

    /// Creates a user and returns the stored record.
    async fn create(&self, user: &UserRecord) -> Result<UserRecord, ApiError>;

    /// Replaces a user and returns the stored record.
    async fn update(&self, user: &UserRecord) -> Result<UserRecord, ApiError>;
}
