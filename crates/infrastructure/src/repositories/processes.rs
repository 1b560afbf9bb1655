//! Process configuration repository over `/processes`.

use async_trait::async_trait;
use opsdeck_application::ports::ConfigurationRepository;
use opsdeck_application::{ApiClient, ApiError};
use opsdeck_domain::ProcessConfig;
use opsdeck_domain::environment::path_segment;

/// Collection endpoint.
const PROCESSES_PATH: &str = "/processes";

/// [`ConfigurationRepository`] backed by the remote service.
#[derive(Debug, Clone)]
pub struct RestConfigurationRepository {
    api: ApiClient,
}

impl RestConfigurationRepository {
    /// Creates a repository using the given client.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn item_path(id: &str) -> String {
        format!("{PROCESSES_PATH}/{}", path_segment(id))
    }
}

#[async_trait]
impl ConfigurationRepository for RestConfigurationRepository {
    async fn list(&self) -> Result<Vec<ProcessConfig>, ApiError> {
        self.api.get_json(PROCESSES_PATH).await
    }

    async fn get(&self, id: &str) -> Result<ProcessConfig, ApiError> {
        self.api.get_json(&Self::item_path(id)).await
    }

    async fn create(&self, process: &ProcessConfig) -> Result<ProcessConfig, ApiError> {
        self.api.post_json(PROCESSES_PATH, process).await
    }

    async fn update(&self, process: &ProcessConfig) -> Result<ProcessConfig, ApiError> {
        self.api.put_json(&Self::item_path(&process.id), process).await
    }
}
