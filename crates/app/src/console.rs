//! Session wiring: registry, API client, workflow and repositories.

use std::sync::Arc;

use opsdeck_application::{ApiClient, EnvironmentRegistry, JobWorkflow};
use opsdeck_infrastructure::{
    ConsoleSettings, EnvironmentSource, ReqwestTransport, RestConfigurationRepository,
    RestUserRepository, SystemClock,
};
use tracing::info;

use crate::cli::Cli;

/// Everything a command needs, built once per invocation.
pub struct Console {
    pub registry: Arc<EnvironmentRegistry>,
    pub workflow: JobWorkflow,
    pub processes: RestConfigurationRepository,
    pub users: RestUserRepository,
}

impl Console {
    /// Loads settings and the environment catalog, then wires the session.
    pub async fn build(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = ConsoleSettings::from_env()?;
        cli.tuning.apply(&mut settings);
        if cli.environment.is_some() {
            settings.environment.clone_from(&cli.environment);
        }

        let source = EnvironmentSource::from_process(cli.environments.as_deref());
        let catalog = source.load().await?;
        let registry = Arc::new(catalog.into_registry(settings.environment.as_deref())?);
        info!(
            source = %source,
            environment = %registry.active().id,
            "console ready"
        );

        let transport = Arc::new(ReqwestTransport::new()?);
        let api = ApiClient::new(Arc::clone(&registry), transport)
            .with_timeout(settings.request_timeout);
        let workflow = JobWorkflow::new(
            api.clone(),
            Arc::new(SystemClock::new()),
            settings.workflow_settings(),
        );

        Ok(Self {
            registry,
            workflow,
            processes: RestConfigurationRepository::new(api.clone()),
            users: RestUserRepository::new(api),
        })
    }
}
