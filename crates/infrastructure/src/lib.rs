//! `OpsDeck` Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod environment_source;
pub mod http;
pub mod repositories;
pub mod serialization;
pub mod settings;

pub use adapters::{ReqwestTransport, SystemClock};
pub use environment_source::{
    ENVIRONMENTS_FILE_VAR, ENVIRONMENTS_VAR, EnvironmentCatalog, EnvironmentSource,
    EnvironmentSourceError,
};
pub use http::{UploadReadError, build_form, part_mime, read_upload_files};
pub use repositories::{RestConfigurationRepository, RestUserRepository};
pub use serialization::{SerializationError, from_json, from_yaml, to_pretty_json};
pub use settings::{ConsoleSettings, SettingsError};
