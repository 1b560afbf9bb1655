//! Serialization helpers.
//!
//! Environment catalogs arrive as JSON or YAML; command output is written
//! as indented JSON.

mod json;
mod yaml;

pub use json::{from_json, to_pretty_json};
pub use yaml::from_yaml;

/// Failure to encode or decode a document.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// The value could not be written as JSON.
    #[error("cannot encode JSON: {0}")]
    Encode(serde_json::Error),

    /// The input is not valid JSON for the expected type.
    #[error("invalid JSON: {0}")]
    Json(serde_json::Error),

    /// The input is not valid YAML for the expected type.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
