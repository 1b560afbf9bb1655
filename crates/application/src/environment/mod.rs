//! Environment context: the registry of deployment targets.

mod registry;

pub use registry::{EnvironmentRegistry, RegistryError};
