//! Deployment environment domain types

mod binding;
mod definition;

pub use binding::{EnvironmentBinding, EnvironmentVersion, join_url, path_segment};
pub use definition::Environment;
