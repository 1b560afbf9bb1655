//! REST-backed record repositories.
//!
//! Each repository issues one call per operation through an [`ApiClient`]
//! that follows the active environment.
//!
//! [`ApiClient`]: opsdeck_application::ApiClient

mod processes;
mod users;

pub use processes::RestConfigurationRepository;
pub use users::RestUserRepository;
