//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod repositories;
mod transport;

pub use clock::Clock;
pub use repositories::{ConfigurationRepository, UserRepository};
pub use transport::{
    ApiRequest, ApiResponse, HttpMethod, MultipartForm, RequestBody, Transport,
};
