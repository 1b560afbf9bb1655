//! User repository over `/users`.

use async_trait::async_trait;
use opsdeck_application::ports::UserRepository;
use opsdeck_application::{ApiClient, ApiError};
use opsdeck_domain::environment::path_segment;
use opsdeck_domain::{UserFilter, UserRecord};

/// Collection endpoint.
const USERS_PATH: &str = "/users";

/// [`UserRepository`] backed by the remote service.
#[derive(Debug, Clone)]
pub struct RestUserRepository {
    api: ApiClient,
}

impl RestUserRepository {
    /// Creates a repository using the given client.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn item_path(id: &str) -> String {
        format!("{USERS_PATH}/{}", path_segment(id))
    }

    /// `/users` with the filter as query string; unset fields are omitted.
    fn list_path(filter: &UserFilter) -> Result<String, ApiError> {
        let query = serde_urlencoded::to_string(filter)
            .map_err(|e| ApiError::invalid_request(format!("cannot encode user filter: {e}")))?;
        if query.is_empty() {
            Ok(USERS_PATH.to_string())
        } else {
            Ok(format!("{USERS_PATH}?{query}"))
        }
    }
}

#[async_trait]
impl UserRepository for RestUserRepository {
    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>, ApiError> {
        let path = Self::list_path(filter)?;
        self.api.get_json(&path).await
    }

    async fn get(&self, id: &str) -> Result<UserRecord, ApiError> {
        self.api.get_json(&Self::item_path(id)).await
    }

    async fn create(&self, user: &UserRecord) -> Result<UserRecord, ApiError> {
        self.api.post_json(USERS_PATH, user).await
    }

    async fn update(&self, user: &UserRecord) -> Result<UserRecord, ApiError> {
        self.api.put_json(&Self::item_path(&user.id), user).await
    }
}
