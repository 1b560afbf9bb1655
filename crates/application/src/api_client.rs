//! Environment-aware API client
//!
//! Every call resolves its target base URL at call time. A client created
//! with [`ApiClient::new`] follows the registry's active environment; a
//! client returned by [`ApiClient::pinned`] stays on the environment it was
//! bound to, which is what job tracking needs after a switch.

use std::sync::Arc;
use std::time::Duration;

use opsdeck_domain::{EnvironmentBinding, environment::join_url, generate_id};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::environment::EnvironmentRegistry;
use crate::error::ApiError;
use crate::ports::{ApiRequest, ApiResponse, HttpMethod, RequestBody, Transport};

/// Default upper bound on a single call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying a per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone)]
enum Target {
    /// Follow the registry's active environment.
    Current(Arc<EnvironmentRegistry>),
    /// Stay on a captured environment.
    Pinned {
        registry: Arc<EnvironmentRegistry>,
        binding: EnvironmentBinding,
    },
}

/// Thin HTTP accessor parameterized by (method, path, body).
///
/// No retries happen here; callers own their retry policy.
#[derive(Clone)]
pub struct ApiClient {
    target: Target,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("target", &self.target)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client that follows the registry's active environment.
    #[must_use]
    pub fn new(registry: Arc<EnvironmentRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            target: Target::Current(registry),
            transport,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a client that always targets `binding`, ignoring later
    /// environment switches.
    #[must_use]
    pub fn pinned(&self, binding: EnvironmentBinding) -> Self {
        Self {
            target: Target::Pinned {
                registry: Arc::clone(self.registry()),
                binding,
            },
            transport: Arc::clone(&self.transport),
            timeout: self.timeout,
        }
    }

    /// The registry this client reads from.
    #[must_use]
    pub const fn registry(&self) -> &Arc<EnvironmentRegistry> {
        match &self.target {
            Target::Current(registry) | Target::Pinned { registry, .. } => registry,
        }
    }

    /// Returns true if the client is pinned to a binding.
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        matches!(self.target, Target::Pinned { .. })
    }

    /// Returns the binding the next call would use.
    #[must_use]
    pub fn binding(&self) -> EnvironmentBinding {
        match &self.target {
            Target::Current(registry) => registry.binding(),
            Target::Pinned { binding, .. } => binding.clone(),
        }
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn base_url(&self) -> String {
        match &self.target {
            Target::Current(registry) => registry.api_base_url(),
            Target::Pinned { binding, .. } => binding.base_url.clone(),
        }
    }

    /// Sends a request and returns the raw 2xx response.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport failures and non-2xx statuses.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        self.request_with_headers(method, path, body, Vec::new()).await
    }

    /// Like [`request`](Self::request) with extra headers.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport failures and non-2xx statuses.
    pub async fn request_with_headers(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
        mut headers: Vec<(String, String)>,
    ) -> Result<ApiResponse, ApiError> {
        let url = join_url(&self.base_url(), path);
        headers.push((REQUEST_ID_HEADER.to_string(), generate_id()));

        debug!(%method, %url, "api request");
        let response = self
            .transport
            .send(ApiRequest {
                method,
                url,
                headers,
                body,
                timeout: self.timeout,
            })
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::status(
                response.status,
                error_message(&response.body),
            ))
        }
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport failures, non-2xx statuses and
    /// bodies that do not decode into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
        headers: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let response = self
            .request_with_headers(method, path, body, headers)
            .await?;
        decode(&response)
    }

    /// `GET path`, decoding JSON.
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(HttpMethod::Get, path, RequestBody::None, Vec::new())
            .await
    }

    /// `POST path` with a JSON body, decoding JSON.
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_json_body(body)?;
        self.request_json(HttpMethod::Post, path, body, Vec::new())
            .await
    }

    /// `PUT path` with a JSON body, decoding JSON.
    ///
    /// # Errors
    ///
    /// See [`request_json`](Self::request_json).
    pub async fn put_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_json_body(body)?;
        self.request_json(HttpMethod::Put, path, body, Vec::new())
            .await
    }

    /// `POST path` without a body, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport failures and non-2xx statuses.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.request(HttpMethod::Post, path, RequestBody::None)
            .await
            .map(|_| ())
    }

    /// `DELETE path`, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport failures and non-2xx statuses.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(HttpMethod::Delete, path, RequestBody::None)
            .await
            .map(|_| ())
    }
}

fn to_json_body<B: Serialize>(body: &B) -> Result<RequestBody, ApiError> {
    serde_json::to_value(body)
        .map(RequestBody::Json)
        .map_err(|e| ApiError::invalid_request(format!("cannot serialize body: {e}")))
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|e| {
        let excerpt: String = String::from_utf8_lossy(&response.body).chars().take(200).collect();
        ApiError::decode(format!("malformed response body: {e}")).with_cause(excerpt)
    })
}

/// Extracts a readable message from an error body: the `message` or
/// `error` field of a JSON object, else the raw text.
fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.to_string();
            }
        }
    }
    String::from_utf8_lossy(body).trim().chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::test_support::{Reply, ScriptedTransport, test_registry};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping {
        ok: bool,
    }

    fn pong() -> Reply {
        Reply::json(200, json!({"ok": true}))
    }

    #[tokio::test]
    async fn test_reads_base_url_on_every_call() {
        let registry = test_registry();
        let transport = ScriptedTransport::new();
        transport.push(HttpMethod::Get, "http://dev.test/ping", pong());
        transport.push(HttpMethod::Get, "http://prod.test/ping", pong());

        let client = ApiClient::new(Arc::clone(&registry), transport.clone());
        let _: Ping = client.get_json("/ping").await.unwrap();
        registry.set_active("prod").unwrap();
        let _: Ping = client.get_json("/ping").await.unwrap();

        assert_eq!(
            transport.calls(),
            vec!["GET http://dev.test/ping", "GET http://prod.test/ping"]
        );
    }

    #[tokio::test]
    async fn test_pinned_ignores_switch() {
        let registry = test_registry();
        let transport = ScriptedTransport::new();
        transport.push(HttpMethod::Get, "http://dev.test/ping", pong());

        let client = ApiClient::new(Arc::clone(&registry), transport.clone());
        let pinned = client.pinned(registry.binding());
        registry.set_active("prod").unwrap();

        let ping: Ping = pinned.get_json("/ping").await.unwrap();
        assert_eq!(ping, Ping { ok: true });
        assert!(pinned.is_pinned());
        assert_eq!(pinned.binding().environment_id, "dev");
        assert_eq!(client.binding().environment_id, "prod");
        assert_eq!(transport.calls(), vec!["GET http://dev.test/ping"]);
    }

    #[tokio::test]
    async fn test_non_2xx_becomes_status_error() {
        let transport = ScriptedTransport::new();
        transport.push(
            HttpMethod::Get,
            "http://dev.test/jobs/x",
            Reply::json(404, json!({"message": "no such job"})),
        );
        let client = ApiClient::new(test_registry(), transport);

        let error = client.get_json::<Ping>("/jobs/x").await.unwrap_err();
        assert_eq!(error.kind, ApiErrorKind::Status);
        assert_eq!(error.status_code, Some(404));
        assert_eq!(error.message, "HTTP 404: no such job");
        assert!(!error.is_transient());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let transport = ScriptedTransport::new();
        transport.push(HttpMethod::Get, "http://dev.test/ping", Reply::raw(200, "<html>"));
        let client = ApiClient::new(test_registry(), transport);

        let error = client.get_json::<Ping>("/ping").await.unwrap_err();
        assert_eq!(error.kind, ApiErrorKind::Decode);
        assert_eq!(error.cause.as_deref(), Some("<html>"));
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let transport = ScriptedTransport::new();
        transport.push(
            HttpMethod::Post,
            "http://dev.test/jobs/1/cancel",
            Reply::Error(ApiError::network("connection refused")),
        );
        let client = ApiClient::new(test_registry(), transport);

        let error = client.post_empty("/jobs/1/cancel").await.unwrap_err();
        assert_eq!(error.kind, ApiErrorKind::Network);
    }

    #[tokio::test]
    async fn test_request_id_header_attached() {
        let transport = ScriptedTransport::new();
        transport.push(HttpMethod::Delete, "http://dev.test/users/1", Reply::raw(204, ""));
        let client = ApiClient::new(test_registry(), transport.clone());

        client.delete("/users/1").await.unwrap();
        let request = transport.last_request().expect("a request was sent");
        assert!(request.headers.iter().any(|(name, _)| name == REQUEST_ID_HEADER));
        assert_eq!(request.timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(br#"{"error":"bad input"}"#), "bad input");
        assert_eq!(error_message(b"  plain text  "), "plain text");
    }
}
