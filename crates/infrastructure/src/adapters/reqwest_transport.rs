//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `Transport` port. Every answered request is
//! returned as an `ApiResponse`, whatever its status; only failures to get
//! a response become `ApiError`s.

use std::time::Duration;

use async_trait::async_trait;
use opsdeck_application::ports::{ApiRequest, ApiResponse, HttpMethod, RequestBody, Transport};
use opsdeck_application::ApiError;
use reqwest::{Client, Method, Url};
use tracing::trace;

use crate::http::build_form;

/// Maximum number of redirects followed.
const MAX_REDIRECTS: usize = 10;

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled (rustls)
    /// - User-Agent: "OpsDeck/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("OpsDeck/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| {
                ApiError::invalid_request("cannot build HTTP client").with_cause(e.to_string())
            })?;

        Ok(Self { client })
    }

    /// Creates a transport around a preconfigured client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn build_body(
        builder: reqwest::RequestBuilder,
        body: RequestBody,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        match body {
            RequestBody::None => Ok(builder),
            RequestBody::Json(value) => Ok(builder.json(&value)),
            RequestBody::Multipart(form) => Ok(builder.multipart(build_form(form)?)),
        }
    }

    /// Maps reqwest errors onto the transient/definitive taxonomy.
    fn map_error(error: &reqwest::Error, timeout: Duration) -> ApiError {
        if error.is_timeout() {
            return ApiError::timeout(timeout).with_cause(error.to_string());
        }

        if error.is_connect() {
            let host = error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string();
            return ApiError::network(format!("cannot connect to {host}"))
                .with_cause(error.to_string());
        }

        if error.is_redirect() {
            return ApiError::network(format!("more than {MAX_REDIRECTS} redirects"));
        }

        if error.is_builder() {
            return ApiError::invalid_request(error.to_string());
        }

        ApiError::network(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = Url::parse(&request.url)
            .map_err(|e| ApiError::invalid_request(format!("invalid URL {}: {e}", request.url)))?;
        let timeout = request.timeout;

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = Self::build_body(builder, request.body)?;

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout))?
            .to_vec();

        trace!(status, bytes = body.len(), "response received");
        Ok(ApiResponse::new(status, body))
    }
}
