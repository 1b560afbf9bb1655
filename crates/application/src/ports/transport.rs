//! HTTP transport port

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use opsdeck_domain::UploadFile;

use crate::error::ApiError;

/// HTTP methods used against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns the method as an uppercase string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multipart upload: plain text fields plus file parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    /// Text fields in insertion order.
    pub fields: Vec<(String, String)>,
    /// Field name used for every file part.
    pub file_field: String,
    /// File parts.
    pub files: Vec<UploadFile>,
}

impl MultipartForm {
    /// Creates an empty form whose files are sent under `file_field`.
    #[must_use]
    pub fn new(file_field: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            file_field: file_field.into(),
            files: Vec::new(),
        }
    }

    /// Adds a text field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Adds file parts.
    #[must_use]
    pub fn files(mut self, files: impl IntoIterator<Item = UploadFile>) -> Self {
        self.files.extend(files);
        self
    }
}

/// Request body variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// JSON document.
    Json(serde_json::Value),
    /// Multipart form upload.
    Multipart(MultipartForm),
}

/// A fully resolved request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Body.
    pub body: RequestBody,
    /// Upper bound on the whole exchange.
    pub timeout: Duration,
}

/// Raw response from the transport. Non-2xx statuses are not errors at
/// this level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Port for sending HTTP requests.
///
/// Adapters map connection problems and timeouts to [`ApiError`] and
/// return every answered request as an [`ApiResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}
