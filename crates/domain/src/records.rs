//! User and process-configuration records managed through the console.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Configuration of a batch process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessConfig {
    /// Process identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category the process belongs to.
    #[serde(default)]
    pub category: Option<String>,
    /// Whether the process accepts new jobs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Process parameters (sorted for stable output).
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

const fn default_enabled() -> bool {
    true
}

impl ProcessConfig {
    /// Creates an enabled process without parameters.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            enabled: true,
            parameters: BTreeMap::new(),
        }
    }

    /// Sets a parameter, returning the previous value.
    pub fn set_parameter(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.parameters.insert(key.into(), value.into())
    }
}

/// Role of a console user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Read-only access.
    #[default]
    Viewer,
    /// Can run imports and exports.
    Operator,
    /// Full access.
    Admin,
}

impl UserRole {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Operator => "operator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "operator" => Ok(Self::Operator),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError::new(format!("unknown role: {other}"))),
        }
    }
}

/// A user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// User identifier.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// Access role.
    #[serde(default)]
    pub role: UserRole,
    /// Whether the account is active.
    #[serde(default = "default_enabled")]
    pub active: bool,
    /// Processes this user is responsible for.
    #[serde(default)]
    pub process_ids: Vec<String>,
}

/// Filter for user listings; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    /// Only users with this role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Only active or inactive users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Free-text search on username/display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}
