//! Deployment environment definition

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Placeholder substituted with the environment's region tag.
const REGION_PLACEHOLDER: &str = "{region}";

/// Placeholder substituted with the environment identifier.
const ID_PLACEHOLDER: &str = "{id}";

/// A named deployment target with its own API base URL.
///
/// Environments are defined once at start-up and never change afterwards;
/// only the registry's "active" pointer moves between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Stable identifier used for selection (e.g. `staging-eu`).
    pub id: String,

    /// Display label.
    pub label: String,

    /// Base URL template. May contain `{region}` and `{id}` placeholders.
    #[serde(alias = "baseUrlTemplate")]
    pub base_url: String,

    /// Region tag (e.g. `eu-west-1`).
    #[serde(default)]
    pub region: String,
}

impl Environment {
    /// Creates a new environment.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        base_url: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            base_url: base_url.into(),
            region: region.into(),
        }
    }

    /// Derives the API base URL from the template.
    ///
    /// Placeholders are substituted and trailing slashes removed, so paths
    /// starting with `/` can be appended directly.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        let url = self
            .base_url
            .trim()
            .replace(REGION_PLACEHOLDER, &self.region)
            .replace(ID_PLACEHOLDER, &self.id);
        url.trim_end_matches('/').to_string()
    }

    /// Checks the identifier and the derived base URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` for a blank id and `InvalidUrl` when the
    /// derived base URL is not an absolute http(s) URL.
    pub fn validate(&self) -> DomainResult<()> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InvalidIdentifier(
                "environment id must not be empty".to_string(),
            ));
        }

        let base = self.api_base_url();
        let parsed =
            Url::parse(&base).map_err(|e| DomainError::InvalidUrl(format!("{base}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl(format!(
                "{base}: scheme must be http or https"
            )));
        }
        if base.contains('{') {
            return Err(DomainError::InvalidUrl(format!(
                "{base}: unresolved placeholder"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_url_substitutes_region() {
        let env = Environment::new(
            "prod-eu",
            "Production EU",
            "https://api.{region}.example.com/v1/",
            "eu-west-1",
        );
        assert_eq!(env.api_base_url(), "https://api.eu-west-1.example.com/v1");
    }

    #[test]
    fn test_base_url_substitutes_id() {
        let env = Environment::new("dev", "Dev", "https://{id}.internal/api", "");
        assert_eq!(env.api_base_url(), "https://dev.internal/api");
    }

    #[test]
    fn test_validate_accepts_plain_url() {
        let env = Environment::new("local", "Local", "http://localhost:8080", "local");
        assert!(env.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let env = Environment::new("  ", "Blank", "http://localhost:8080", "");
        assert!(matches!(
            env.validate(),
            Err(DomainError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let env = Environment::new("ftp", "FTP", "ftp://files.example.com", "");
        assert!(matches!(env.validate(), Err(DomainError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_placeholder() {
        let env = Environment::new("x", "X", "https://{tenant}.example.com", "eu");
        assert!(matches!(env.validate(), Err(DomainError::InvalidUrl(_))));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "id": "stg",
            "label": "Staging",
            "baseUrl": "https://stg.example.com",
            "region": "us"
        }"#;
        let env: Environment = serde_json::from_str(json).expect("valid environment json");
        assert_eq!(env.id, "stg");
        assert_eq!(env.base_url, "https://stg.example.com");
    }
}
