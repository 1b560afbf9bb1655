//! YAML decoding.

use serde::de::DeserializeOwned;

use super::SerializationError;

/// Deserializes YAML from a string.
///
/// # Errors
///
/// Returns an error if the YAML is invalid or doesn't match the expected type.
pub fn from_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, SerializationError> {
    Ok(serde_yaml::from_str(yaml)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_from_yaml() {
        let parsed: BTreeMap<String, u32> = from_yaml("retries: 3\ninterval: 5\n").unwrap();
        assert_eq!(parsed["retries"], 3);
    }

    #[test]
    fn test_invalid_yaml_reported() {
        let result: Result<BTreeMap<String, u32>, _> = from_yaml("retries: [unclosed");
        assert!(matches!(result, Err(SerializationError::Yaml(_))));
    }
}
