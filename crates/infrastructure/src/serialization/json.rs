//! JSON encoding and decoding.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::SerializationError;

/// Writes `value` as two-space indented JSON with a trailing newline.
///
/// Struct fields keep their declaration order; `BTreeMap`s come out sorted,
/// so the same record always prints the same way.
///
/// # Errors
///
/// Returns `SerializationError::Encode` if `value` cannot be represented
/// as JSON (e.g. a map with non-string keys).
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut json = serde_json::to_string_pretty(value).map_err(SerializationError::Encode)?;
    json.push('\n');
    Ok(json)
}

/// Parses a JSON document.
///
/// # Errors
///
/// Returns `SerializationError::Json` on malformed input or a shape
/// mismatch.
pub fn from_json<T: DeserializeOwned>(input: &str) -> Result<T, SerializationError> {
    serde_json::from_str(input).map_err(SerializationError::Json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use opsdeck_domain::{ProcessConfig, UserFilter};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_parameters_print_sorted() {
        let mut process = ProcessConfig::new("billing", "Billing");
        process.set_parameter("window", "24h");
        process.set_parameter("batchSize", "500");

        let json = to_pretty_json(&process).unwrap();
        assert!(json.ends_with("}\n"));
        assert!(json.contains("\n  \"id\": \"billing\""));
        assert!(json.find("batchSize").unwrap() < json.find("window").unwrap());
        assert_eq!(from_json::<ProcessConfig>(&json).unwrap(), process);
    }

    #[test]
    fn test_unset_filter_fields_are_omitted() {
        assert_eq!(to_pretty_json(&UserFilter::default()).unwrap(), "{}\n");
    }

    #[test]
    fn test_non_string_keys_fail_to_encode() {
        let map = HashMap::from([((1, 2), "pair")]);
        assert!(matches!(
            to_pretty_json(&map),
            Err(SerializationError::Encode(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_reported() {
        let result = from_json::<ProcessConfig>(r#"{"id": 7}"#);
        assert!(matches!(result, Err(SerializationError::Json(_))));
    }
}
