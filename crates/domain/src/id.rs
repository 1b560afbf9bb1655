//! Request correlation ids.

use uuid::Uuid;

/// Returns a fresh UUID v7 in hyphenated form.
///
/// Sent as the request id and idempotency key of API calls. Job ids are
/// never generated locally; the service assigns them.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}
