//! Decision ID generation for log correlation.

use uuid::Uuid;

/// Response header carrying the decision ID back to HTTP callers.
pub const DECISION_ID_HEADER: &str = "x-redir-decision-id";

/// Generate a new decision ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
