//! User record model
//!
//! The orchestrator treats user records as immutable facts handed to it by
//! an external user/credential provider (out of scope for this crate: no
//! login, no password reset, no profile management here).

use serde::{Deserialize, Serialize};

/// A DJ/streamer account, as resolved from a stream-key by the external
/// user provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable integer identifier; this is what gets persisted in the
    /// queue snapshot (stream-keys are not persisted directly).
    pub id: i64,
    /// Opaque short string, charset `[A-Za-z0-9_-]+`.
    pub stream_key: String,
    pub display_name: String,
    pub timezone: String,
}

/// Charset allowed in a stream-key: `[A-Za-z0-9_-]+`.
pub fn is_valid_stream_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_keys() {
        assert!(is_valid_stream_key("dj_Anna-01"));
        assert!(is_valid_stream_key("A"));
    }

    #[test]
    fn rejects_invalid_keys() {
        assert!(!is_valid_stream_key(""));
        assert!(!is_valid_stream_key("has space"));
        assert!(!is_valid_stream_key("slash/key"));
        assert!(!is_valid_stream_key("emoji🎧"));
    }
}
