//! Per-request correlation identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HTTP header carrying the trace identifier.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// RPC metadata key and broker message header carrying the trace identifier.
pub const TRACE_ID_METADATA_KEY: &str = "x-trace-id";

/// Opaque correlation token propagated across transports and logs.
///
/// Callers may supply any non-blank string; when none is supplied a UUID v4
/// is generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Generates a fresh trace identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Uses the supplied value when present and non-blank, otherwise generates one.
    pub fn from_optional(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self::generate(),
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TraceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TraceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for TraceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplied_value_is_kept() {
        let id = TraceId::from_optional(Some("abc-123"));
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn blank_or_missing_value_generates_uuid() {
        for input in [None, Some(""), Some("   ")] {
            let id = TraceId::from_optional(input);
            assert!(Uuid::parse_str(id.as_str()).is_ok());
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(TraceId::generate(), TraceId::generate());
    }
}
