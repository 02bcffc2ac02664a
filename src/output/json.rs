//! JSON output formatting

use chrono::Utc;
use serde::Serialize;

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// When the output was produced (RFC 3339)
    pub timestamp: String,

    /// cxmgmt version
    pub version: String,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Format data as pretty-printed JSON inside a [`JsonOutput`] envelope
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserKey;

    #[test]
    fn test_envelope_carries_version() {
        let output = JsonOutput::new(vec!["/CxServer"]);
        assert_eq!(output.meta.version, env!("CARGO_PKG_VERSION"));
        assert!(!output.meta.timestamp.is_empty());
    }

    #[test]
    fn test_format_json_user_keys() {
        let keys = vec![UserKey::new("Alice", "Application")];
        let value: serde_json::Value = serde_json::from_str(&format_json(&keys).unwrap()).unwrap();
        assert_eq!(value["data"][0]["username"], "alice");
        assert_eq!(value["data"][0]["provider"], "Application");
        assert!(value["meta"]["timestamp"].is_string());
    }
}
