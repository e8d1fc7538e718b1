//! SMS body extraction from raw or JSON request payloads

use serde_json::Value;
use serde_json_path::JsonPath;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    #[error("Request body is not valid UTF-8")]
    NotUtf8,

    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid JSON path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("JSON path '{0}' matched nothing")]
    NoMatch(String),
}

/// Anchor a path at the document root when it is written relative to it
fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('$') {
        path.to_string()
    } else if path.starts_with('[') {
        format!("${}", path)
    } else {
        format!("$.{}", path)
    }
}

/// Extract the message body
///
/// Without a path the raw payload is the body. With a path the payload is
/// parsed as JSON and the first match is used: strings verbatim, any other
/// value as its JSON text.
pub fn extract_body(raw: &[u8], path: Option<&str>) -> Result<String, BodyError> {
    let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
        return String::from_utf8(raw.to_vec()).map_err(|_| BodyError::NotUtf8);
    };

    let document: Value =
        serde_json::from_slice(raw).map_err(|e| BodyError::InvalidJson(e.to_string()))?;

    let normalized = normalize_path(path);
    let query = JsonPath::parse(&normalized).map_err(|e| BodyError::InvalidPath {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let matches = query.query(&document).all();
    match matches.first() {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(BodyError::NoMatch(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_body() {
        assert_eq!(extract_body("héllo".as_bytes(), None), Ok("héllo".to_string()));
        assert_eq!(extract_body(&[0xc3, 0x28], None), Err(BodyError::NotUtf8));
    }

    #[test]
    fn test_empty_path_means_raw() {
        assert_eq!(extract_body(b"{\"a\":1}", Some("")), Ok("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_json_path_string() {
        let payload = br#"{"alert": {"title": "Disk full", "host": "nas"}}"#;
        assert_eq!(
            extract_body(payload, Some("$.alert.title")),
            Ok("Disk full".to_string())
        );
        // Relative form
        assert_eq!(extract_body(payload, Some("alert.host")), Ok("nas".to_string()));
    }

    #[test]
    fn test_json_path_first_match_and_non_string() {
        let payload = br#"{"items": [{"n": 1}, {"n": 2}]}"#;
        assert_eq!(extract_body(payload, Some("$.items[*].n")), Ok("1".to_string()));
        assert_eq!(extract_body(payload, Some("items[1]")), Ok("{\"n\":2}".to_string()));
    }

    #[test]
    fn test_json_path_errors() {
        assert!(matches!(
            extract_body(b"not json", Some("$.a")),
            Err(BodyError::InvalidJson(_))
        ));
        assert_eq!(
            extract_body(b"{\"a\": 1}", Some("$.b")),
            Err(BodyError::NoMatch("$.b".to_string()))
        );
        assert!(matches!(
            extract_body(b"{\"a\": 1}", Some("$[?")),
            Err(BodyError::InvalidPath { .. })
        ));
    }
}
