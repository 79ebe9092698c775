//! Notification envelope parsing.
//!
//! The queue delivers an SNS-style envelope whose `Message` field is a
//! stringified payload of object-store records:
//!
//! ```json
//! {"Message": "{\"Records\":[{\"s3\":{\"object\":{\"key\":\"...\"}},\"bookmark\":\"...\"}]}"}
//! ```
//!
//! The object key is the hyphenless path form of the concept uuid
//! (`8/4/4/4/12` hex segments); replacing the separators with hyphens
//! yields the uuid the pipeline works with.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

static KEY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn key_pattern() -> &'static Regex {
    KEY_PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{8}/[0-9a-f]{4}/[0-9a-f]{4}/[0-9a-f]{4}/[0-9a-f]{12}$")
            .expect("invalid key pattern")
    })
}

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Undecodable notification body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Notification contains no records")]
    NoRecords,

    #[error("Object key is not a concept uuid path: {0}")]
    InvalidKey(String),
}

#[derive(serde::Deserialize)]
struct Envelope {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(serde::Deserialize)]
struct Payload {
    #[serde(rename = "Records", default)]
    records: Vec<Record>,
}

#[derive(serde::Deserialize)]
struct Record {
    s3: S3Entity,
    #[serde(default)]
    bookmark: String,
}

#[derive(serde::Deserialize)]
struct S3Entity {
    object: S3Object,
}

#[derive(serde::Deserialize)]
struct S3Object {
    key: String,
}

/// A decoded notification before the queue receipt handle is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNotification {
    pub uuid: String,
    pub bookmark: String,
}

/// Decode a raw queue message body into a concept notification.
pub fn parse_notification(body: &str) -> Result<ParsedNotification, EnvelopeError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let payload: Payload = serde_json::from_str(&envelope.message)?;

    let record = payload.records.into_iter().next().ok_or(EnvelopeError::NoRecords)?;

    let key = record.s3.object.key;
    if !key_pattern().is_match(&key) {
        return Err(EnvelopeError::InvalidKey(key));
    }

    Ok(ParsedNotification {
        uuid: key.replace('/', "-"),
        bookmark: record.bookmark,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_with_key(key: &str, bookmark: &str) -> String {
        let inner = serde_json::json!({
            "Records": [{"s3": {"object": {"key": key}}, "bookmark": bookmark}]
        });
        serde_json::json!({"Message": inner.to_string()}).to_string()
    }

    #[test]
    fn valid_key_becomes_hyphenated_uuid() {
        let body = envelope_with_key("28090964/9997/4bc2/9638/7a11135aaff9", "bm-1");
        let parsed = parse_notification(&body).unwrap();
        assert_eq!(parsed.uuid, "28090964-9997-4bc2-9638-7a11135aaff9");
        assert_eq!(parsed.bookmark, "bm-1");
    }

    #[test]
    fn missing_bookmark_defaults_to_empty() {
        let inner = serde_json::json!({
            "Records": [{"s3": {"object": {"key": "28090964/9997/4bc2/9638/7a11135aaff9"}}}]
        });
        let body = serde_json::json!({"Message": inner.to_string()}).to_string();
        let parsed = parse_notification(&body).unwrap();
        assert_eq!(parsed.bookmark, "");
    }

    #[test]
    fn undecodable_body_rejected() {
        assert!(matches!(
            parse_notification("not json"),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn stringified_inner_payload_must_be_json() {
        let body = serde_json::json!({"Message": "not json either"}).to_string();
        assert!(matches!(
            parse_notification(&body),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn empty_record_list_rejected() {
        let body = serde_json::json!({"Message": "{\"Records\":[]}"}).to_string();
        assert!(matches!(
            parse_notification(&body),
            Err(EnvelopeError::NoRecords)
        ));
    }

    #[test]
    fn non_uuid_keys_rejected() {
        for key in [
            "somefile.json",
            "28090964-9997-4bc2-9638-7a11135aaff9",
            "28090964/9997/4bc2/9638",
            "28090964/9997/4bc2/9638/7a11135aaff9/extra",
            "2809096Z/9997/4bc2/9638/7a11135aaff9",
        ] {
            let body = envelope_with_key(key, "");
            assert!(
                matches!(parse_notification(&body), Err(EnvelopeError::InvalidKey(_))),
                "key {key} should be rejected"
            );
        }
    }
}
