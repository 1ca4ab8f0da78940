// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload decoding.
//!
//! Turns raw message bytes into a structured record. Decode failures are
//! recoverable: the pipeline logs one diagnostic and moves on to the next
//! message.

use serde_json::{Map, Value};
use thiserror::Error;

/// A decoded payload: every field of the JSON document, untouched.
///
/// No schema validation happens at this layer. Unknown or missing fields
/// pass through to the store as-is.
pub type DecodedRecord = Map<String, Value>;

/// Maximum characters of payload echoed into diagnostic lines.
const PREVIEW_LIMIT: usize = 128;

/// Payload decode failure.
///
/// Carries the original bytes so the diagnostic can show what arrived.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not syntactically valid JSON.
    #[error("malformed payload ({source}): {}", preview(.payload))]
    Malformed {
        payload: Vec<u8>,
        source: serde_json::Error,
    },

    /// The payload parsed, but the top level is not a document.
    #[error("payload top level is not a document: {}", preview(.payload))]
    NotADocument { payload: Vec<u8> },
}

impl DecodeError {
    /// The original payload bytes.
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Malformed { payload, .. } => payload,
            Self::NotADocument { payload } => payload,
        }
    }
}

/// Lossy, truncated rendering of payload bytes for log lines.
fn preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    if text.chars().count() > PREVIEW_LIMIT {
        let head: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{}...", head)
    } else {
        text.into_owned()
    }
}

/// Decode raw payload bytes into a structured record.
///
/// Non-document top-level values (numbers, arrays, strings) are rejected so
/// the persistence layer always receives a field map.
pub fn decode(payload: &[u8]) -> Result<DecodedRecord, DecodeError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|source| DecodeError::Malformed {
            payload: payload.to_vec(),
            source,
        })?;

    match value {
        Value::Object(record) => Ok(record),
        _ => Err(DecodeError::NotADocument {
            payload: payload.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_passes_fields_through() {
        let record = decode(br#"{"id":"sensor-7","status":"online"}"#).expect("decode");

        assert_eq!(record.len(), 2);
        assert_eq!(record["id"], json!("sensor-7"));
        assert_eq!(record["status"], json!("online"));
    }

    #[test]
    fn test_decode_preserves_native_types() {
        let payload = br#"{"temp":21.5,"online":true,"tags":["a","b"],"meta":{"fw":3}}"#;
        let record = decode(payload).expect("decode");

        assert_eq!(record["temp"], json!(21.5));
        assert_eq!(record["online"], json!(true));
        assert_eq!(record["tags"], json!(["a", "b"]));
        assert_eq!(record["meta"], json!({"fw": 3}));
    }

    #[test]
    fn test_decode_malformed_payload() {
        let err = decode(b"not-json").expect_err("must fail");

        assert!(matches!(err, DecodeError::Malformed { .. }));
        assert_eq!(err.payload(), b"not-json");
    }

    #[test]
    fn test_decode_truncated_payload() {
        let err = decode(br#"{"temp":"#).expect_err("must fail");

        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn test_decode_non_document_top_level() {
        assert!(matches!(
            decode(b"42").expect_err("must fail"),
            DecodeError::NotADocument { .. }
        ));
        assert!(matches!(
            decode(b"[1,2,3]").expect_err("must fail"),
            DecodeError::NotADocument { .. }
        ));
    }

    #[test]
    fn test_decode_error_preview_is_truncated() {
        let long = vec![b'x'; 1024];
        let err = decode(&long).expect_err("must fail");
        let rendered = err.to_string();

        assert!(rendered.ends_with("..."));
        assert!(rendered.len() < 300);
    }
}
