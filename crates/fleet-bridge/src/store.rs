// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Document store abstraction.
//!
//! Backend-agnostic interface with one persistence operation per message
//! kind, plus the inspection surface used by the CLI and tests.

use crate::decoder::DecodedRecord;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A persisted document with its reception metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The decoded fields, as stored.
    pub document: serde_json::Value,

    /// Reception timestamp (Unix nanoseconds).
    pub received_at_ns: u64,
}

/// Document store trait.
///
/// Writes are best-effort and at-most-once: a failed write is reported to
/// the caller and never retried by the store.
///
/// # Implementations
///
/// - `SqliteStore` -- default backend, schema-flexible JSON rows
pub trait DocumentStore: Send + Sync {
    /// Persist a device announcement.
    fn persist_announcement(&self, record: &DecodedRecord) -> Result<()>;

    /// Persist a sensor reading.
    fn persist_reading(&self, record: &DecodedRecord) -> Result<()>;

    /// Load all stored announcements, oldest first.
    fn announcements(&self) -> Result<Vec<StoredDocument>>;

    /// Load all stored readings, oldest first.
    fn readings(&self) -> Result<Vec<StoredDocument>>;

    /// Total number of stored documents across both kinds.
    fn count(&self) -> Result<usize>;

    /// Remove every stored document.
    fn clear(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stored_document_serialization() {
        let doc = StoredDocument {
            document: json!({"id": "sensor-7", "status": "online"}),
            received_at_ns: 1234567890,
        };

        let encoded = serde_json::to_string(&doc).unwrap();
        let decoded: StoredDocument = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.document["id"], json!("sensor-7"));
        assert_eq!(decoded.received_at_ns, 1234567890);
    }
}
