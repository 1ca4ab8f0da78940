// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Persistence routing.
//!
//! Given a classified message and its decoded record, invokes the store
//! operation for the kind and reports the outcome. No retry: a failed
//! write is surfaced as a diagnostic and never touches other messages.

use crate::classifier::MessageKind;
use crate::decoder::DecodedRecord;
use crate::store::DocumentStore;
use std::sync::Arc;

/// Outcome of routing one message.
///
/// Ephemeral, used only for reporting. Every routed message produces
/// exactly one of these.
#[derive(Debug, Clone)]
pub struct PersistenceOutcome {
    /// Kind the message was classified as.
    pub kind: MessageKind,
    /// Topic the message arrived on.
    pub topic: String,
    /// Whether the store operation (if any) succeeded.
    pub success: bool,
    /// Store error detail, when the write failed.
    pub error: Option<String>,
}

/// Routes decoded records to the store operation for their kind.
pub struct PersistenceRouter<S> {
    store: Arc<S>,
}

impl<S> Clone for PersistenceRouter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> PersistenceRouter<S> {
    /// Create a router over an injected store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Route one message.
    ///
    /// Exactly one store write is attempted for Announcement/Reading
    /// kinds. Unrecognized is a terminal no-write branch, not an error.
    pub fn route(
        &self,
        kind: MessageKind,
        topic: &str,
        record: &DecodedRecord,
    ) -> PersistenceOutcome {
        let result = match kind {
            MessageKind::Announcement => self.store.persist_announcement(record),
            MessageKind::Reading => self.store.persist_reading(record),
            MessageKind::Unrecognized => {
                return PersistenceOutcome {
                    kind,
                    topic: topic.to_string(),
                    success: true,
                    error: None,
                };
            }
        };

        match result {
            Ok(()) => PersistenceOutcome {
                kind,
                topic: topic.to_string(),
                success: true,
                error: None,
            },
            Err(e) => PersistenceOutcome {
                kind,
                topic: topic.to_string(),
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteStore;
    use crate::store::StoredDocument;
    use anyhow::{anyhow, Result};
    use serde_json::json;

    fn record(value: serde_json::Value) -> DecodedRecord {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got: {}", other),
        }
    }

    #[test]
    fn test_route_announcement_writes_once() {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let router = PersistenceRouter::new(Arc::clone(&store));

        let outcome = router.route(
            MessageKind::Announcement,
            "announcements",
            &record(json!({"id": "sensor-7"})),
        );

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(store.announcements().unwrap().len(), 1);
        assert!(store.readings().unwrap().is_empty());
    }

    #[test]
    fn test_route_reading_writes_once() {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let router = PersistenceRouter::new(Arc::clone(&store));

        let outcome = router.route(
            MessageKind::Reading,
            "sensors/abc123/data",
            &record(json!({"temp": 21.5})),
        );

        assert!(outcome.success);
        assert_eq!(store.readings().unwrap().len(), 1);
        assert!(store.announcements().unwrap().is_empty());
    }

    #[test]
    fn test_route_unrecognized_never_writes() {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let router = PersistenceRouter::new(Arc::clone(&store));

        let outcome = router.route(
            MessageKind::Unrecognized,
            "other/topic",
            &record(json!({"x": 1})),
        );

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(store.count().unwrap(), 0);
    }

    /// Store whose reading path always fails, for error isolation tests.
    struct FailingReadingStore {
        inner: SqliteStore,
    }

    impl DocumentStore for FailingReadingStore {
        fn persist_announcement(&self, record: &DecodedRecord) -> Result<()> {
            self.inner.persist_announcement(record)
        }

        fn persist_reading(&self, _record: &DecodedRecord) -> Result<()> {
            Err(anyhow!("disk full"))
        }

        fn announcements(&self) -> Result<Vec<StoredDocument>> {
            self.inner.announcements()
        }

        fn readings(&self) -> Result<Vec<StoredDocument>> {
            self.inner.readings()
        }

        fn count(&self) -> Result<usize> {
            self.inner.count()
        }

        fn clear(&self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_route_failure_is_reported_not_propagated() {
        let store = Arc::new(FailingReadingStore {
            inner: SqliteStore::new_in_memory().unwrap(),
        });
        let router = PersistenceRouter::new(Arc::clone(&store));

        let failed = router.route(
            MessageKind::Reading,
            "sensors/abc123/data",
            &record(json!({"temp": 21.5})),
        );
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("disk full"));

        // A failed write has no effect on the next message.
        let ok = router.route(
            MessageKind::Announcement,
            "announcements",
            &record(json!({"id": "sensor-7"})),
        );
        assert!(ok.success);
        assert_eq!(store.announcements().unwrap().len(), 1);
    }
}
