// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fleet Bridge
//!
//! Bridges MQTT telemetry from edge sensor fleets into a document store.
//!
//! # Features
//!
//! - **Topic classification** -- fixed, ordered rules map topics to
//!   announcements and readings
//! - **Per-message error isolation** -- a malformed payload or failed
//!   write never stops the pipeline
//! - **SQLite backend** -- schema-flexible JSON documents, zero external
//!   services
//! - **TLS client auth** -- mutual TLS against the broker from configured
//!   PEM material
//!
//! # Architecture
//!
//! ```text
//! BridgePipeline
//! +-- Transport          (MQTT subscriptions, lifecycle events)
//! +-- decoder            (raw JSON payload -> DecodedRecord)
//! +-- TopicClassifier    (topic -> MessageKind)
//! +-- PersistenceRouter  (MessageKind -> store operation)
//! +-- DocumentStore      (SQLite backend)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fleet_bridge::{BridgePipeline, Config, MqttTransport, SqliteStore};
//! use std::sync::Arc;
//!
//! let config = Config::from_file("bridge.yaml".as_ref())?;
//! let store = Arc::new(SqliteStore::new(&config.database.path)?);
//! let (transport, events) = MqttTransport::connect(&config.mqtt)?;
//!
//! let pipeline = BridgePipeline::new(store, Arc::new(transport), events);
//! pipeline.run().await?;
//! ```

pub mod classifier;
pub mod config;
pub mod decoder;
pub mod mqtt;
pub mod pipeline;
pub mod router;
pub mod sqlite;
pub mod store;
pub mod transport;

pub use classifier::{MessageKind, TopicClassifier, SUBSCRIPTION_FILTERS};
pub use config::{Config, ConfigError};
pub use decoder::{decode, DecodeError, DecodedRecord};
pub use mqtt::MqttTransport;
pub use pipeline::{BridgePipeline, LifecycleState, PipelineStats, StatsSnapshot};
pub use router::{PersistenceOutcome, PersistenceRouter};
pub use sqlite::SqliteStore;
pub use store::{DocumentStore, StoredDocument};
pub use transport::{InboundMessage, MockTransport, Transport, TransportEvent};
