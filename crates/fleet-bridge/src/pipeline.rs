// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message ingestion and dispatch pipeline.
//!
//! Consumes transport events, decodes and classifies each message, and
//! hands it to the persistence router. Each message is processed
//! independently: a malformed payload or a failed write never stops the
//! loop and never touches sibling messages.
//!
//! # Operation
//!
//! 1. On a connect event, (re-)issue the fixed subscription set
//! 2. On a message, decode the payload, classify the topic, route
//! 3. Store writes run as spawned tasks; delivery is never blocked
//! 4. On a transport error, fault and return (the process exits non-zero)

use crate::classifier::{MessageKind, TopicClassifier, SUBSCRIPTION_FILTERS};
use crate::decoder;
use crate::router::{PersistenceOutcome, PersistenceRouter};
use crate::store::DocumentStore;
use crate::transport::{InboundMessage, Transport, TransportEvent};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Pipeline lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No connection attempt yet.
    Disconnected,
    /// Transport configured, waiting for the broker to accept.
    Connecting,
    /// Connected with subscriptions issued; the message loop is live.
    Subscribed,
    /// Transport failed. Terminal: the process exits rather than retrying
    /// against a misconfigured broker or TLS setup.
    Faulted,
}

/// Pipeline counters.
///
/// Atomic so spawned store writes can report outcomes without locks.
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Messages delivered by the transport.
    pub messages_received: AtomicU64,
    /// Announcements written to the store.
    pub announcements_stored: AtomicU64,
    /// Readings written to the store.
    pub readings_stored: AtomicU64,
    /// Payloads that failed to decode.
    pub decode_failures: AtomicU64,
    /// Messages dropped because no topic rule matched.
    pub unrecognized: AtomicU64,
    /// Store writes that failed.
    pub store_errors: AtomicU64,
}

impl PipelineStats {
    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            announcements_stored: self.announcements_stored.load(Ordering::Relaxed),
            readings_stored: self.readings_stored.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value copy of `PipelineStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub messages_received: u64,
    pub announcements_stored: u64,
    pub readings_stored: u64,
    pub decode_failures: u64,
    pub unrecognized: u64,
    pub store_errors: u64,
}

/// The bridge pipeline.
///
/// Generic over the store and transport so tests construct it with the
/// in-memory store and the mock transport (dependency injection; there is
/// no process-wide connection state).
pub struct BridgePipeline<S, T> {
    classifier: TopicClassifier,
    router: PersistenceRouter<S>,
    transport: Arc<T>,
    events: mpsc::Receiver<TransportEvent>,
    state: LifecycleState,
    stats: Arc<PipelineStats>,
}

impl<S, T> BridgePipeline<S, T>
where
    S: DocumentStore + 'static,
    T: Transport,
{
    /// Create a pipeline over an injected store, transport, and event
    /// stream.
    pub fn new(store: Arc<S>, transport: Arc<T>, events: mpsc::Receiver<TransportEvent>) -> Self {
        Self {
            classifier: TopicClassifier::new(),
            router: PersistenceRouter::new(store),
            transport,
            events,
            state: LifecycleState::Disconnected,
            stats: Arc::new(PipelineStats::default()),
        }
    }

    /// Shared handle to the pipeline counters.
    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run the dispatch loop until the transport closes or faults.
    ///
    /// Returns `Ok(())` when the event channel closes (orderly shutdown)
    /// and an error when the transport reports a connection failure --
    /// per-message failures never escape this loop.
    pub async fn run(mut self) -> Result<()> {
        self.state = LifecycleState::Connecting;
        tracing::info!("Bridge pipeline started");

        while let Some(event) = self.events.recv().await {
            match event {
                TransportEvent::Connected => {
                    if let Err(e) = self.handle_connected() {
                        self.state = LifecycleState::Faulted;
                        return Err(e);
                    }
                }
                TransportEvent::Message(message) => self.dispatch(message),
                TransportEvent::ConnectionLost(reason) => {
                    self.state = LifecycleState::Faulted;
                    tracing::error!("Transport connection lost: {}", reason);
                    bail!("transport connection lost: {}", reason);
                }
            }
        }

        tracing::info!("Transport closed, pipeline stopping");
        Ok(())
    }

    /// (Re-)issue the fixed subscription set.
    ///
    /// Runs on every connect event: broker session state is not assumed to
    /// survive a reconnect.
    fn handle_connected(&mut self) -> Result<()> {
        tracing::info!("Connected to MQTT broker");

        for filter in SUBSCRIPTION_FILTERS {
            self.transport.subscribe(filter)?;
            tracing::info!("Subscribed to {}", filter);
        }

        self.state = LifecycleState::Subscribed;
        Ok(())
    }

    /// Dispatch one inbound message: decode, classify, route.
    ///
    /// The store write runs in a spawned task so delivery of the next
    /// message never waits on persistence; completions may land out of
    /// order relative to delivery order.
    fn dispatch(&mut self, message: InboundMessage) {
        self.stats.messages_received.fetch_add(1, Ordering::Relaxed);

        let record = match decoder::decode(&message.payload) {
            Ok(record) => record,
            Err(e) => {
                self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Dropping message on {}: {}", message.topic, e);
                return;
            }
        };

        let kind = self.classifier.classify(&message.topic);
        let router = self.router.clone();
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            let outcome = router.route(kind, &message.topic, &record);
            report(&stats, &outcome);
        });
    }
}

/// Log one outcome line and bump the matching counter.
fn report(stats: &PipelineStats, outcome: &PersistenceOutcome) {
    match (outcome.kind, outcome.success) {
        (MessageKind::Unrecognized, _) => {
            stats.unrecognized.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Dropping message on unrecognized topic {}", outcome.topic);
        }
        (MessageKind::Announcement, true) => {
            stats.announcements_stored.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Wrote announcement from {}", outcome.topic);
        }
        (MessageKind::Reading, true) => {
            stats.readings_stored.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Wrote reading from {}", outcome.topic);
        }
        (kind, false) => {
            stats.store_errors.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                "Failed to persist {} from {}: {}",
                kind.label(),
                outcome.topic,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
