// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport abstraction.
//!
//! The pipeline never talks to a broker client directly: it issues
//! subscriptions through the `Transport` trait and consumes
//! `TransportEvent`s from a channel. This keeps the pipeline constructible
//! in tests with a mock transport and a hand-fed event stream (see
//! `mqtt.rs` for the production implementation).

use anyhow::Result;

/// An inbound message as delivered by the broker.
///
/// Transient: exists only for the duration of one dispatch.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Connection lifecycle and message events emitted by a transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The broker accepted the connection. Subscriptions must be
    /// (re-)issued on every occurrence: broker session state is not
    /// assumed to survive a reconnect.
    Connected,

    /// A message was delivered on a subscribed topic.
    Message(InboundMessage),

    /// The connection failed or was lost. Terminal for the pipeline.
    ConnectionLost(String),
}

/// Abstract broker transport.
///
/// Message delivery arrives on the event channel handed to the pipeline at
/// construction; this trait only carries the operations the pipeline
/// initiates.
pub trait Transport: Send + Sync {
    /// Subscribe to a topic filter.
    fn subscribe(&self, filter: &str) -> Result<()>;
}

// ============================================================================
// Mock implementation for testing
// ============================================================================

/// Mock transport for tests: records subscriptions, delivers nothing.
///
/// Tests create the event channel themselves and feed `TransportEvent`s
/// directly to the pipeline.
#[derive(Debug, Default)]
pub struct MockTransport {
    subscriptions: std::sync::Mutex<Vec<String>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Topic filters `subscribe` has been called with, in call order.
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn subscribe(&self, filter: &str) -> Result<()> {
        self.subscriptions.lock().unwrap().push(filter.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_records_subscriptions() {
        let mock = MockTransport::new();

        mock.subscribe("announcements").unwrap();
        mock.subscribe("sensors/+/data").unwrap();

        assert_eq!(
            mock.subscriptions(),
            vec!["announcements".to_string(), "sensors/+/data".to_string()]
        );
    }
}
