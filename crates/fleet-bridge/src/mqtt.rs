// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MQTT transport adapter.
//!
//! Wraps the rumqttc client behind the `Transport` trait. Connection
//! options (including TLS material read from disk) come from `MqttConfig`;
//! a spawned pump task translates client events into `TransportEvent`s for
//! the pipeline.

use crate::config::{MqttConfig, TlsConfig};
use crate::transport::{InboundMessage, Transport, TransportEvent};
use anyhow::{Context, Result};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration};
use std::time::Duration;
use tokio::sync::mpsc;

/// Capacity of the client request queue and the pipeline event channel.
const CHANNEL_CAPACITY: usize = 128;

/// rumqttc-backed broker transport.
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    /// Set up the broker connection described by `config`.
    ///
    /// Returns the transport handle and the event stream for the pipeline.
    /// TLS material is read from disk here, so unreadable files surface as
    /// a fatal error before the pipeline starts. The connection itself is
    /// established by the pump task; its outcome arrives as either a
    /// `Connected` or a `ConnectionLost` event.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(config: &MqttConfig) -> Result<(Self, mpsc::Receiver<TransportEvent>)> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        if let Some(tls) = &config.tls {
            options.set_transport(rumqttc::Transport::Tls(load_tls(tls)?));
        }

        let (client, mut event_loop) = AsyncClient::new(options, CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        if tx.send(TransportEvent::Connected).await.is_err() {
                            break;
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = InboundMessage {
                            topic: publish.topic,
                            payload: publish.payload.to_vec(),
                        };
                        if tx.send(TransportEvent::Message(message)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Connect failures and post-subscribe drops share
                        // the fatal path: the pipeline faults and the
                        // process exits instead of retrying blind.
                        let _ = tx
                            .send(TransportEvent::ConnectionLost(e.to_string()))
                            .await;
                        break;
                    }
                }
            }
        });

        Ok((Self { client }, rx))
    }
}

impl Transport for MqttTransport {
    fn subscribe(&self, filter: &str) -> Result<()> {
        self.client
            .try_subscribe(filter, QoS::AtMostOnce)
            .with_context(|| format!("Failed to subscribe to {}", filter))?;
        Ok(())
    }
}

/// Read CA, client certificate, and client key from the configured paths.
fn load_tls(tls: &TlsConfig) -> Result<TlsConfiguration> {
    let ca = std::fs::read(&tls.ca)
        .with_context(|| format!("Unable to read CA certificate {}", tls.ca.display()))?;
    let cert = std::fs::read(&tls.cert)
        .with_context(|| format!("Unable to read client certificate {}", tls.cert.display()))?;
    let key = std::fs::read(&tls.key)
        .with_context(|| format!("Unable to read client key {}", tls.key.display()))?;

    Ok(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth: Some((cert, key)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_load_tls_missing_files() {
        let tls = TlsConfig {
            ca: PathBuf::from("/nonexistent/ca.crt"),
            cert: PathBuf::from("/nonexistent/client.crt"),
            key: PathBuf::from("/nonexistent/client.key"),
        };

        let err = load_tls(&tls).expect_err("must fail");
        assert!(err.to_string().contains("CA certificate"));
    }

    #[test]
    fn test_load_tls_reads_material() {
        let dir = tempfile::tempdir().unwrap();

        let write = |name: &str, content: &str| -> PathBuf {
            let path = dir.path().join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(content.as_bytes()).unwrap();
            path
        };

        let tls = TlsConfig {
            ca: write("ca.crt", "ca-pem"),
            cert: write("client.crt", "cert-pem"),
            key: write("client.key", "key-pem"),
        };

        match load_tls(&tls).expect("load") {
            TlsConfiguration::Simple {
                ca, client_auth, ..
            } => {
                assert_eq!(ca, b"ca-pem");
                let (cert, key) = client_auth.expect("client auth");
                assert_eq!(cert, b"cert-pem");
                assert_eq!(key, b"key-pem");
            }
            other => panic!("expected Simple TLS config, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_broker_reports_connection_lost() {
        // Port 1 is never an MQTT broker; the pump task must surface the
        // failure as a ConnectionLost event rather than retrying.
        let config = Config::builder().host("127.0.0.1").port(1).build();

        let (_transport, mut events) = MqttTransport::connect(&config.mqtt).expect("setup");

        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("event before timeout")
            .expect("channel open");

        match event {
            TransportEvent::ConnectionLost(_) => {}
            other => panic!("expected ConnectionLost, got: {:?}", other),
        }
    }
}
