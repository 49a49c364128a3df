//! MQTT client for receiving transition events from the location-monitoring subsystem

use crate::domain::TransitionEvent;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Event as handed to the transition worker
#[derive(Debug)]
pub struct InboundEvent {
    /// `None` when the payload could not be decoded into an event
    pub event: Option<TransitionEvent>,
    pub received_at: Instant,
}

/// Start the MQTT client and send decoded events to the worker channel
///
/// Events are sent via try_send to avoid blocking the MQTT eventloop.
/// Dropped events are counted in metrics and logged (rate-limited).
pub async fn start_mqtt_client(
    config: &Config,
    event_tx: mpsc::Sender<InboundEvent>,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client_id = format!("geofence-ingest-{}", std::process::id());
    let mut mqttoptions = MqttOptions::new(client_id, config.mqtt_host(), config.mqtt_port());
    mqttoptions.set_keep_alive(Duration::from_secs(30));

    // Set credentials if configured
    if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
        mqttoptions.set_credentials(username, password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 100);
    client.subscribe(config.mqtt_topic(), QoS::AtLeastOnce).await?;

    info!(topic = %config.mqtt_topic(), host = %config.mqtt_host(), port = %config.mqtt_port(), "mqtt_subscribed");

    // Rate-limit drop warnings to 1 per second
    let mut last_drop_warn = Instant::now() - Duration::from_secs(2);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("mqtt_shutdown");
                    return Ok(());
                }
            }
            result = eventloop.poll() => {
                match result {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let received_at = Instant::now();
                        let events = match std::str::from_utf8(&publish.payload) {
                            Ok(json_str) => parse_transition_payload(json_str),
                            Err(e) => {
                                warn!(topic = %publish.topic, error = %e, "mqtt_payload_invalid_utf8");
                                vec![None]
                            }
                        };

                        for event in events {
                            match event_tx.try_send(InboundEvent { event, received_at }) {
                                Ok(()) => {}
                                Err(TrySendError::Full(_)) => {
                                    metrics.record_ingest_dropped();
                                    if last_drop_warn.elapsed() > Duration::from_secs(1) {
                                        warn!("transition_event_dropped: channel full");
                                        last_drop_warn = Instant::now();
                                    }
                                }
                                Err(TrySendError::Closed(_)) => {
                                    warn!("transition_channel_closed");
                                    return Ok(());
                                }
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("mqtt_connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "mqtt_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }
}

/// Decode a payload holding one event object or an array of them.
///
/// Undecodable input yields `None` entries so the handler still sees (and logs) them.
pub fn parse_transition_payload(json_str: &str) -> Vec<Option<TransitionEvent>> {
    let value: Value = match serde_json::from_str(json_str) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "transition_payload_unparseable");
            return vec![None];
        }
    };

    let items = match value {
        Value::Array(items) => items,
        single => vec![single],
    };

    items
        .into_iter()
        .map(|item| match serde_json::from_value::<TransitionEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(error = %e, "transition_event_undecodable");
                None
            }
        })
        .collect()
}
