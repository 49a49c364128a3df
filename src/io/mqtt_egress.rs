//! MQTT publisher for alert side effects
//!
//! Publishes alert outputs to MQTT topics for the device-side presenter:
//! - geofence/alerts/notification - Posted notifications (QoS 1)
//! - geofence/alerts/sound - Tone playback requests (QoS 0)
//! - geofence/alerts/vibration - Vibration requests (QoS 0)

use crate::infra::config::Config;
use crate::io::egress_channel::EgressMessage;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// MQTT publisher actor
///
/// Receives messages from the egress channel and publishes to MQTT topics.
pub struct AlertPublisher {
    client: AsyncClient,
    rx: mpsc::Receiver<EgressMessage>,
    notifications_topic: String,
    sound_topic: String,
    vibration_topic: String,
}

impl AlertPublisher {
    /// Create a new MQTT publisher
    ///
    /// Connects to the broker at the configured MQTT host/port.
    pub fn new(config: &Config, rx: mpsc::Receiver<EgressMessage>) -> Self {
        let client_id = format!("geofence-egress-{}", std::process::id());
        let mut mqttoptions = MqttOptions::new(client_id, config.mqtt_host(), config.mqtt_port());
        mqttoptions.set_keep_alive(Duration::from_secs(30));
        mqttoptions.set_clean_session(true);

        if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
            mqttoptions.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, 100);

        tokio::spawn(async move {
            let mut eventloop = eventloop;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("mqtt_egress_connected");
                    }
                    Ok(Event::Incoming(Packet::PubAck(_))) => {
                        debug!("mqtt_egress_puback");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt_egress_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self {
            client,
            rx,
            notifications_topic: config.egress_notifications_topic().to_string(),
            sound_topic: config.egress_sound_topic().to_string(),
            vibration_topic: config.egress_vibration_topic().to_string(),
        }
    }

    /// Run the publisher loop until shutdown, draining queued messages on the way out.
    /// Returns the number of messages handed to the MQTT client.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(
            notifications = %self.notifications_topic,
            sound = %self.sound_topic,
            vibration = %self.vibration_topic,
            "mqtt_egress_started"
        );

        let mut published = 0u64;
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        while let Ok(msg) = self.rx.try_recv() {
                            published += u64::from(self.publish_message(msg).await);
                        }
                        info!(published = %published, "mqtt_egress_shutdown");
                        return published;
                    }
                }
                msg = self.rx.recv() => {
                    match msg {
                        Some(msg) => published += u64::from(self.publish_message(msg).await),
                        None => {
                            info!(published = %published, "mqtt_egress_channel_closed");
                            return published;
                        }
                    }
                }
            }
        }
    }

    async fn publish_message(&self, msg: EgressMessage) -> bool {
        let kind = msg.kind();
        let (topic, qos, json) = match &msg {
            // At-least-once for notifications; the presenter dedupes by notification id
            EgressMessage::Notification(payload) => {
                (&self.notifications_topic, QoS::AtLeastOnce, serde_json::to_string(payload))
            }
            EgressMessage::Sound(payload) => {
                (&self.sound_topic, QoS::AtMostOnce, serde_json::to_string(payload))
            }
            EgressMessage::Vibration(payload) => {
                (&self.vibration_topic, QoS::AtMostOnce, serde_json::to_string(payload))
            }
        };

        let json = match json {
            Ok(json) => json,
            Err(e) => {
                error!(kind = %kind, error = %e, "mqtt_egress_serialize_failed");
                return false;
            }
        };

        match self.client.publish(topic, qos, false, json.into_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                error!(kind = %kind, topic = %topic, error = %e, "mqtt_egress_publish_failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertCategory, ALERT_VIBRATION};
    use crate::infra::Metrics;
    use crate::io::egress_channel::create_egress_channel;
    use crate::io::notifier::{Notification, NotificationSink};
    use crate::io::vibrator::HapticDevice;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_shutdown_drains_queued_messages() {
        let config = Config::default();
        let metrics = Arc::new(Metrics::new());
        let (sender, rx) = create_egress_channel(8, "site".to_string(), metrics);

        sender
            .post(Notification::alert("Geofence Exit Alert", "body", AlertCategory::Exit, None))
            .unwrap();
        sender.vibrate(&ALERT_VIBRATION).unwrap();

        let publisher = AlertPublisher::new(&config, rx);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        assert_eq!(publisher.run(shutdown_rx).await, 2);
    }

    #[tokio::test]
    async fn test_exits_when_senders_are_dropped() {
        let config = Config::default();
        let metrics = Arc::new(Metrics::new());
        let (sender, rx) = create_egress_channel(8, "site".to_string(), metrics);
        sender.vibrate(&ALERT_VIBRATION).unwrap();
        drop(sender);

        let publisher = AlertPublisher::new(&config, rx);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        assert_eq!(publisher.run(shutdown_rx).await, 1);
    }
}
