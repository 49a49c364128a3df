//! Typed channel for MQTT egress messages
//!
//! Provides a non-blocking way to hand alert side effects to the MQTT publisher.
//! Uses bounded mpsc channels to prevent unbounded memory growth.

use crate::domain::alert::epoch_ms;
use crate::domain::VibrationPattern;
use crate::infra::Metrics;
use crate::io::channels::{ChannelError, ChannelResult};
use crate::io::notifier::{Notification, NotificationSink};
use crate::io::sound::{ToneOutput, ToneRequest};
use crate::io::vibrator::HapticDevice;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Messages that can be sent to the MQTT publisher
#[derive(Debug)]
pub enum EgressMessage {
    Notification(NotificationPayload),
    Sound(SoundPayload),
    Vibration(VibrationPayload),
}

impl EgressMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            EgressMessage::Notification(_) => "notification",
            EgressMessage::Sound(_) => "sound",
            EgressMessage::Vibration(_) => "vibration",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    /// Site identifier
    pub site: String,
    /// Timestamp (epoch ms)
    pub ts: u64,
    #[serde(flatten)]
    pub notification: Notification,
}

#[derive(Debug, Clone, Serialize)]
pub struct SoundPayload {
    pub site: String,
    pub ts: u64,
    #[serde(flatten)]
    pub request: ToneRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct VibrationPayload {
    pub site: String,
    pub ts: u64,
    #[serde(flatten)]
    pub pattern: VibrationPattern,
}

/// Sender handle for egress messages
///
/// Clone this to share across the alert channels.
/// Non-blocking - if the channel is full, messages are dropped and counted.
#[derive(Clone)]
pub struct EgressSender {
    tx: mpsc::Sender<EgressMessage>,
    site_id: String,
    metrics: Arc<Metrics>,
}

impl EgressSender {
    pub fn new(tx: mpsc::Sender<EgressMessage>, site_id: String, metrics: Arc<Metrics>) -> Self {
        Self { tx, site_id, metrics }
    }

    fn send(&self, msg: EgressMessage) -> ChannelResult<()> {
        let kind = msg.kind();
        match self.tx.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.metrics.record_egress_dropped();
                warn!(kind = %kind, "egress_channel_full_dropping");
                Err(ChannelError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(ChannelError::TransportClosed),
        }
    }
}

impl NotificationSink for EgressSender {
    fn post(&self, notification: Notification) -> ChannelResult<()> {
        self.send(EgressMessage::Notification(NotificationPayload {
            site: self.site_id.clone(),
            ts: epoch_ms(),
            notification,
        }))
    }
}

impl ToneOutput for EgressSender {
    fn start(&self, request: &ToneRequest) -> ChannelResult<()> {
        self.send(EgressMessage::Sound(SoundPayload {
            site: self.site_id.clone(),
            ts: epoch_ms(),
            request: request.clone(),
        }))
    }
}

impl HapticDevice for EgressSender {
    fn vibrate(&self, pattern: &VibrationPattern) -> ChannelResult<()> {
        self.send(EgressMessage::Vibration(VibrationPayload {
            site: self.site_id.clone(),
            ts: epoch_ms(),
            pattern: *pattern,
        }))
    }
}

/// Create a new egress channel pair
///
/// Returns (sender, receiver) where sender can be cloned and shared.
/// Buffer size determines how many messages can be queued (at least one).
pub fn create_egress_channel(
    buffer_size: usize,
    site_id: String,
    metrics: Arc<Metrics>,
) -> (EgressSender, mpsc::Receiver<EgressMessage>) {
    let (tx, rx) = mpsc::channel(buffer_size.max(1));
    (EgressSender::new(tx, site_id, metrics), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertCategory, ALERT_VIBRATION};

    #[test]
    fn test_messages_carry_site() {
        let metrics = Arc::new(Metrics::new());
        let (sender, mut rx) = create_egress_channel(8, "phone-1".to_string(), metrics);

        sender
            .post(Notification::alert("Geofence Exit Alert", "body", AlertCategory::Exit, None))
            .unwrap();
        sender.vibrate(&ALERT_VIBRATION).unwrap();

        match rx.try_recv().unwrap() {
            EgressMessage::Notification(payload) => {
                assert_eq!(payload.site, "phone-1");
                let json = serde_json::to_value(&payload).unwrap();
                assert_eq!(json["title"], "Geofence Exit Alert");
                assert_eq!(json["id"], 1002);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        match rx.try_recv().unwrap() {
            EgressMessage::Vibration(payload) => {
                let json = serde_json::to_value(&payload).unwrap();
                assert_eq!(json["timings_ms"], serde_json::json!([0, 1000, 500, 1000]));
                assert!(json["repeat"].is_null());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let metrics = Arc::new(Metrics::new());
        let (sender, _rx) = create_egress_channel(1, "site".to_string(), metrics.clone());

        let request = ToneRequest { tone: "alert_sound".to_string(), fallback: None };
        assert!(sender.start(&request).is_ok());
        assert_eq!(sender.start(&request), Err(ChannelError::QueueFull));
        assert_eq!(metrics.egress_dropped(), 1);
    }

    #[test]
    fn test_closed_channel() {
        let metrics = Arc::new(Metrics::new());
        let (sender, rx) = create_egress_channel(4, "site".to_string(), metrics);
        drop(rx);
        assert_eq!(sender.vibrate(&ALERT_VIBRATION), Err(ChannelError::TransportClosed));
    }

    #[test]
    fn test_zero_buffer_size_holds_one_message() {
        let metrics = Arc::new(Metrics::new());
        let (sender, _rx) = create_egress_channel(0, "site".to_string(), metrics.clone());

        assert!(sender.vibrate(&ALERT_VIBRATION).is_ok());
        assert_eq!(sender.vibrate(&ALERT_VIBRATION), Err(ChannelError::QueueFull));
        assert_eq!(metrics.egress_dropped(), 1);
    }
}
