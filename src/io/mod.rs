//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `channels` - Alert channel capabilities (Notifier, SoundPlayer, Vibrator)
//! - `notifier` / `sound` / `vibrator` - Channel implementations over low-level primitives
//! - `mqtt` - MQTT client for receiving transition events
//! - `mqtt_egress` - MQTT publisher for alert side effects
//! - `egress_channel` - Typed channel for MQTT egress messages
//! - `log_output` - Log-only primitives when egress is disabled

pub mod channels;
pub mod egress_channel;
pub mod log_output;
pub mod mqtt;
pub mod mqtt_egress;
pub mod notifier;
pub mod sound;
pub mod vibrator;

// Re-export commonly used types
pub use channels::{ChannelError, ChannelResult, Notifier, SoundPlayer, Vibrator};
pub use egress_channel::{create_egress_channel, EgressMessage, EgressSender};
pub use log_output::LogOutput;
pub use mqtt::InboundEvent;
pub use mqtt_egress::AlertPublisher;
pub use notifier::{Notification, NotificationSink, PresentingNotifier};
pub use sound::{FallbackSoundPlayer, ToneOutput, ToneRequest};
pub use vibrator::{HapticDevice, PatternVibrator};
