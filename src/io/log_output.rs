//! Log-only alert output, used when MQTT egress is disabled

use crate::domain::VibrationPattern;
use crate::io::channels::ChannelResult;
use crate::io::notifier::{Notification, NotificationSink};
use crate::io::sound::{ToneOutput, ToneRequest};
use crate::io::vibrator::HapticDevice;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOutput;

impl NotificationSink for LogOutput {
    fn post(&self, notification: Notification) -> ChannelResult<()> {
        info!(
            id = %notification.id,
            category = %notification.category_id.id(),
            title = %notification.title,
            body = %notification.body,
            "notification_posted"
        );
        Ok(())
    }
}

impl ToneOutput for LogOutput {
    fn start(&self, request: &ToneRequest) -> ChannelResult<()> {
        info!(tone = %request.tone, fallback = ?request.fallback, "tone_played");
        Ok(())
    }
}

impl HapticDevice for LogOutput {
    fn vibrate(&self, pattern: &VibrationPattern) -> ChannelResult<()> {
        info!(timings_ms = ?pattern.timings_ms, repeat = ?pattern.repeat, "vibration_played");
        Ok(())
    }
}
