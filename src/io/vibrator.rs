//! Haptic alert

use crate::domain::{VibrationPattern, ALERT_VIBRATION};
use crate::io::channels::{ChannelResult, Vibrator};
use tracing::debug;

/// Low-level vibration primitive
pub trait HapticDevice: Send + Sync {
    fn vibrate(&self, pattern: &VibrationPattern) -> ChannelResult<()>;
}

pub struct PatternVibrator<D> {
    device: D,
    has_vibrator: bool,
}

impl<D: HapticDevice> PatternVibrator<D> {
    pub fn new(device: D, has_vibrator: bool) -> Self {
        Self { device, has_vibrator }
    }
}

impl<D: HapticDevice> Vibrator for PatternVibrator<D> {
    fn trigger(&self) -> ChannelResult<()> {
        if !self.has_vibrator {
            debug!("vibrator_absent_skipping");
            return Ok(());
        }
        self.device.vibrate(&ALERT_VIBRATION)
    }
}
