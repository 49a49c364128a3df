//! Alert channel capabilities
//!
//! Each way of alerting the user is a narrow capability. Implementations own
//! their fallback behavior; callers only see success or a `ChannelError`.
//! All calls are fire-and-forget: implementations must return without waiting
//! for the side effect to complete.

use crate::domain::AlertCategory;
use thiserror::Error;

/// Alert channel errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The device or service behind the channel is not available
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// Tone resource could not be resolved
    #[error("Tone not found: {0}")]
    ToneUnresolved(String),

    /// Tone resolved but playback could not start
    #[error("Playback failed for {tone}: {reason}")]
    PlaybackFailed { tone: String, reason: String },

    /// Egress publisher has shut down
    #[error("Egress transport closed")]
    TransportClosed,

    /// Egress queue is full and the message was dropped
    #[error("Egress queue full")]
    QueueFull,
}

impl ChannelError {
    /// The egress path failed, as opposed to the requested side effect itself
    pub fn is_transport(&self) -> bool {
        matches!(self, ChannelError::TransportClosed | ChannelError::QueueFull)
    }
}

/// Result type for alert channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Shows a titled message to the user
pub trait Notifier: Send + Sync {
    fn show(&self, title: &str, body: &str, category: AlertCategory) -> ChannelResult<()>;
}

/// Plays the alert tone, falling back to the system default tone
pub trait SoundPlayer: Send + Sync {
    fn play(&self) -> ChannelResult<()>;
}

/// Plays the alert vibration pattern; a no-op without vibration hardware
pub trait Vibrator: Send + Sync {
    fn trigger(&self) -> ChannelResult<()>;
}
