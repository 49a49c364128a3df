//! Notification presentation
//!
//! `PresentingNotifier` turns a title/body/category into a fully described
//! notification and hands it to a `NotificationSink` (MQTT egress or log).

use crate::domain::{AlertCategory, VibrationPattern, ALERT_VIBRATION};
use crate::io::channels::{ChannelResult, Notifier};
use serde::Serialize;

pub const NOTIFICATION_CHANNEL_ID: &str = "geofence_channel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
}

/// What happens when the user taps the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TapAction {
    OpenPrimaryScreen,
}

/// A posted notification with its presentation attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Stable per category so ENTER and EXIT never replace each other
    pub id: i32,
    pub channel_id: &'static str,
    pub category_id: AlertCategory,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    /// System notification category
    pub category: &'static str,
    pub auto_cancel: bool,
    pub tap_action: TapAction,
    pub vibration: VibrationPattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl Notification {
    pub fn alert(title: &str, body: &str, category: AlertCategory, sound: Option<String>) -> Self {
        Self {
            id: category.notification_id(),
            channel_id: NOTIFICATION_CHANNEL_ID,
            category_id: category,
            title: title.to_string(),
            body: body.to_string(),
            priority: Priority::High,
            category: "alarm",
            auto_cancel: true,
            tap_action: TapAction::OpenPrimaryScreen,
            vibration: ALERT_VIBRATION,
            sound,
        }
    }
}

/// Low-level notification primitive
pub trait NotificationSink: Send + Sync {
    fn post(&self, notification: Notification) -> ChannelResult<()>;
}

pub struct PresentingNotifier<S> {
    sink: S,
    sound_hint: Option<String>,
}

impl<S: NotificationSink> PresentingNotifier<S> {
    /// `sound_hint` is the tone resource attached to the notification itself
    pub fn new(sink: S, sound_hint: Option<String>) -> Self {
        Self { sink, sound_hint }
    }
}

impl<S: NotificationSink> Notifier for PresentingNotifier<S> {
    fn show(&self, title: &str, body: &str, category: AlertCategory) -> ChannelResult<()> {
        self.sink.post(Notification::alert(title, body, category, self.sound_hint.clone()))
    }
}
