//! Alert payloads derived from a handled transition

use super::types::{Location, TransitionKind};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Presentation category of an alert.
///
/// ENTER and EXIT use distinct identifiers and notification ids so one never
/// replaces a still-pending notification of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    Enter,
    Exit,
}

impl AlertCategory {
    /// Only ENTER and EXIT transitions have an alert category
    pub fn from_kind(kind: &TransitionKind) -> Option<Self> {
        match kind {
            TransitionKind::Enter => Some(AlertCategory::Enter),
            TransitionKind::Exit => Some(AlertCategory::Exit),
            TransitionKind::Dwell | TransitionKind::Unknown(_) => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            AlertCategory::Enter => "ENTER",
            AlertCategory::Exit => "EXIT",
        }
    }

    pub fn notification_id(&self) -> i32 {
        match self {
            AlertCategory::Enter => 1001,
            AlertCategory::Exit => 1002,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertCategory::Enter => "Geofence Enter Alert",
            AlertCategory::Exit => "Geofence Exit Alert",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            AlertCategory::Enter => "entered",
            AlertCategory::Exit => "exited",
        }
    }
}

/// One of the independent ways a user is alerted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertChannel {
    Notification,
    Sound,
    Vibration,
}

impl AlertChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertChannel::Notification => "notification",
            AlertChannel::Sound => "sound",
            AlertChannel::Vibration => "vibration",
        }
    }
}

/// Message shown to the user for one transition; built fresh per event and never stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMessage {
    /// Correlates the log lines of a single alert
    pub alert_id: String,
    pub category: AlertCategory,
    pub region_id: String,
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    pub fn new(category: AlertCategory, region_id: &str, location: Option<Location>) -> Self {
        let location_info =
            location.map(|loc| format!(" at location {}", loc)).unwrap_or_default();

        Self {
            alert_id: new_uuid_v7(),
            category,
            region_id: region_id.to_string(),
            title: category.title().to_string(),
            body: format!("You have {} the geofence area{}", category.verb(), location_info),
        }
    }
}

/// Haptic waveform: alternating off/on durations starting with an initial delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VibrationPattern {
    pub timings_ms: &'static [u64],
    /// Index to repeat from; `None` plays the pattern once
    pub repeat: Option<usize>,
}

/// 0 ms delay, 1000 ms on, 500 ms off, 1000 ms on, played once
pub const ALERT_VIBRATION: VibrationPattern =
    VibrationPattern { timings_ms: &[0, 1000, 500, 1000], repeat: None };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_kind() {
        assert_eq!(AlertCategory::from_kind(&TransitionKind::Enter), Some(AlertCategory::Enter));
        assert_eq!(AlertCategory::from_kind(&TransitionKind::Exit), Some(AlertCategory::Exit));
        assert_eq!(AlertCategory::from_kind(&TransitionKind::Dwell), None);
        assert_eq!(AlertCategory::from_kind(&TransitionKind::from_code(42)), None);
    }

    #[test]
    fn test_categories_are_distinct() {
        assert_ne!(AlertCategory::Enter.id(), AlertCategory::Exit.id());
        assert_ne!(
            AlertCategory::Enter.notification_id(),
            AlertCategory::Exit.notification_id()
        );
    }

    #[test]
    fn test_exit_message_with_location() {
        let msg = AlertMessage::new(
            AlertCategory::Exit,
            "home",
            Some(Location::new(37.422, -122.084)),
        );
        assert_eq!(msg.title, "Geofence Exit Alert");
        assert_eq!(msg.body, "You have exited the geofence area at location 37.422, -122.084");
        assert_eq!(msg.region_id, "home");
    }

    #[test]
    fn test_enter_message_without_location() {
        let msg = AlertMessage::new(AlertCategory::Enter, "work", None);
        assert_eq!(msg.title, "Geofence Enter Alert");
        assert_eq!(msg.body, "You have entered the geofence area");
        assert!(!msg.body.contains("at location"));
    }

    #[test]
    fn test_alert_ids_are_unique() {
        let a = AlertMessage::new(AlertCategory::Enter, "work", None);
        let b = AlertMessage::new(AlertCategory::Enter, "work", None);
        assert_ne!(a.alert_id, b.alert_id);
        assert_eq!(a.alert_id.len(), 36);
    }

    #[test]
    fn test_vibration_pattern() {
        assert_eq!(ALERT_VIBRATION.timings_ms, &[0, 1000, 500, 1000]);
        assert_eq!(ALERT_VIBRATION.repeat, None);
    }

    #[test]
    fn test_category_serializes_as_id() {
        assert_eq!(serde_json::to_string(&AlertCategory::Exit).unwrap(), "\"EXIT\"");
    }
}
