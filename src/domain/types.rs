//! Transition event types delivered by the location-monitoring subsystem

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Numeric transition constants used by the monitoring subsystem
pub const TRANSITION_ENTER: i64 = 1;
pub const TRANSITION_EXIT: i64 = 2;
pub const TRANSITION_DWELL: i64 = 4;

/// Kind of boundary crossing reported for a monitored region
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Enter,
    Exit,
    Dwell,
    /// Anything the monitoring subsystem sent that we do not recognise (raw value kept for logs)
    Unknown(String),
}

impl TransitionKind {
    /// Map a numeric transition constant to a kind
    pub fn from_code(code: i64) -> Self {
        match code {
            TRANSITION_ENTER => TransitionKind::Enter,
            TRANSITION_EXIT => TransitionKind::Exit,
            TRANSITION_DWELL => TransitionKind::Dwell,
            other => TransitionKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransitionKind::Enter => "ENTER",
            TransitionKind::Exit => "EXIT",
            TransitionKind::Dwell => "DWELL",
            TransitionKind::Unknown(raw) => raw,
        }
    }

    /// Long-form name used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TransitionKind::Enter => "GEOFENCE_TRANSITION_ENTER".to_string(),
            TransitionKind::Exit => "GEOFENCE_TRANSITION_EXIT".to_string(),
            TransitionKind::Dwell => "GEOFENCE_TRANSITION_DWELL".to_string(),
            TransitionKind::Unknown(raw) => format!("UNKNOWN_TRANSITION_TYPE: {}", raw),
        }
    }
}

impl std::str::FromStr for TransitionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Ok(Self::from_code(code));
        }
        Ok(match s.to_ascii_uppercase().as_str() {
            "ENTER" | "GEOFENCE_TRANSITION_ENTER" => TransitionKind::Enter,
            "EXIT" | "GEOFENCE_TRANSITION_EXIT" => TransitionKind::Exit,
            "DWELL" | "GEOFENCE_TRANSITION_DWELL" => TransitionKind::Dwell,
            _ => TransitionKind::Unknown(s.to_string()),
        })
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransitionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Kinds arrive either as names ("EXIT") or as numeric constants (2)
impl<'de> Deserialize<'de> for TransitionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct KindVisitor;

        impl<'de> Visitor<'de> for KindVisitor {
            type Value = TransitionKind;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a transition name or numeric transition code")
            }

            fn visit_str<E>(self, value: &str) -> Result<TransitionKind, E>
            where
                E: de::Error,
            {
                // FromStr is infallible
                Ok(value.parse().unwrap_or(TransitionKind::Unknown(value.to_string())))
            }

            fn visit_u64<E>(self, value: u64) -> Result<TransitionKind, E>
            where
                E: de::Error,
            {
                match i64::try_from(value) {
                    Ok(code) => Ok(TransitionKind::from_code(code)),
                    Err(_) => Ok(TransitionKind::Unknown(value.to_string())),
                }
            }

            fn visit_i64<E>(self, value: i64) -> Result<TransitionKind, E>
            where
                E: de::Error,
            {
                Ok(TransitionKind::from_code(value))
            }
        }

        deserializer.deserialize_any(KindVisitor)
    }
}

/// Position that triggered a transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Rendered with the shortest representation that round-trips, so no precision is lost
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Event pushed by the monitoring subsystem.
///
/// Either a monitoring failure (`error` set) or a boundary transition; when `error` is
/// present the remaining fields are never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransitionKind>,
    /// Triggered region identifiers, in the order the subsystem reported them
    #[serde(default, alias = "triggering_regions", skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<i32>,
}

/// Validated view of a `TransitionEvent`
#[derive(Debug, PartialEq)]
pub enum EventClass<'a> {
    /// The subsystem reported a failure instead of a transition
    Failure { code: i32 },
    Transition {
        kind: &'a TransitionKind,
        regions: &'a [String],
        location: Option<Location>,
    },
    /// Neither an error code nor a transition kind
    Malformed { reason: &'static str },
}

impl TransitionEvent {
    pub fn transition(kind: TransitionKind, region_id: &str) -> Self {
        Self { kind: Some(kind), regions: vec![region_id.to_string()], location: None, error: None }
    }

    pub fn failure(code: i32) -> Self {
        Self { error: Some(code), ..Default::default() }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location::new(latitude, longitude));
        self
    }

    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = regions;
        self
    }

    /// First triggered region, if the list is non-empty
    pub fn region_id(&self) -> Option<&str> {
        self.regions.first().map(String::as_str)
    }

    /// Kind as a log field; error events report "ERROR"
    pub fn kind_label(&self) -> &str {
        if self.error.is_some() {
            return "ERROR";
        }
        self.kind.as_ref().map(TransitionKind::as_str).unwrap_or("NONE")
    }

    pub fn classify(&self) -> EventClass<'_> {
        if let Some(code) = self.error {
            return EventClass::Failure { code };
        }
        match &self.kind {
            Some(kind) => EventClass::Transition {
                kind,
                regions: &self.regions,
                location: self.location,
            },
            None => EventClass::Malformed { reason: "missing_transition_kind" },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("EXIT".parse::<TransitionKind>().unwrap(), TransitionKind::Exit);
        assert_eq!("enter".parse::<TransitionKind>().unwrap(), TransitionKind::Enter);
        assert_eq!(
            "GEOFENCE_TRANSITION_DWELL".parse::<TransitionKind>().unwrap(),
            TransitionKind::Dwell
        );
        assert_eq!("2".parse::<TransitionKind>().unwrap(), TransitionKind::Exit);
        assert!(matches!(
            "WANDER".parse::<TransitionKind>().unwrap(),
            TransitionKind::Unknown(_)
        ));
    }

    #[test]
    fn test_kind_describe() {
        assert_eq!(TransitionKind::Exit.describe(), "GEOFENCE_TRANSITION_EXIT");
        assert_eq!(TransitionKind::from_code(9).describe(), "UNKNOWN_TRANSITION_TYPE: 9");
    }

    #[test]
    fn test_deserialize_named_and_numeric_kinds() {
        let named: TransitionEvent =
            serde_json::from_str(r#"{"kind":"EXIT","regions":["home"]}"#).unwrap();
        assert_eq!(named.kind, Some(TransitionKind::Exit));

        let numeric: TransitionEvent =
            serde_json::from_str(r#"{"kind":1,"regions":["work"]}"#).unwrap();
        assert_eq!(numeric.kind, Some(TransitionKind::Enter));

        let dwell: TransitionEvent = serde_json::from_str(r#"{"kind":4}"#).unwrap();
        assert_eq!(dwell.kind, Some(TransitionKind::Dwell));
    }

    #[test]
    fn test_deserialize_full_event() {
        let json = r#"{
            "kind": "EXIT",
            "triggering_regions": ["home", "garden"],
            "location": {"latitude": 37.422, "longitude": -122.084}
        }"#;
        let event: TransitionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.region_id(), Some("home"));
        assert_eq!(event.location, Some(Location::new(37.422, -122.084)));
        assert_eq!(event.error, None);
    }

    #[test]
    fn test_classify_error_wins_over_transition_fields() {
        let mut event = TransitionEvent::transition(TransitionKind::Exit, "home");
        event.error = Some(2);
        assert_eq!(event.classify(), EventClass::Failure { code: 2 });
        assert_eq!(event.kind_label(), "ERROR");
    }

    #[test]
    fn test_classify_missing_kind_is_malformed() {
        let event: TransitionEvent = serde_json::from_str(r#"{"regions":["home"]}"#).unwrap();
        assert!(matches!(event.classify(), EventClass::Malformed { .. }));
        assert_eq!(event.kind_label(), "NONE");
    }

    #[test]
    fn test_location_display_keeps_precision() {
        let loc = Location::new(37.4219983, -122.0840016);
        assert_eq!(loc.to_string(), "37.4219983, -122.0840016");
        assert_eq!(Location::new(37.422, -122.084).to_string(), "37.422, -122.084");
    }
}
