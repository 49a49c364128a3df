//! Translation of monitoring-subsystem status codes into readable categories

use std::fmt;

/// Failure reported by the location-monitoring subsystem instead of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoringStatus {
    /// Region monitoring is unavailable on this device (code 1)
    NotAvailable,
    /// Too many regions registered for monitoring (code 2)
    TooManyRegions,
    /// Too many pending callbacks registered (code 3)
    TooManyPendingCallbacks,
    Unknown(i32),
}

impl MonitoringStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => MonitoringStatus::NotAvailable,
            2 => MonitoringStatus::TooManyRegions,
            3 => MonitoringStatus::TooManyPendingCallbacks,
            other => MonitoringStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            MonitoringStatus::NotAvailable => 1,
            MonitoringStatus::TooManyRegions => 2,
            MonitoringStatus::TooManyPendingCallbacks => 3,
            MonitoringStatus::Unknown(code) => *code,
        }
    }

    /// Constant name as reported by the monitoring subsystem
    pub fn name(&self) -> String {
        match self {
            MonitoringStatus::NotAvailable => "GEOFENCE_NOT_AVAILABLE".to_string(),
            MonitoringStatus::TooManyRegions => "GEOFENCE_TOO_MANY_GEOFENCES".to_string(),
            MonitoringStatus::TooManyPendingCallbacks => {
                "GEOFENCE_TOO_MANY_PENDING_INTENTS".to_string()
            }
            MonitoringStatus::Unknown(code) => format!("UNKNOWN_ERROR_CODE: {}", code),
        }
    }

    pub fn description(&self) -> String {
        match self {
            MonitoringStatus::NotAvailable => "region monitoring unavailable".to_string(),
            MonitoringStatus::TooManyRegions => "too many monitored regions".to_string(),
            MonitoringStatus::TooManyPendingCallbacks => "too many pending callbacks".to_string(),
            MonitoringStatus::Unknown(code) => format!("unknown code: {}", code),
        }
    }
}

impl fmt::Display for MonitoringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Map any status code to its category string. Total: unknown codes get a generic category.
pub fn translate(code: i32) -> String {
    MonitoringStatus::from_code(code).description()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(translate(1), "region monitoring unavailable");
        assert_eq!(translate(2), "too many monitored regions");
        assert_eq!(translate(3), "too many pending callbacks");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(translate(0), "unknown code: 0");
        assert_eq!(translate(1000), "unknown code: 1000");
        assert_eq!(translate(-7), "unknown code: -7");
    }

    #[test]
    fn test_names_and_round_trip() {
        assert_eq!(MonitoringStatus::from_code(2).name(), "GEOFENCE_TOO_MANY_GEOFENCES");
        assert_eq!(MonitoringStatus::from_code(99).name(), "UNKNOWN_ERROR_CODE: 99");
        for code in [1, 2, 3, 17] {
            assert_eq!(MonitoringStatus::from_code(code).code(), code);
        }
    }
}
