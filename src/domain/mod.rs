//! Domain models - transition events, alert payloads and status codes
//!
//! This module contains the canonical data types used throughout the system:
//! - `TransitionEvent` - what the location-monitoring subsystem pushes to us
//! - `AlertMessage` - the user-facing message derived from a transition
//! - `MonitoringStatus` - status codes carried by failure events

pub mod alert;
pub mod status;
pub mod types;

// Re-export commonly used types at module level
pub use alert::{AlertCategory, AlertChannel, AlertMessage, VibrationPattern, ALERT_VIBRATION};
pub use status::{translate, MonitoringStatus};
pub use types::{EventClass, Location, TransitionEvent, TransitionKind};
