//! Read-only access to persisted user preferences
//!
//! The store is a flat key/value map. Every read takes a fresh snapshot so
//! changes made elsewhere (the configuration UI) are picked up on the next event.
//! Missing or mistyped keys resolve to their defaults; reads never fail.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub const KEY_NOTIFICATION_ENABLED: &str = "notification_enabled";
pub const KEY_SOUND_ENABLED: &str = "sound_enabled";
pub const KEY_VIBRATION_ENABLED: &str = "vibration_enabled";
pub const KEY_GEOFENCE_LATITUDE: &str = "geofence_latitude";
pub const KEY_GEOFENCE_LONGITUDE: &str = "geofence_longitude";
pub const KEY_GEOFENCE_RADIUS: &str = "geofence_radius";
pub const KEY_GEOFENCE_ACTIVE: &str = "geofence_active";

pub const DEFAULT_RADIUS_M: f64 = 100.0;

/// Which alert channels the user wants; all enabled unless turned off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPreferences {
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self { notifications_enabled: true, sound_enabled: true, vibration_enabled: true }
    }
}

/// Monitored circular region as configured by the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionDefinition {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub active: bool,
}

impl Default for RegionDefinition {
    fn default() -> Self {
        Self { latitude: 0.0, longitude: 0.0, radius_m: DEFAULT_RADIUS_M, active: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
}

/// Point-in-time copy of the store
#[derive(Debug, Clone, Default)]
pub struct SettingsSnapshot {
    values: HashMap<String, SettingValue>,
}

impl SettingsSnapshot {
    pub fn new(values: HashMap<String, SettingValue>) -> Self {
        Self { values }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(SettingValue::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(SettingValue::Number(v)) => *v,
            _ => default,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Persistent key/value preferences, read-only from the handler's side
pub trait SettingsStore: Send + Sync {
    fn snapshot(&self) -> SettingsSnapshot;
}

/// In-process store, for embedding and tests
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.values.write().insert(key.to_string(), SettingValue::Bool(value));
    }

    pub fn set_f64(&self, key: &str, value: f64) {
        self.values.write().insert(key.to_string(), SettingValue::Number(value));
    }

    pub fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

impl SettingsStore for MemorySettingsStore {
    fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot::new(self.values.read().clone())
    }
}

/// JSON object file, re-read on every snapshot
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_values(&self) -> HashMap<String, SettingValue> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "preferences_file_missing");
                return HashMap::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "preferences_read_failed");
                return HashMap::new();
            }
        };

        let parsed: HashMap<String, Value> = match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "preferences_parse_failed");
                return HashMap::new();
            }
        };

        parsed
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::Bool(b) => SettingValue::Bool(b),
                    Value::Number(n) => SettingValue::Number(n.as_f64()?),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect()
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot::new(self.read_values())
    }
}

/// Typed view over a settings store
#[derive(Clone)]
pub struct SettingsAccessor {
    store: Arc<dyn SettingsStore>,
}

impl SettingsAccessor {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Fresh preferences snapshot. Never cached between calls.
    pub fn read(&self) -> AlertPreferences {
        let snapshot = self.store.snapshot();
        AlertPreferences {
            notifications_enabled: snapshot.get_bool(KEY_NOTIFICATION_ENABLED, true),
            sound_enabled: snapshot.get_bool(KEY_SOUND_ENABLED, true),
            vibration_enabled: snapshot.get_bool(KEY_VIBRATION_ENABLED, true),
        }
    }

    pub fn region(&self) -> RegionDefinition {
        let snapshot = self.store.snapshot();
        RegionDefinition {
            latitude: snapshot.get_f64(KEY_GEOFENCE_LATITUDE, 0.0),
            longitude: snapshot.get_f64(KEY_GEOFENCE_LONGITUDE, 0.0),
            radius_m: snapshot.get_f64(KEY_GEOFENCE_RADIUS, DEFAULT_RADIUS_M),
            active: snapshot.get_bool(KEY_GEOFENCE_ACTIVE, false),
        }
    }
}
