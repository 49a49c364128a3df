//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/dev.toml";

/// Which transitions raise an alert. DWELL and unknown kinds never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    EnterAndExit,
    ExitOnly,
}

impl TransitionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPolicy::EnterAndExit => "enter_and_exit",
            TransitionPolicy::ExitOnly => "exit_only",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_mqtt_topic() -> String {
    "geofence/transitions".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertsConfig {
    #[serde(default)]
    pub policy: TransitionPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    /// JSON file holding the user's alert preferences and region
    #[serde(default = "default_preferences_file")]
    pub file: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self { file: default_preferences_file() }
    }
}

fn default_preferences_file() -> String {
    "config/preferences.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoundConfig {
    /// Custom alert tone resource, tried before the fallback
    #[serde(default = "default_preferred_tone")]
    pub preferred: Option<String>,
    #[serde(default = "default_fallback_tone")]
    pub fallback: String,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { preferred: default_preferred_tone(), fallback: default_fallback_tone() }
    }
}

fn default_preferred_tone() -> Option<String> {
    Some("alert_sound".to_string())
}

fn default_fallback_tone() -> String {
    "system_default".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_has_vibrator")]
    pub has_vibrator: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { has_vibrator: default_has_vibrator() }
    }
}

fn default_has_vibrator() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// Publish alert side effects over MQTT; when false they are only logged
    #[serde(default = "default_egress_enabled")]
    pub enabled: bool,
    /// Topic for posted notifications (QoS 1)
    #[serde(default = "default_notifications_topic")]
    pub notifications_topic: String,
    /// Topic for tone playback requests (QoS 0)
    #[serde(default = "default_sound_topic")]
    pub sound_topic: String,
    /// Topic for vibration requests (QoS 0)
    #[serde(default = "default_vibration_topic")]
    pub vibration_topic: String,
    #[serde(default = "default_egress_queue_size")]
    pub queue_size: usize,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            enabled: default_egress_enabled(),
            notifications_topic: default_notifications_topic(),
            sound_topic: default_sound_topic(),
            vibration_topic: default_vibration_topic(),
            queue_size: default_egress_queue_size(),
        }
    }
}

fn default_egress_enabled() -> bool {
    true
}

fn default_notifications_topic() -> String {
    "geofence/alerts/notification".to_string()
}

fn default_sound_topic() -> String {
    "geofence/alerts/sound".to_string()
}

fn default_vibration_topic() -> String {
    "geofence/alerts/vibration".to_string()
}

fn default_egress_queue_size() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique device/site identifier, stamped on egress payloads
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "geofence".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_topic: String,
    mqtt_username: Option<String>,
    mqtt_password: Option<String>,
    transition_policy: TransitionPolicy,
    preferences_file: String,
    sound_preferred: Option<String>,
    sound_fallback: String,
    has_vibrator: bool,
    egress_enabled: bool,
    egress_notifications_topic: String,
    egress_sound_topic: String,
    egress_vibration_topic: String,
    egress_queue_size: usize,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            mqtt_host: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_topic: default_mqtt_topic(),
            mqtt_username: None,
            mqtt_password: None,
            transition_policy: TransitionPolicy::default(),
            preferences_file: default_preferences_file(),
            sound_preferred: default_preferred_tone(),
            sound_fallback: default_fallback_tone(),
            has_vibrator: default_has_vibrator(),
            egress_enabled: default_egress_enabled(),
            egress_notifications_topic: default_notifications_topic(),
            egress_sound_topic: default_sound_topic(),
            egress_vibration_topic: default_vibration_topic(),
            egress_queue_size: default_egress_queue_size(),
            metrics_interval_secs: default_metrics_interval(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path: explicit argument, then CONFIG_FILE, then the default
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            site_id: toml_config.site.id,
            mqtt_host: toml_config.mqtt.host,
            mqtt_port: toml_config.mqtt.port,
            mqtt_topic: toml_config.mqtt.topic,
            mqtt_username: toml_config.mqtt.username,
            mqtt_password: toml_config.mqtt.password,
            transition_policy: toml_config.alerts.policy,
            preferences_file: toml_config.preferences.file,
            sound_preferred: toml_config.sound.preferred,
            sound_fallback: toml_config.sound.fallback,
            has_vibrator: toml_config.device.has_vibrator,
            egress_enabled: toml_config.egress.enabled,
            egress_notifications_topic: toml_config.egress.notifications_topic,
            egress_sound_topic: toml_config.egress.sound_topic,
            egress_vibration_topic: toml_config.egress.vibration_topic,
            egress_queue_size: toml_config.egress.queue_size.max(1),
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = format!("{:#}", e), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    pub fn mqtt_topic(&self) -> &str {
        &self.mqtt_topic
    }

    pub fn mqtt_username(&self) -> Option<&str> {
        self.mqtt_username.as_deref()
    }

    pub fn mqtt_password(&self) -> Option<&str> {
        self.mqtt_password.as_deref()
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        self.transition_policy
    }

    pub fn preferences_file(&self) -> &str {
        &self.preferences_file
    }

    pub fn sound_preferred(&self) -> Option<&str> {
        self.sound_preferred.as_deref()
    }

    pub fn sound_fallback(&self) -> &str {
        &self.sound_fallback
    }

    pub fn has_vibrator(&self) -> bool {
        self.has_vibrator
    }

    pub fn egress_enabled(&self) -> bool {
        self.egress_enabled
    }

    pub fn egress_notifications_topic(&self) -> &str {
        &self.egress_notifications_topic
    }

    pub fn egress_sound_topic(&self) -> &str {
        &self.egress_sound_topic
    }

    pub fn egress_vibration_topic(&self) -> &str {
        &self.egress_vibration_topic
    }

    pub fn egress_queue_size(&self) -> usize {
        self.egress_queue_size
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the transition policy
    #[cfg(test)]
    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transition_policy = policy;
        self
    }
}
