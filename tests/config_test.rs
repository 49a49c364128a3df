//! Integration tests for configuration loading

use geofence_alerts::infra::{Config, TransitionPolicy};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[site]
id = "test-phone"

[mqtt]
host = "test-host"
port = 1884
topic = "test/transitions"

[alerts]
policy = "exit_only"

[preferences]
file = "/tmp/prefs.json"

[sound]
preferred = "chime"
fallback = "beep"

[device]
has_vibrator = false

[egress]
enabled = false
notifications_topic = "test/notify"

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "test-phone");
    assert_eq!(config.mqtt_host(), "test-host");
    assert_eq!(config.mqtt_port(), 1884);
    assert_eq!(config.mqtt_topic(), "test/transitions");
    assert_eq!(config.transition_policy(), TransitionPolicy::ExitOnly);
    assert_eq!(config.preferences_file(), "/tmp/prefs.json");
    assert_eq!(config.sound_preferred(), Some("chime"));
    assert_eq!(config.sound_fallback(), "beep");
    assert!(!config.has_vibrator());
    assert!(!config.egress_enabled());
    assert_eq!(config.egress_notifications_topic(), "test/notify");
    assert_eq!(config.egress_sound_topic(), "geofence/alerts/sound");
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.mqtt_host(), "localhost");
    assert_eq!(config.mqtt_port(), 1883);
    assert_eq!(config.transition_policy(), TransitionPolicy::EnterAndExit);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_invalid_policy_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[mqtt]\nhost = \"h\"\nport = 1883\n\n[alerts]\npolicy = \"always\"\n")
        .unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_missing_mqtt_section_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[site]\nid = \"x\"\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_zero_egress_queue_size_is_raised_to_one() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[mqtt]\nhost = \"h\"\nport = 1883\n\n[egress]\nqueue_size = 0\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.egress_queue_size(), 1);
}
