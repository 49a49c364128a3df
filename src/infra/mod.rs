//! Infrastructure - configuration, preferences, and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `settings` - Read-only user preferences (alert channels, monitored region)
//! - `metrics` - Lock-free metrics collection

pub mod config;
pub mod metrics;
pub mod settings;

// Re-export commonly used types
pub use config::{Config, TransitionPolicy};
pub use metrics::Metrics;
pub use settings::{
    AlertPreferences, JsonFileSettingsStore, MemorySettingsStore, RegionDefinition,
    SettingsAccessor, SettingsStore,
};
