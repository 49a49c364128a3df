//! Geofence alerts - turns region boundary crossings into user alerts
//!
//! Module structure:
//! - `domain/` - Core types (TransitionEvent, AlertMessage, MonitoringStatus)
//! - `io/` - External interfaces (MQTT ingest/egress, alert channels)
//! - `services/` - Transition handler and its worker
//! - `infra/` - Infrastructure (Config, Settings, Metrics)

use clap::Parser;
use geofence_alerts::infra::{Config, JsonFileSettingsStore, Metrics, SettingsAccessor};
use geofence_alerts::io::{create_egress_channel, AlertPublisher, LogOutput};
use geofence_alerts::services::{create_transition_worker, AlertChannels, TransitionHandler};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Upper bound on waiting for queued alerts to be published at shutdown
const PUBLISHER_DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Geofence alerts - region transition alerting service
#[derive(Parser, Debug)]
#[command(name = "geofence-alerts", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for every handler decision
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(version = %env!("CARGO_PKG_VERSION"), git = %env!("GIT_HASH"), "geofence-alerts starting");

    let args = Args::parse();
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path);

    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        mqtt_host = %config.mqtt_host(),
        mqtt_port = %config.mqtt_port(),
        mqtt_topic = %config.mqtt_topic(),
        policy = %config.transition_policy().as_str(),
        preferences_file = %config.preferences_file(),
        egress_enabled = %config.egress_enabled(),
        "config_loaded"
    );

    let settings =
        SettingsAccessor::new(Arc::new(JsonFileSettingsStore::new(config.preferences_file())));
    let region = settings.region();
    let prefs = settings.read();
    info!(
        latitude = %region.latitude,
        longitude = %region.longitude,
        radius_m = %region.radius_m,
        active = %region.active,
        notifications = %prefs.notifications_enabled,
        sound = %prefs.sound_enabled,
        vibration = %prefs.vibration_enabled,
        "monitored_region"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(Metrics::new());

    // Alert channels publish over MQTT when egress is enabled, otherwise only log.
    // The publisher is stopped only after the worker has finished draining.
    let (egress_shutdown_tx, egress_shutdown_rx) = watch::channel(false);
    let mut publisher_task = None;
    let channels = if config.egress_enabled() {
        let (egress_sender, egress_rx) = create_egress_channel(
            config.egress_queue_size(),
            config.site_id().to_string(),
            metrics.clone(),
        );

        let publisher = AlertPublisher::new(&config, egress_rx);
        publisher_task = Some(tokio::spawn(async move {
            publisher.run(egress_shutdown_rx).await;
        }));

        AlertChannels::over(egress_sender, &config)
    } else {
        AlertChannels::over(LogOutput, &config)
    };

    let handler = Arc::new(TransitionHandler::new(
        settings,
        channels,
        config.transition_policy(),
        metrics.clone(),
    ));

    // Bounded for backpressure; overflow is dropped and counted by the ingest client
    let (event_tx, worker) = create_transition_worker(handler, metrics.clone(), 1000);

    let mqtt_config = config.clone();
    let mqtt_metrics = metrics.clone();
    let mqtt_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = geofence_alerts::io::mqtt::start_mqtt_client(
            &mqtt_config,
            event_tx,
            mqtt_metrics,
            mqtt_shutdown,
        )
        .await
        {
            tracing::error!(error = %e, "mqtt_client_error");
        }
    });

    // Start metrics reporter (lock-free reads with full summary)
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs().max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    // Run worker - handles events until shutdown or the ingest channel closes
    worker.run(shutdown_rx).await;

    let _ = egress_shutdown_tx.send(true);
    if let Some(task) = publisher_task {
        match tokio::time::timeout(PUBLISHER_DRAIN_TIMEOUT, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "mqtt_egress_task_failed"),
            Err(_) => tracing::warn!("mqtt_egress_drain_timeout"),
        }
    }

    metrics.report().log();
    info!("geofence-alerts shutdown complete");
    Ok(())
}
