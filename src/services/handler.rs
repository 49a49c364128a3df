//! Transition event handler
//!
//! Consumes one transition event at a time, validates it, derives the alert
//! message and fans out to the alert channels the user has enabled.
//!
//! Each event is handled as a self-contained transaction:
//! `received -> validated -> {discarded | dispatching -> done}`.
//! Nothing is carried over between events and nothing propagates to the caller.

use crate::domain::{
    AlertCategory, AlertChannel, AlertMessage, EventClass, Location, MonitoringStatus,
    TransitionEvent, TransitionKind,
};
use crate::infra::config::{Config, TransitionPolicy};
use crate::infra::metrics::Metrics;
use crate::infra::settings::{AlertPreferences, SettingsAccessor};
use crate::io::channels::{ChannelResult, Notifier, SoundPlayer, Vibrator};
use crate::io::notifier::{NotificationSink, PresentingNotifier};
use crate::io::sound::{FallbackSoundPlayer, ToneOutput};
use crate::io::vibrator::{HapticDevice, PatternVibrator};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

/// The three alert channel capabilities the handler fans out to
#[derive(Clone)]
pub struct AlertChannels {
    pub notifier: Arc<dyn Notifier>,
    pub sound: Arc<dyn SoundPlayer>,
    pub vibrator: Arc<dyn Vibrator>,
}

impl AlertChannels {
    /// Build the three channels over one set of low-level primitives (egress or log)
    pub fn over<P>(primitives: P, config: &Config) -> Self
    where
        P: NotificationSink + ToneOutput + HapticDevice + Clone + 'static,
    {
        let preferred = config.sound_preferred().map(str::to_string);
        Self {
            notifier: Arc::new(PresentingNotifier::new(primitives.clone(), preferred.clone())),
            sound: Arc::new(FallbackSoundPlayer::new(
                primitives.clone(),
                preferred,
                config.sound_fallback().to_string(),
            )),
            vibrator: Arc::new(PatternVibrator::new(primitives, config.has_vibrator())),
        }
    }
}

/// Why an event produced no alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// Absent event, or neither error code nor transition kind
    Malformed(&'static str),
    /// The monitoring subsystem reported a failure
    MonitoringError(MonitoringStatus),
    /// DWELL or an unrecognised kind
    UnsupportedTransition,
    /// ENTER while the policy only alerts on EXIT
    FilteredByPolicy,
    /// Empty triggered-region list
    NoRegion,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::Malformed(_) => "malformed",
            DiscardReason::MonitoringError(_) => "monitoring_error",
            DiscardReason::UnsupportedTransition => "unsupported_transition",
            DiscardReason::FilteredByPolicy => "filtered_by_policy",
            DiscardReason::NoRegion => "no_region",
        }
    }
}

/// Result of one channel for one alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Turned off in the user's preferences; never invoked
    Disabled,
    Delivered,
    Failed,
}

impl ChannelOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelOutcome::Disabled => "disabled",
            ChannelOutcome::Delivered => "delivered",
            ChannelOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub message: AlertMessage,
    pub notification: ChannelOutcome,
    pub sound: ChannelOutcome,
    pub vibration: ChannelOutcome,
}

impl DispatchReport {
    pub fn outcome(&self, channel: AlertChannel) -> ChannelOutcome {
        match channel {
            AlertChannel::Notification => self.notification,
            AlertChannel::Sound => self.sound,
            AlertChannel::Vibration => self.vibration,
        }
    }
}

/// What the handler decided for one event
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Discarded(DiscardReason),
    Dispatched(DispatchReport),
}

pub struct TransitionHandler {
    settings: SettingsAccessor,
    channels: AlertChannels,
    policy: TransitionPolicy,
    metrics: Arc<Metrics>,
}

impl TransitionHandler {
    pub fn new(
        settings: SettingsAccessor,
        channels: AlertChannels,
        policy: TransitionPolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { settings, channels, policy, metrics }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Handle one event. Never fails; every outcome is logged.
    pub fn handle(&self, event: Option<&TransitionEvent>) {
        let _ = self.process(event);
    }

    /// Handle one event and report the decision taken
    pub fn process(&self, event: Option<&TransitionEvent>) -> Disposition {
        let Some(event) = event else {
            self.metrics.record_malformed();
            warn!(kind = "NONE", decision = "discarded", reason = "absent_event", "transition_discarded");
            return Disposition::Discarded(DiscardReason::Malformed("absent_event"));
        };

        let kind = event.kind_label();
        debug!(kind = %kind, regions = %event.regions.len(), has_location = %event.location.is_some(), "transition_received");

        match event.classify() {
            EventClass::Malformed { reason } => {
                self.metrics.record_malformed();
                warn!(kind = %kind, decision = "discarded", reason = %reason, "transition_discarded");
                Disposition::Discarded(DiscardReason::Malformed(reason))
            }
            EventClass::Failure { code } => {
                let status = MonitoringStatus::from_code(code);
                self.metrics.record_monitoring_error();
                error!(
                    kind = %kind,
                    decision = "discarded",
                    code = %code,
                    status = %status.name(),
                    category = %status,
                    "monitoring_error"
                );
                Disposition::Discarded(DiscardReason::MonitoringError(status))
            }
            EventClass::Transition { kind, regions, location } => {
                self.handle_transition(kind, regions, location)
            }
        }
    }

    fn handle_transition(
        &self,
        kind: &TransitionKind,
        regions: &[String],
        location: Option<Location>,
    ) -> Disposition {
        let Some(category) = AlertCategory::from_kind(kind) else {
            self.metrics.record_discarded();
            debug!(kind = %kind, transition = %kind.describe(), decision = "discarded", reason = "unsupported_transition", "transition_discarded");
            return Disposition::Discarded(DiscardReason::UnsupportedTransition);
        };

        if self.policy == TransitionPolicy::ExitOnly && category == AlertCategory::Enter {
            self.metrics.record_discarded();
            debug!(kind = %kind, decision = "discarded", reason = "filtered_by_policy", policy = %self.policy.as_str(), "transition_discarded");
            return Disposition::Discarded(DiscardReason::FilteredByPolicy);
        }

        let Some(region_id) = regions.first().filter(|id| !id.is_empty()) else {
            self.metrics.record_discarded();
            warn!(kind = %kind, decision = "discarded", reason = "no_region", "transition_discarded");
            return Disposition::Discarded(DiscardReason::NoRegion);
        };

        let message = AlertMessage::new(category, region_id, location);
        let prefs = self.settings.read();
        Disposition::Dispatched(self.dispatch(message, prefs))
    }

    fn dispatch(&self, message: AlertMessage, prefs: AlertPreferences) -> DispatchReport {
        let span = info_span!("alert", alert_id = %message.alert_id);
        let _guard = span.enter();
        let kind = message.category.id();

        let notification =
            self.invoke(AlertChannel::Notification, kind, prefs.notifications_enabled, || {
                self.channels.notifier.show(&message.title, &message.body, message.category)
            });
        let sound = self.invoke(AlertChannel::Sound, kind, prefs.sound_enabled, || {
            self.channels.sound.play()
        });
        let vibration = self.invoke(AlertChannel::Vibration, kind, prefs.vibration_enabled, || {
            self.channels.vibrator.trigger()
        });

        self.metrics.record_alert_dispatched();
        info!(
            kind = %kind,
            decision = "dispatched",
            region_id = %message.region_id,
            notification = %notification.as_str(),
            sound = %sound.as_str(),
            vibration = %vibration.as_str(),
            "transition_dispatched"
        );

        DispatchReport { message, notification, sound, vibration }
    }

    /// Invoke one channel if enabled. A failure is logged here and never reaches siblings.
    fn invoke<F>(&self, channel: AlertChannel, kind: &str, enabled: bool, call: F) -> ChannelOutcome
    where
        F: FnOnce() -> ChannelResult<()>,
    {
        if !enabled {
            debug!(kind = %kind, channel = %channel.as_str(), decision = "skipped", "channel_disabled");
            return ChannelOutcome::Disabled;
        }

        match call() {
            Ok(()) => {
                self.metrics.record_channel_sent(channel);
                debug!(kind = %kind, channel = %channel.as_str(), decision = "dispatched", "channel_dispatched");
                ChannelOutcome::Delivered
            }
            Err(e) => {
                self.metrics.record_channel_failed(channel);
                warn!(kind = %kind, channel = %channel.as_str(), decision = "failed", error = %e, "channel_failed");
                ChannelOutcome::Failed
            }
        }
    }
}
