//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering. These are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use crate::domain::AlertChannel;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;
const NUM_CHANNELS: usize = 3;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

#[inline]
fn channel_index(channel: AlertChannel) -> usize {
    match channel {
        AlertChannel::Notification => 0,
        AlertChannel::Sound => 1,
        AlertChannel::Vibration => 2,
    }
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

#[inline]
fn load_channels(counters: &[AtomicU64; NUM_CHANNELS]) -> [u64; NUM_CHANNELS] {
    let mut result = [0u64; NUM_CHANNELS];
    for (i, counter) in counters.iter().enumerate() {
        result[i] = counter.load(Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps counters to get a consistent snapshot.
pub struct Metrics {
    /// Total events received by the handler (monotonic)
    events_total: AtomicU64,
    /// Events since last report (reset on report)
    events_since_report: AtomicU64,
    /// Events with neither an error code nor a transition kind (monotonic)
    malformed_total: AtomicU64,
    /// Events carrying a monitoring status code (monotonic)
    monitoring_errors_total: AtomicU64,
    /// Valid events that produced no alert (monotonic)
    discarded_total: AtomicU64,
    /// Alerts dispatched to at least the enabled channels (monotonic)
    alerts_dispatched: AtomicU64,
    /// Per-channel successful invocations (monotonic)
    channel_sent: [AtomicU64; NUM_CHANNELS],
    /// Per-channel failed invocations (monotonic)
    channel_failed: [AtomicU64; NUM_CHANNELS],
    /// Ingest events dropped due to channel full (monotonic)
    ingest_dropped: AtomicU64,
    /// Egress messages dropped due to channel full (monotonic)
    egress_dropped: AtomicU64,
    /// Sum of handling latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max handling latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Handling latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Last report time (only accessed from reporter, not atomic)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            malformed_total: AtomicU64::new(0),
            monitoring_errors_total: AtomicU64::new(0),
            discarded_total: AtomicU64::new(0),
            alerts_dispatched: AtomicU64::new(0),
            channel_sent: std::array::from_fn(|_| AtomicU64::new(0)),
            channel_failed: std::array::from_fn(|_| AtomicU64::new(0)),
            ingest_dropped: AtomicU64::new(0),
            egress_dropped: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record an event was handled with given latency (lock-free)
    #[inline]
    pub fn record_event_handled(&self, latency_us: u64) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_malformed(&self) {
        self.malformed_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_monitoring_error(&self) {
        self.monitoring_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_discarded(&self) {
        self.discarded_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert_dispatched(&self) {
        self.alerts_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_channel_sent(&self, channel: AlertChannel) {
        self.channel_sent[channel_index(channel)].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_channel_failed(&self, channel: AlertChannel) {
        self.channel_failed[channel_index(channel)].fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ingest event dropped due to channel full (lock-free)
    #[inline]
    pub fn record_ingest_dropped(&self) {
        self.ingest_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an egress message dropped due to channel full (lock-free)
    #[inline]
    pub fn record_egress_dropped(&self) {
        self.egress_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn events_total(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn alerts_dispatched(&self) -> u64 {
        self.alerts_dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn channel_sent(&self, channel: AlertChannel) -> u64 {
        self.channel_sent[channel_index(channel)].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn channel_failed(&self, channel: AlertChannel) -> u64 {
        self.channel_failed[channel_index(channel)].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn egress_dropped(&self) -> u64 {
        self.egress_dropped.load(Ordering::Relaxed)
    }

    /// Calculate and return metrics summary, then reset periodic counters
    ///
    /// This is the only method that resets counters. It uses atomic swap
    /// to get a consistent snapshot while allowing concurrent updates.
    pub fn report(&self) -> MetricsSummary {
        let events_count = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let events_per_sec = if elapsed.as_secs_f64() > 0.0 {
            events_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let avg_latency = if events_count > 0 { latency_sum / events_count } else { 0 };

        MetricsSummary {
            events_total: self.events_total.load(Ordering::Relaxed),
            events_per_sec,
            avg_handle_latency_us: avg_latency,
            max_handle_latency_us: max_latency,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            lat_buckets,
            malformed_total: self.malformed_total.load(Ordering::Relaxed),
            monitoring_errors_total: self.monitoring_errors_total.load(Ordering::Relaxed),
            discarded_total: self.discarded_total.load(Ordering::Relaxed),
            alerts_dispatched: self.alerts_dispatched.load(Ordering::Relaxed),
            channel_sent: load_channels(&self.channel_sent),
            channel_failed: load_channels(&self.channel_failed),
            ingest_dropped: self.ingest_dropped.load(Ordering::Relaxed),
            egress_dropped: self.egress_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub events_total: u64,
    pub events_per_sec: f64,
    pub avg_handle_latency_us: u64,
    pub max_handle_latency_us: u64,
    /// Handling latency histogram buckets
    /// Bounds: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
    pub malformed_total: u64,
    pub monitoring_errors_total: u64,
    pub discarded_total: u64,
    pub alerts_dispatched: u64,
    /// Indexed notification, sound, vibration
    pub channel_sent: [u64; NUM_CHANNELS],
    pub channel_failed: [u64; NUM_CHANNELS],
    pub ingest_dropped: u64,
    pub egress_dropped: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            events_total = %self.events_total,
            events_per_sec = format!("{:.1}", self.events_per_sec),
            avg_latency_us = %self.avg_handle_latency_us,
            max_latency_us = %self.max_handle_latency_us,
            p50_us = %self.lat_p50_us,
            p99_us = %self.lat_p99_us,
            malformed = %self.malformed_total,
            monitoring_errors = %self.monitoring_errors_total,
            discarded = %self.discarded_total,
            alerts = %self.alerts_dispatched,
            notifications = %self.channel_sent[0],
            sounds = %self.channel_sent[1],
            vibrations = %self.channel_sent[2],
            channel_failures = %self.channel_failed.iter().sum::<u64>(),
            ingest_dropped = %self.ingest_dropped,
            egress_dropped = %self.egress_dropped,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.events_total(), 0);
        assert_eq!(metrics.alerts_dispatched(), 0);
    }

    #[test]
    fn test_record_event() {
        let metrics = Metrics::new();

        metrics.record_event_handled(100);
        assert_eq!(metrics.events_total(), 1);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 100);

        metrics.record_event_handled(200);
        assert_eq!(metrics.events_total(), 2);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 300);
    }

    #[test]
    fn test_channel_counters_are_independent() {
        let metrics = Metrics::new();

        metrics.record_channel_sent(AlertChannel::Notification);
        metrics.record_channel_sent(AlertChannel::Vibration);
        metrics.record_channel_failed(AlertChannel::Sound);

        assert_eq!(metrics.channel_sent(AlertChannel::Notification), 1);
        assert_eq!(metrics.channel_sent(AlertChannel::Sound), 0);
        assert_eq!(metrics.channel_sent(AlertChannel::Vibration), 1);
        assert_eq!(metrics.channel_failed(AlertChannel::Sound), 1);
    }

    #[test]
    fn test_report() {
        let metrics = Metrics::new();

        metrics.record_event_handled(100);
        metrics.record_event_handled(200);
        metrics.record_event_handled(300);
        metrics.record_alert_dispatched();
        metrics.record_monitoring_error();
        metrics.record_discarded();

        let summary = metrics.report();

        assert_eq!(summary.events_total, 3);
        assert_eq!(summary.avg_handle_latency_us, 200);
        assert_eq!(summary.max_handle_latency_us, 300);
        assert_eq!(summary.alerts_dispatched, 1);
        assert_eq!(summary.monitoring_errors_total, 1);
        assert_eq!(summary.discarded_total, 1);

        // Periodic counters should be reset
        assert_eq!(metrics.events_since_report.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.latency_max_us.load(Ordering::Relaxed), 0);
        // Monotonic counters survive
        assert_eq!(metrics.events_total(), 3);
    }

    #[test]
    fn test_report_empty() {
        let metrics = Metrics::new();
        let summary = metrics.report();

        assert_eq!(summary.events_total, 0);
        assert_eq!(summary.avg_handle_latency_us, 0);
        assert_eq!(summary.lat_p99_us, 0);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(Metrics::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for i in 0..1000 {
                    m.record_event_handled(i as u64);
                    m.record_channel_sent(AlertChannel::Sound);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.events_total(), 10_000);
        assert_eq!(metrics.channel_sent(AlertChannel::Sound), 10_000);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(100), 0);
        assert_eq!(bucket_index(101), 1);
        assert_eq!(bucket_index(51200), 9);
        assert_eq!(bucket_index(51201), 10);
    }

    #[test]
    fn test_percentile_computation() {
        let metrics = Metrics::new();

        for _ in 0..100 {
            metrics.record_event_handled(150);
        }

        let summary = metrics.report();

        assert_eq!(summary.lat_buckets[1], 100);
        assert_eq!(summary.lat_p50_us, 200);
        assert_eq!(summary.lat_p99_us, 200);
    }

    #[test]
    fn test_percentile_skips_empty_leading_buckets() {
        let metrics = Metrics::new();
        metrics.record_event_handled(150);

        let summary = metrics.report();
        assert_eq!(summary.lat_p50_us, 200);
        assert_eq!(summary.lat_p99_us, 200);
    }

    #[test]
    fn test_percentile_rounds_target_up() {
        let mut buckets = [0u64; NUM_BUCKETS];
        buckets[0] = 1;
        buckets[2] = 2;

        // 3 samples: p50 target is the 2nd sample, which lands in the ≤400 bucket
        assert_eq!(percentile_from_buckets(&buckets, 0.50), 400);
        assert_eq!(percentile_from_buckets(&buckets, 0.01), 100);
    }
}
