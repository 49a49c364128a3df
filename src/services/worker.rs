//! Transition worker - runs the handler off the MQTT eventloop
//!
//! The ingest client enqueues decoded events via an mpsc channel and the worker
//! hands them to the handler one by one, so a slow alert channel never stalls
//! the broker connection.

use crate::infra::metrics::Metrics;
use crate::io::mqtt::InboundEvent;
use crate::services::handler::TransitionHandler;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Worker that feeds inbound events to the transition handler
pub struct TransitionWorker {
    handler: Arc<TransitionHandler>,
    event_rx: mpsc::Receiver<InboundEvent>,
    metrics: Arc<Metrics>,
}

impl TransitionWorker {
    pub fn new(
        handler: Arc<TransitionHandler>,
        event_rx: mpsc::Receiver<InboundEvent>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { handler, event_rx, metrics }
    }

    /// Run until the channel closes or shutdown is signalled; queued events are drained first
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(policy = %self.handler.policy().as_str(), "transition_worker_started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        while let Ok(inbound) = self.event_rx.try_recv() {
                            self.process(inbound);
                        }
                        break;
                    }
                }
                inbound = self.event_rx.recv() => {
                    match inbound {
                        Some(inbound) => self.process(inbound),
                        None => break,
                    }
                }
            }
        }

        info!("transition_worker_stopped");
    }

    fn process(&self, inbound: InboundEvent) {
        let queue_delay_us = inbound.received_at.elapsed().as_micros() as u64;
        self.handler.handle(inbound.event.as_ref());
        let latency_us = inbound.received_at.elapsed().as_micros() as u64;
        self.metrics.record_event_handled(latency_us);

        // Warn if queue delay exceeds 100ms - indicates backlog
        if queue_delay_us > 100_000 {
            warn!(queue_delay_us = %queue_delay_us, "transition_queue_delay_high");
        }
    }
}

/// Create a transition event channel and worker
///
/// Returns the sender (for the ingest client) and the worker (to be spawned)
pub fn create_transition_worker(
    handler: Arc<TransitionHandler>,
    metrics: Arc<Metrics>,
    buffer_size: usize,
) -> (mpsc::Sender<InboundEvent>, TransitionWorker) {
    let (event_tx, event_rx) = mpsc::channel(buffer_size);
    let worker = TransitionWorker::new(handler, event_rx, metrics);
    (event_tx, worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertCategory, TransitionEvent, TransitionKind};
    use crate::infra::config::TransitionPolicy;
    use crate::infra::settings::{MemorySettingsStore, SettingsAccessor};
    use crate::io::channels::{ChannelResult, Notifier, SoundPlayer, Vibrator};
    use crate::services::handler::AlertChannels;
    use std::time::Instant;

    struct Silent;

    impl Notifier for Silent {
        fn show(&self, _: &str, _: &str, _: AlertCategory) -> ChannelResult<()> {
            Ok(())
        }
    }

    impl SoundPlayer for Silent {
        fn play(&self) -> ChannelResult<()> {
            Ok(())
        }
    }

    impl Vibrator for Silent {
        fn trigger(&self) -> ChannelResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_worker_drains_until_channel_closes() {
        let metrics = Arc::new(Metrics::new());
        let silent = Arc::new(Silent);
        let handler = Arc::new(TransitionHandler::new(
            SettingsAccessor::new(Arc::new(MemorySettingsStore::new())),
            AlertChannels { notifier: silent.clone(), sound: silent.clone(), vibrator: silent },
            TransitionPolicy::EnterAndExit,
            metrics.clone(),
        ));
        let (tx, worker) = create_transition_worker(handler, metrics.clone(), 16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let events = [
            Some(TransitionEvent::transition(TransitionKind::Exit, "home")),
            Some(TransitionEvent::failure(3)),
            None,
        ];
        for event in events {
            tx.send(InboundEvent { event, received_at: Instant::now() }).await.unwrap();
        }
        drop(tx);

        worker.run(shutdown_rx).await;

        assert_eq!(metrics.events_total(), 3);
        assert_eq!(metrics.alerts_dispatched(), 1);
    }
}
