//! The three independent broadcast timers.
//!
//! Metric samples, status roll-ups and alerts each run on their own
//! `tokio` task with their own period and their own synthesizer. The
//! timers are not phase-locked: each first fires one full period after
//! spawn. All three watch a shared shutdown flag and exit when it flips.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use topology_types::{ServerEvent, ServerMessage};
use tracing::{debug, info, warn};

use crate::config::BroadcastSettings;
use crate::registry::ConnectionRegistry;
use crate::synth::{MetricSynthesizer, MetricTargets, SynthSettings};

/// Which of the three streams a timer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKind {
    /// `metric_update` events.
    Metrics,
    /// `system_status` events.
    Status,
    /// `alert` events, emitted on a fraction of ticks.
    Alerts,
}

impl StreamKind {
    /// All streams, in spawn order.
    pub const ALL: [Self; 3] = [Self::Metrics, Self::Status, Self::Alerts];

    /// Name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Status => "status",
            Self::Alerts => "alerts",
        }
    }

    /// Mixed into the configured seed so each stream draws a distinct
    /// sequence.
    const fn seed_salt(self) -> u64 {
        match self {
            Self::Metrics => 0x6d65_7472_6963_7300,
            Self::Status => 0x7374_6174_7573_0000,
            Self::Alerts => 0x616c_6572_7473_0000,
        }
    }

    fn period(self, settings: &BroadcastSettings) -> Duration {
        match self {
            Self::Metrics => settings.metric_interval(),
            Self::Status => settings.status_interval(),
            Self::Alerts => settings.alert_interval(),
        }
    }
}

/// Produce this tick's event for a stream, if any.
pub fn next_event(kind: StreamKind, synth: &mut MetricSynthesizer) -> Option<ServerEvent> {
    match kind {
        StreamKind::Metrics => Some(ServerEvent::MetricUpdate(synth.metric_update())),
        StreamKind::Status => Some(ServerEvent::SystemStatus(synth.system_status())),
        StreamKind::Alerts => synth.maybe_alert().map(ServerEvent::Alert),
    }
}

/// Handles to the running timer tasks.
#[derive(Debug)]
pub struct BroadcastTimers {
    shutdown: watch::Sender<bool>,
    handles: Vec<(StreamKind, JoinHandle<()>)>,
}

impl BroadcastTimers {
    /// Spawn all three timers against `registry`.
    pub fn spawn(
        registry: &Arc<ConnectionRegistry>,
        settings: &BroadcastSettings,
        targets: &MetricTargets,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let synth_settings = SynthSettings::from(settings);

        let handles = StreamKind::ALL
            .into_iter()
            .map(|kind| {
                let seed = settings.seed.map(|s| s ^ kind.seed_salt());
                let mut synth = MetricSynthesizer::new(seed, synth_settings);
                if kind == StreamKind::Metrics {
                    synth = synth.with_targets(targets.clone());
                }
                let handle = tokio::spawn(run_timer(
                    kind,
                    kind.period(settings),
                    synth,
                    Arc::clone(registry),
                    shutdown.subscribe(),
                ));
                (kind, handle)
            })
            .collect();

        Self { shutdown, handles }
    }

    /// Number of timers still running.
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|(_, h)| !h.is_finished()).count()
    }

    /// Signal every timer to stop and wait for all of them to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for (kind, handle) in self.handles {
            if let Err(e) = handle.await {
                warn!(stream = kind.as_str(), error = %e, "broadcast timer panicked");
            }
        }
        info!("broadcast timers stopped");
    }
}

async fn run_timer(
    kind: StreamKind,
    period: Duration,
    mut synth: MetricSynthesizer,
    registry: Arc<ConnectionRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        stream = kind.as_str(),
        period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        "broadcast timer started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(event) = next_event(kind, &mut synth) else {
                    continue;
                };
                let kind_name = event.kind();
                match registry.broadcast(&ServerMessage::now(event)).await {
                    Ok(report) => debug!(
                        stream = kind.as_str(),
                        event = kind_name,
                        delivered = report.delivered,
                        skipped = report.skipped,
                        "broadcast tick"
                    ),
                    Err(e) => warn!(stream = kind.as_str(), error = %e, "broadcast failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!(stream = kind.as_str(), "broadcast timer stopped");
}
