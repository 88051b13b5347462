//! Synthetic event generation for the three broadcast streams.
//!
//! Each stream owns its own [`MetricSynthesizer`] so the streams never
//! contend for a shared generator. With a configured seed every stream is
//! reproducible; without one, each draws from OS entropy.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use topology_types::{
    AlertEvent, AlertSeverity, Environment, Measurement, MetricTags, MetricUpdate, ServiceHealth,
    ServiceStatus, SystemStatus,
};

use crate::config::BroadcastSettings;

/// Regions metric samples are tagged with.
pub const REGIONS: [&str; 4] = ["us-east-1", "us-west-2", "eu-west-1", "ap-southeast-1"];

/// Logical services reported in every `system_status` roll-up.
pub const SERVICES: [&str; 6] = [
    "api-gateway",
    "auth-service",
    "user-service",
    "payment-service",
    "notification-service",
    "analytics-service",
];

/// Lower bound of a service check latency, inclusive.
pub const MIN_SERVICE_LATENCY_MS: u32 = 10;

/// Upper bound of a service check latency, exclusive.
pub const MAX_SERVICE_LATENCY_MS: u32 = 60;

/// Value a measurement is perturbed around.
pub const fn baseline(measurement: Measurement) -> f64 {
    match measurement {
        Measurement::CpuUsage => 45.0,
        Measurement::MemoryUsage => 60.0,
        Measurement::NetworkThroughput => 1_200.0,
        Measurement::DiskIo => 350.0,
        Measurement::RequestLatency => 85.0,
        Measurement::ErrorRate => 1.5,
    }
}

/// One entry of the alert catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertTemplate {
    /// Severity to report.
    pub severity: AlertSeverity,
    /// Message text.
    pub message: &'static str,
    /// Measurement that tripped.
    pub metric: Option<Measurement>,
    /// Observed value.
    pub value: Option<f64>,
    /// Threshold crossed.
    pub threshold: Option<f64>,
}

/// Fixed set of alerts the alert stream picks from.
pub const ALERT_CATALOG: [AlertTemplate; 4] = [
    AlertTemplate {
        severity: AlertSeverity::Warning,
        message: "High CPU usage on payment-service",
        metric: Some(Measurement::CpuUsage),
        value: Some(87.5),
        threshold: Some(85.0),
    },
    AlertTemplate {
        severity: AlertSeverity::Critical,
        message: "Database connection pool exhausted on orders-db",
        metric: Some(Measurement::ErrorRate),
        value: Some(12.4),
        threshold: Some(5.0),
    },
    AlertTemplate {
        severity: AlertSeverity::Warning,
        message: "Request latency above SLO on api-gateway",
        metric: Some(Measurement::RequestLatency),
        value: Some(182.0),
        threshold: Some(150.0),
    },
    AlertTemplate {
        severity: AlertSeverity::Info,
        message: "Scheduled certificate rotation completed",
        metric: None,
        value: None,
        threshold: None,
    },
];

/// Node ids metric samples may be aimed at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricTargets {
    /// Environment the ids belong to.
    pub environment: Option<Environment>,
    /// Candidate node ids. Empty means samples are untargeted.
    pub node_ids: Vec<String>,
}

/// Probabilities and spread that shape synthesized content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthSettings {
    /// Chance a service reports healthy.
    pub healthy_probability: f64,
    /// Chance an alert tick emits an alert.
    pub alert_probability: f64,
    /// Relative spread around each baseline.
    pub perturbation: f64,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self::from(&BroadcastSettings::default())
    }
}

impl From<&BroadcastSettings> for SynthSettings {
    fn from(settings: &BroadcastSettings) -> Self {
        Self {
            healthy_probability: settings.healthy_probability,
            alert_probability: settings.alert_probability,
            perturbation: settings.perturbation,
        }
    }
}

/// Seeded generator of broadcast payloads.
#[derive(Debug, Clone)]
pub struct MetricSynthesizer {
    rng: StdRng,
    settings: SynthSettings,
    targets: MetricTargets,
}

impl MetricSynthesizer {
    /// Create a synthesizer. `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>, settings: SynthSettings) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            rng,
            settings,
            targets: MetricTargets::default(),
        }
    }

    /// Aim metric samples at the given node ids.
    #[must_use]
    pub fn with_targets(mut self, targets: MetricTargets) -> Self {
        self.targets = targets;
        self
    }

    /// One metric sample for a random measurement, within
    /// `baseline * (1 +/- perturbation)`.
    pub fn metric_update(&mut self) -> MetricUpdate {
        let measurement = Measurement::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Measurement::CpuUsage);
        let value = self.perturb(baseline(measurement));

        let node_id = self.targets.node_ids.choose(&mut self.rng).cloned();
        let environment = match self.targets.environment {
            Some(environment) if node_id.is_some() => Some(environment),
            _ => Environment::ALL.choose(&mut self.rng).copied(),
        };
        let region = REGIONS.choose(&mut self.rng).map(|r| (*r).to_owned());

        MetricUpdate {
            measurement,
            value,
            timestamp: Utc::now(),
            tags: Some(MetricTags {
                environment,
                region,
                node_id,
                edge_id: None,
            }),
        }
    }

    /// A roll-up of every service in [`SERVICES`], in order.
    pub fn system_status(&mut self) -> SystemStatus {
        let services = SERVICES
            .iter()
            .map(|name| {
                let status = if self.chance(self.settings.healthy_probability) {
                    ServiceHealth::Healthy
                } else {
                    ServiceHealth::Warning
                };
                ServiceStatus {
                    name: (*name).to_owned(),
                    status,
                    latency: self
                        .rng
                        .random_range(MIN_SERVICE_LATENCY_MS..MAX_SERVICE_LATENCY_MS),
                }
            })
            .collect();
        SystemStatus {
            services,
            timestamp: Utc::now(),
        }
    }

    /// An alert from [`ALERT_CATALOG`] with probability
    /// `alert_probability`, otherwise `None`.
    pub fn maybe_alert(&mut self) -> Option<AlertEvent> {
        if !self.chance(self.settings.alert_probability) {
            return None;
        }
        let template = ALERT_CATALOG.choose(&mut self.rng)?;
        Some(AlertEvent {
            severity: template.severity,
            message: template.message.to_owned(),
            metric: template.metric,
            value: template.value,
            threshold: template.threshold,
            timestamp: Utc::now(),
        })
    }

    /// Bernoulli draw that never panics on an out-of-range probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    fn perturb(&mut self, base: f64) -> f64 {
        let spread = self.settings.perturbation.abs();
        let factor = 1.0 + self.rng.random_range(-spread..=spread);
        (base * factor * 100.0).round() / 100.0
    }
}
