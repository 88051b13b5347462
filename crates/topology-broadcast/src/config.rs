//! Configuration loading and typed config structures for the topology server.
//!
//! The configuration lives in `topology-config.yaml` at the project root.
//! Every field has a default, so a missing file or an empty document yields
//! a working server. `TOPOLOGY_HOST`, `TOPOLOGY_PORT` and `TOPOLOGY_SEED`
//! override the file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use topology_types::Environment;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `topology-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TopologyConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Timer periods and synthesis tunables.
    #[serde(default)]
    pub broadcast: BroadcastSettings,

    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl TopologyConfig {
    /// Load configuration from a YAML file, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults (still subject to environment overrides).
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file), except for `NotFound`.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::parse(""),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse configuration from a YAML string, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TOPOLOGY_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override does not parse.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("TOPOLOGY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("TOPOLOGY_PORT") {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "server.port",
                reason: format!("TOPOLOGY_PORT={port}: {e}"),
            })?;
        }
        if let Some(seed) = lookup("TOPOLOGY_SEED") {
            let parsed = seed.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "broadcast.seed",
                reason: format!("TOPOLOGY_SEED={seed}: {e}"),
            })?;
            self.broadcast.seed = Some(parsed);
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.broadcast;
        for (field, value) in [
            ("broadcast.metric_interval_ms", b.metric_interval_ms),
            ("broadcast.status_interval_ms", b.status_interval_ms),
            ("broadcast.alert_interval_ms", b.alert_interval_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "interval must be positive"));
            }
        }
        for (field, value) in [
            ("broadcast.healthy_probability", b.healthy_probability),
            ("broadcast.alert_probability", b.alert_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, &format!("{value} is outside [0, 1]")));
            }
        }
        if !(0.0..1.0).contains(&b.perturbation) {
            return Err(invalid(
                "broadcast.perturbation",
                &format!("{} is outside [0, 1)", b.perturbation),
            ));
        }
        if b.outbound_buffer == 0 {
            return Err(invalid("broadcast.outbound_buffer", "must hold at least one frame"));
        }
        if !self.server.ws_path.starts_with('/') {
            return Err(invalid("server.ws_path", "must start with '/'"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port. `0` picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the WebSocket endpoint.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
        }
    }
}

/// Broadcast timer periods and synthesis tunables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BroadcastSettings {
    /// Period of the `metric_update` stream.
    #[serde(default = "default_metric_interval_ms")]
    pub metric_interval_ms: u64,

    /// Period of the `system_status` stream.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,

    /// Period of the `alert` stream.
    #[serde(default = "default_alert_interval_ms")]
    pub alert_interval_ms: u64,

    /// Chance each service reports healthy in a status roll-up.
    #[serde(default = "default_healthy_probability")]
    pub healthy_probability: f64,

    /// Chance an alert tick actually emits an alert.
    #[serde(default = "default_alert_probability")]
    pub alert_probability: f64,

    /// Relative spread of metric values around their baseline.
    #[serde(default = "default_perturbation")]
    pub perturbation: f64,

    /// Seed for the synthesizers. Absent means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Frames queued per connection before a tick skips it.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Environment whose node ids are attached to metric samples.
    #[serde(default)]
    pub target_environment: Option<Environment>,
}

impl BroadcastSettings {
    /// Period of the metric stream.
    pub const fn metric_interval(&self) -> Duration {
        Duration::from_millis(self.metric_interval_ms)
    }

    /// Period of the status stream.
    pub const fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Period of the alert stream.
    pub const fn alert_interval(&self) -> Duration {
        Duration::from_millis(self.alert_interval_ms)
    }
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            metric_interval_ms: default_metric_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
            alert_interval_ms: default_alert_interval_ms(),
            healthy_probability: default_healthy_probability(),
            alert_probability: default_alert_probability(),
            perturbation: default_perturbation(),
            seed: None,
            outbound_buffer: default_outbound_buffer(),
            target_environment: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

fn default_ws_path() -> String {
    String::from("/ws/metrics")
}

const fn default_metric_interval_ms() -> u64 {
    3_000
}

const fn default_status_interval_ms() -> u64 {
    10_000
}

const fn default_alert_interval_ms() -> u64 {
    15_000
}

const fn default_healthy_probability() -> f64 {
    0.9
}

const fn default_alert_probability() -> f64 {
    0.3
}

const fn default_perturbation() -> f64 {
    0.2
}

const fn default_outbound_buffer() -> usize {
    32
}

fn default_log_level() -> String {
    String::from("info")
}
