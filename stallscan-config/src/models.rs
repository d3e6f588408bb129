use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use stallscan_core::SessionSettings;
use stallscan_model::EventId;
use url::Url;

use crate::util::humantime_duration;

/// Effective configuration after file, env and defaults are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub store: StoreConfig,
    pub analytics: AnalyticsConfig,
    #[serde(skip)]
    pub metadata: ConfigMetadata,
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

/// Scan session tuning. Durations accept humantime strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Event to scan under when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Repeat detections of one marker inside this window are ignored.
    #[serde(with = "humantime_duration")]
    pub cooldown: Duration,
    /// Deadline for each record-store query before it counts as a network
    /// failure.
    #[serde(with = "humantime_duration")]
    pub fetch_timeout: Duration,
    /// Scans slower than this are flagged and logged.
    #[serde(with = "humantime_duration")]
    pub latency_budget: Duration,
    /// Expired cooldown entries are swept every this many admissions.
    pub cooldown_sweep_every: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let defaults = SessionSettings::default();
        Self {
            event_id: None,
            cooldown: defaults.cooldown,
            fetch_timeout: defaults.fetch_timeout,
            latency_budget: defaults.latency_budget,
            cooldown_sweep_every: defaults.cooldown_sweep_every,
        }
    }
}

impl SessionConfig {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            cooldown: self.cooldown,
            fetch_timeout: self.fetch_timeout,
            latency_budget: self.latency_budget,
            cooldown_sweep_every: self.cooldown_sweep_every,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// JSON fixture loaded into memory.
    #[default]
    Memory,
    /// Document-database REST endpoint.
    Http,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsTransportKind {
    /// Structured log line per scan.
    #[default]
    Log,
    /// JSON POST to `endpoint`.
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub transport: AnalyticsTransportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Url>,
    /// Records queued beyond this are dropped.
    pub queue_capacity: usize,
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transport: AnalyticsTransportKind::Log,
            endpoint: None,
            queue_capacity: 256,
            timeout: Duration::from_secs(3),
        }
    }
}
