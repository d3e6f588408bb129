use thiserror::Error;

use crate::models::{AnalyticsTransportKind, Config, StoreKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("analytics.queue_capacity must be greater than zero")]
    ZeroQueueCapacity,
    #[error("store.kind = \"http\" requires store.base_url")]
    MissingStoreUrl,
    #[error("analytics.transport = \"http\" requires analytics.endpoint")]
    MissingAnalyticsEndpoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let session = &config.session;

    if session.cooldown.is_zero() {
        return Err(ConfigGuardRailError::ZeroDuration {
            field: "session.cooldown",
        });
    }
    if session.fetch_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroDuration {
            field: "session.fetch_timeout",
        });
    }
    if session.latency_budget.is_zero() {
        return Err(ConfigGuardRailError::ZeroDuration {
            field: "session.latency_budget",
        });
    }

    if session.cooldown_sweep_every == 0 {
        warnings.push(
            "session.cooldown_sweep_every is 0; expired cooldown entries are swept on every admission",
        );
    }

    match config.store.kind {
        StoreKind::Http if config.store.base_url.is_none() => {
            return Err(ConfigGuardRailError::MissingStoreUrl);
        }
        StoreKind::Memory if config.store.fixture_path.is_none() => {
            warnings.push_with_hint(
                "In-memory store has no fixture; every marker will resolve to marker_not_found",
                "Set store.fixture_path or STALLSCAN_FIXTURE_PATH",
            );
        }
        _ => {}
    }

    let analytics = &config.analytics;
    if analytics.enabled {
        if analytics.queue_capacity == 0 {
            return Err(ConfigGuardRailError::ZeroQueueCapacity);
        }
        if analytics.transport == AnalyticsTransportKind::Http
            && analytics.endpoint.is_none()
        {
            return Err(ConfigGuardRailError::MissingAnalyticsEndpoint);
        }
    }

    Ok(warnings)
}
