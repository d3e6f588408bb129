use std::{ffi::OsStr, path::PathBuf};

use crate::util::non_empty;

pub const CONFIG_PATH_VAR: &str = "STALLSCAN_CONFIG_PATH";
pub const COOLDOWN_VAR: &str = "STALLSCAN_COOLDOWN";
pub const FETCH_TIMEOUT_VAR: &str = "STALLSCAN_FETCH_TIMEOUT";
pub const STORE_URL_VAR: &str = "STALLSCAN_STORE_URL";
pub const FIXTURE_PATH_VAR: &str = "STALLSCAN_FIXTURE_PATH";
pub const EVENT_ID_VAR: &str = "STALLSCAN_EVENT_ID";

/// Raw environment overrides. Values stay unparsed until the loader merges
/// them so errors can name the offending variable.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub cooldown: Option<String>,
    pub fetch_timeout: Option<String>,
    pub store_url: Option<String>,
    pub fixture_path: Option<PathBuf>,
    pub event_id: Option<String>,
}

impl EnvConfig {
    /// Reads overrides from the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds overrides from explicit pairs, ignoring unknown keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string_lossy().into_owned(), v.into()))
            .collect();
        Self::from_lookup(|key| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| non_empty(lookup(key));
        Self {
            config_path: read(CONFIG_PATH_VAR).map(PathBuf::from),
            cooldown: read(COOLDOWN_VAR),
            fetch_timeout: read(FETCH_TIMEOUT_VAR),
            store_url: read(STORE_URL_VAR),
            fixture_path: read(FIXTURE_PATH_VAR).map(PathBuf::from),
            event_id: read(EVENT_ID_VAR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_ignored() {
        let env = EnvConfig::from_pairs([
            (COOLDOWN_VAR, "  "),
            (FETCH_TIMEOUT_VAR, "750ms"),
            ("UNRELATED", "x"),
        ]);
        assert_eq!(env.cooldown, None);
        assert_eq!(env.fetch_timeout.as_deref(), Some("750ms"));
    }

    #[test]
    fn later_pairs_win() {
        let env = EnvConfig::from_pairs([
            (EVENT_ID_VAR, "E1"),
            (EVENT_ID_VAR, "E2"),
        ]);
        assert_eq!(env.event_id.as_deref(), Some("E2"));
    }
}
