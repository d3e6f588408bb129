mod error;
mod sources;

pub use error::ConfigLoadError;
pub use sources::{
    CONFIG_PATH_VAR, COOLDOWN_VAR, EVENT_ID_VAR, EnvConfig, FETCH_TIMEOUT_VAR,
    FIXTURE_PATH_VAR, STORE_URL_VAR,
};

use std::{
    fs,
    path::{Path, PathBuf},
};

use stallscan_model::EventId;
use url::Url;

use crate::{
    models::{Config, ConfigMetadata, StoreKind},
    validation::{self, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["stallscan.toml", "config/stallscan.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Replaces the process environment when set.
    pub env: Option<EnvConfig>,
    /// Skip the `.env` step entirely.
    pub skip_env_file: bool,
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self.options.skip_env_file = true;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let env = self.options.env.clone().unwrap_or_else(EnvConfig::gather);

        let (mut config, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No stallscan.toml detected; using defaults and environment overrides",
                format!("Point {CONFIG_PATH_VAR} at a configuration file"),
            );
        }

        apply_env_overrides(&mut config, &env)?;
        config.metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };

        let guard_warnings = validation::apply_guard_rails(&config)?;
        warnings.items.extend(guard_warnings.items);

        for warning in &warnings.items {
            tracing::debug!(
                warning = %warning.message,
                hint = warning.hint.as_deref().unwrap_or(""),
                "configuration warning"
            );
        }

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.options.skip_env_file {
            return Ok(false);
        }
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        loaded.or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err.into()),
        })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Config, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((Config::default(), None)),
            },
        };

        let config = read_config_file(&path)?;
        Ok((config, Some(path)))
    }
}

/// Parses a TOML file, or JSON when the extension says so.
pub fn read_config_file(path: &Path) -> Result<Config, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&contents).map_err(|source| ConfigLoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn apply_env_overrides(
    config: &mut Config,
    env: &EnvConfig,
) -> Result<(), ConfigLoadError> {
    if let Some(raw) = &env.cooldown {
        config.session.cooldown = parse_duration(COOLDOWN_VAR, raw)?;
    }
    if let Some(raw) = &env.fetch_timeout {
        config.session.fetch_timeout = parse_duration(FETCH_TIMEOUT_VAR, raw)?;
    }
    if let Some(raw) = &env.event_id {
        config.session.event_id =
            Some(EventId::new(raw.as_str()).map_err(|source| {
                ConfigLoadError::InvalidEventId {
                    var: EVENT_ID_VAR,
                    source,
                }
            })?);
    }
    if let Some(raw) = &env.store_url {
        let url = Url::parse(raw.trim()).map_err(|source| {
            ConfigLoadError::InvalidUrl {
                var: STORE_URL_VAR,
                value: raw.clone(),
                source,
            }
        })?;
        config.store.kind = StoreKind::Http;
        config.store.base_url = Some(url);
    }
    if let Some(path) = &env.fixture_path {
        config.store.fixture_path = Some(path.clone());
    }
    Ok(())
}

fn parse_duration(
    var: &'static str,
    raw: &str,
) -> Result<std::time::Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            var,
            value: raw.to_string(),
            source,
        }
    })
}
