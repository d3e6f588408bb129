//! Configuration for stallscan binaries.
//!
//! Values are merged from an optional `.env` file, a TOML or JSON config
//! file, built-in defaults, and a handful of `STALLSCAN_*` environment
//! overrides, then checked by [`validation::apply_guard_rails`].

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions, EnvConfig,
};
pub use models::{
    AnalyticsConfig, AnalyticsTransportKind, Config, ConfigMetadata,
    SessionConfig, StoreConfig, StoreKind,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};

impl Config {
    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
