//! Integer settings read by the canonicalizer.

use config::{Config, Environment, File};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Environment variable prefix; `FIELDCANON__CORE__MAX_TEMPLATED_FIELD_LENGTH`
/// overrides `[core]max_templated_field_length`.
pub const ENV_PREFIX: &str = "FIELDCANON";

/// Section holding the canonicalizer settings.
pub const CORE_SECTION: &str = "core";

/// Key of the maximum rendered length setting.
pub const MAX_TEMPLATED_FIELD_LENGTH: &str = "max_templated_field_length";

/// Default for `[core]max_templated_field_length`.
pub const DEFAULT_MAX_TEMPLATED_FIELD_LENGTH: i64 = 4096;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The option is not set and has no default.
    #[error("missing configuration option [{section}]{key}")]
    Missing {
        /// Section name.
        section: String,
        /// Option name.
        key: String,
    },
    /// The option is set but is not an integer.
    #[error("invalid value for [{section}]{key}: {reason}")]
    Invalid {
        /// Section name.
        section: String,
        /// Option name.
        key: String,
        /// Parser message.
        reason: String,
    },
    /// Configuration sources could not be loaded.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Key-value configuration source.
pub trait ConfigSource: Send + Sync {
    /// Reads an integer option.
    fn get_int(&self, section: &str, key: &str) -> Result<i64, ConfigError>;
}

/// Layered settings: built-in defaults, an optional file, then
/// `FIELDCANON__SECTION__KEY` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    inner: Config,
}

impl Settings {
    /// Loads defaults, the optional file and the process environment.
    ///
    /// The file format is taken from its extension (`.ini`, `.toml`, `.json`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::with_environment(
            path,
            Environment::with_prefix(ENV_PREFIX).separator("__"),
        )
    }

    /// Same as [`Settings::load`] with an explicit environment source.
    pub fn with_environment(
        path: Option<&Path>,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().set_default(
            format!("{}.{}", CORE_SECTION, MAX_TEMPLATED_FIELD_LENGTH),
            DEFAULT_MAX_TEMPLATED_FIELD_LENGTH,
        )?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let inner = builder.add_source(environment).build()?;
        Ok(Self { inner })
    }

    /// Reads `[core]max_templated_field_length`.
    pub fn max_templated_field_length(&self) -> Result<i64, ConfigError> {
        self.get_int(CORE_SECTION, MAX_TEMPLATED_FIELD_LENGTH)
    }
}

impl ConfigSource for Settings {
    fn get_int(&self, section: &str, key: &str) -> Result<i64, ConfigError> {
        match self.inner.get_int(&format!("{}.{}", section, key)) {
            Ok(value) => Ok(value),
            Err(config::ConfigError::NotFound(_)) => Err(ConfigError::Missing {
                section: section.to_string(),
                key: key.to_string(),
            }),
            Err(err) => Err(ConfigError::Invalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

/// In-memory configuration source.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: BTreeMap<(String, String), i64>,
}

impl StaticConfig {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an integer option.
    pub fn with_int(mut self, section: &str, key: &str, value: i64) -> Self {
        self.values
            .insert((section.to_string(), key.to_string()), value);
        self
    }
}

impl ConfigSource for StaticConfig {
    fn get_int(&self, section: &str, key: &str) -> Result<i64, ConfigError> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .copied()
            .ok_or_else(|| ConfigError::Missing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let mut map = config::Map::new();
        for (k, v) in vars {
            map.insert(k.to_string(), v.to_string());
        }
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(Some(map))
    }

    #[test]
    fn default_applies_without_sources() {
        let settings = Settings::with_environment(None, env(&[])).unwrap();
        assert_eq!(
            settings.max_templated_field_length().unwrap(),
            DEFAULT_MAX_TEMPLATED_FIELD_LENGTH
        );
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "[core]\nmax_templated_field_length = 120").unwrap();

        let from_file = Settings::with_environment(Some(file.path()), env(&[])).unwrap();
        assert_eq!(from_file.max_templated_field_length().unwrap(), 120);

        let overridden = Settings::with_environment(
            Some(file.path()),
            env(&[("FIELDCANON__CORE__MAX_TEMPLATED_FIELD_LENGTH", "1")]),
        )
        .unwrap();
        assert_eq!(overridden.max_templated_field_length().unwrap(), 1);
    }

    #[test]
    fn missing_and_invalid_options() {
        let settings = Settings::with_environment(
            None,
            env(&[("FIELDCANON__CORE__BROKEN", "not-a-number")]),
        )
        .unwrap();
        assert!(matches!(
            settings.get_int("core", "absent"),
            Err(ConfigError::Missing { .. })
        ));
        assert!(matches!(
            settings.get_int("core", "broken"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn static_config_lookup() {
        let source = StaticConfig::new().with_int("core", "max_templated_field_length", 90);
        assert_eq!(source.get_int("core", "max_templated_field_length").unwrap(), 90);
        assert!(source.get_int("core", "other").is_err());
    }
}
