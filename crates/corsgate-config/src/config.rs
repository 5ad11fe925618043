//! Root configuration type.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, CorsConfig, LogFormat, LoggingConfig};

/// Complete corsgate configuration.
///
/// # Example
///
/// ```
/// use corsgate_config::CorsgateConfig;
///
/// let config = CorsgateConfig::default();
/// assert!(config.cors.origin.patterns().contains(&"*".to_string()));
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CorsgateConfig {
    /// CORS policy.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CorsgateConfig {
    /// Development preset: pretty debug logs, default CORS policy.
    #[must_use]
    pub fn development() -> Self {
        Self {
            cors: CorsConfig::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
                ..LoggingConfig::default()
            },
        }
    }

    /// Production preset: JSON logs at `info`, default CORS policy.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cors.validate()?;

        if corsgate_telemetry::create_env_filter(&self.logging.level).is_err() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("invalid filter directive: '{}'", self.logging.level),
            ));
        }

        Ok(())
    }
}
