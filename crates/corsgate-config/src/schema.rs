//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use corsgate_middleware::cors::DEFAULT_METHODS;
use corsgate_middleware::{CorsBuilder, CorsMiddleware};
use corsgate_telemetry::LogConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConfigError;

/// Allowed origins: a single pattern or a list.
///
/// Both spellings are accepted in files:
///
/// ```toml
/// origin = "*"
/// # or
/// origin = ["https://app.example.com", "*.example.org"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OriginSetting {
    /// One pattern.
    One(String),
    /// Several patterns. An empty list disables CORS handling.
    Many(Vec<String>),
}

impl OriginSetting {
    /// The configured patterns in order.
    pub fn patterns(&self) -> Vec<String> {
        match self {
            Self::One(pattern) => vec![pattern.clone()],
            Self::Many(patterns) => patterns.clone(),
        }
    }
}

impl Default for OriginSetting {
    fn default() -> Self {
        Self::One("*".to_string())
    }
}

/// Request and response header lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HeadersConfig {
    /// Headers the client may send in a CORS request.
    #[serde(default)]
    pub allow: Vec<String>,

    /// Headers the client may read from a CORS response.
    #[serde(default)]
    pub expose: Vec<String>,
}

/// CORS configuration section.
///
/// # Example
///
/// ```toml
/// [cors]
/// origin = ["*.example.com"]
/// methods = ["GET", "POST", "PUT", "PATCH", "DELETE"]
/// credentials = true
/// cache = 86400
///
/// [cors.headers]
/// allow = ["Authorization", "If-Match", "If-Unmodified-Since"]
/// expose = ["Authorization", "Etag"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origin patterns.
    #[serde(default)]
    pub origin: OriginSetting,

    /// Allowed methods.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    /// Allowed and exposed headers.
    #[serde(default)]
    pub headers: HeadersConfig,

    /// Allow credentialed requests.
    #[serde(default)]
    pub credentials: bool,

    /// Preflight cache lifetime in seconds. None omits `Access-Control-Max-Age`.
    #[serde(default)]
    pub cache: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: OriginSetting::default(),
            methods: default_methods(),
            headers: HeadersConfig::default(),
            credentials: false,
            cache: None,
        }
    }
}

fn default_methods() -> Vec<String> {
    DEFAULT_METHODS.iter().map(|m| (*m).to_string()).collect()
}

impl CorsConfig {
    /// Checks origins, methods and header names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(pattern) = self.origin.patterns().iter().find(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "cors.origin",
                format!("origin pattern must not be empty: '{pattern}'"),
            ));
        }

        for method in &self.methods {
            if method.is_empty() || http::Method::from_bytes(method.as_bytes()).is_err() {
                return Err(ConfigError::invalid_value(
                    "cors.methods",
                    format!("invalid HTTP method: '{method}'"),
                ));
            }
        }

        for (field, names) in [
            ("cors.headers.allow", &self.headers.allow),
            ("cors.headers.expose", &self.headers.expose),
        ] {
            if let Some(name) = names
                .iter()
                .find(|n| http::HeaderName::from_bytes(n.as_bytes()).is_err())
            {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("invalid header name: '{name}'"),
                ));
            }
        }

        Ok(())
    }

    /// Converts the section into a builder.
    ///
    /// Dynamic method providers and error handlers cannot be expressed in a
    /// file; attach them to the returned builder.
    pub fn to_builder(&self) -> CorsBuilder {
        let builder = CorsMiddleware::builder()
            .origins(self.origin.patterns())
            .methods(self.methods.iter().cloned())
            .allow_headers(self.headers.allow.iter().cloned())
            .expose_headers(self.headers.expose.iter().cloned())
            .credentials(self.credentials);

        match self.cache {
            Some(secs) => builder.max_age(Duration::from_secs(secs)),
            None => builder,
        }
    }

    /// Validates the section and builds the middleware.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn build(&self) -> Result<CorsMiddleware, ConfigError> {
        self.validate()?;
        Ok(self.to_builder().build())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or `target=level` lists).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts the section into a telemetry [`LogConfig`].
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            file_line_info: self.include_location,
            ..LogConfig::production()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
