//! Structured logging for corsgate.
//!
//! The CORS stage reports every decision through `tracing`: accepted and
//! forwarded requests at `debug`, rejections at `info`, and skipped header
//! values at `warn`. This crate installs a subscriber that renders those
//! events as JSON lines or as human-readable output.
//!
//! # Example
//!
//! ```rust,no_run
//! use corsgate_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(origin = "https://app.example.com", "ready");
//! # Ok::<(), corsgate_telemetry::TelemetryError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/corsgate-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
