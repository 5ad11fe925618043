//! Typed configuration for corsgate.
//!
//! This crate loads the CORS policy and logging setup from:
//! - TOML and JSON files or strings
//! - Environment variable overrides
//! - `.env` files
//!
//! Unknown fields are rejected, and [`ConfigLoader::load`] validates methods,
//! header names and origin patterns before anything reaches the middleware.
//!
//! # Example
//!
//! ```no_run
//! use corsgate_config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_file("corsgate.toml")?
//!     .with_env_prefix("CORSGATE")
//!     .load()?;
//!
//! corsgate_telemetry::init_logging(&config.logging.to_log_config())?;
//! let cors = config.cors.build()?;
//! # let _ = cors;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [cors]
//! origin = ["https://app.example.com", "*.example.org"]
//! methods = ["GET", "POST", "PUT", "PATCH", "DELETE"]
//! credentials = true
//! cache = 86400
//!
//! [cors.headers]
//! allow = ["Authorization", "If-Match", "If-Unmodified-Since"]
//! expose = ["Authorization", "Etag"]
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `CORSGATE__CORS__ORIGIN=https://a.test,*.b.test`
//! - `CORSGATE__CORS__HEADERS__ALLOW=Authorization,If-Match`
//! - `CORSGATE__CORS__CACHE=none`
//! - `CORSGATE__LOGGING__LEVEL=debug`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::CorsgateConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
