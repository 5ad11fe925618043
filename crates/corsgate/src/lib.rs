//! # Corsgate
//!
//! CORS middleware for `http`-based request pipelines.
//!
//! ## Quick Start
//!
//! ```rust
//! use corsgate::prelude::*;
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let config = ConfigLoader::new()
//!     .with_string(r#"
//!         [cors]
//!         origin = ["*.example.com"]
//!         credentials = true
//!     "#, "toml")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! let pipeline = Pipeline::builder()
//!     .stage(config.cors.build().unwrap())
//!     .build();
//!
//! let request = http::Request::builder()
//!     .uri("/api")
//!     .header("origin", "https://app.example.com")
//!     .body(Default::default())
//!     .unwrap();
//!
//! let response = pipeline
//!     .process(MiddlewareContext::new(), request, |_ctx, _req| {
//!         Box::pin(async { Response::text(StatusCode::OK, "Success") })
//!     })
//!     .await;
//!
//! assert_eq!(response.headers()["access-control-allow-credentials"], "true");
//! # });
//! ```
//!
//! ## Crates
//!
//! | crate | re-exported as |
//! |-------|----------------|
//! | `corsgate-middleware` | [`middleware`] |
//! | `corsgate-config` | [`config`] |
//! | `corsgate-telemetry` | [`telemetry`] |

#![doc(html_root_url = "https://docs.rs/corsgate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export middleware types
pub use corsgate_middleware as middleware;

// Re-export configuration types
pub use corsgate_config as config;

// Re-export logging setup
pub use corsgate_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use corsgate::prelude::*;
/// ```
pub mod prelude {
    pub use corsgate_middleware::cors::{
        CorsDecision, CorsFailure, CorsSettings, ErrorHandler, MethodsProvider, RequestKind,
    };
    pub use corsgate_middleware::{
        BoxFuture, CorsBuilder, CorsMiddleware, Middleware, MiddlewareContext, Next, Pipeline,
        Request, Response, ResponseExt,
    };

    pub use corsgate_config::{ConfigError, ConfigLoader, CorsConfig, CorsgateConfig};

    pub use corsgate_telemetry::{init_logging, LogConfig};
}
