//! # Corsgate Middleware
//!
//! CORS policy engine and middleware pipeline for `http`-based services.
//!
//! ## Request Flow
//!
//! ```text
//! Request → CorsMiddleware ─┬─ preflight ok ──────────────► 200 + CORS headers
//!                           ├─ rejected ──► ErrorHandler ─► 401 (or handler's response)
//!                           └─ forwarded ─► ... ─► Handler
//!                                                     ↓
//! Response ◄── CORS headers added (actual requests) ◄─┘
//! ```
//!
//! ## Key Features
//!
//! - **Origin patterns**: exact origins, `*`, and wildcards like `*.example.com`
//! - **Dynamic methods**: allowed methods computed per request by a closure or provider
//! - **Error hook**: rejected requests get a `401` that an [`cors::ErrorHandler`] can reshape
//! - **Pure decisions**: [`cors::CorsSettings::evaluate`] has no side effects and can be
//!   used without the pipeline
//!
//! ## Example
//!
//! ```
//! use corsgate_middleware::stages::CorsMiddleware;
//! use corsgate_middleware::{MiddlewareContext, Pipeline, Response, ResponseExt};
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::builder()
//!     .stage(CorsMiddleware::builder().origin("*.example.com").build())
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
//! assert_eq!(
//!     response.headers()["access-control-allow-origin"],
//!     "https://app.example.com"
//! );
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/corsgate-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod cors;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use stages::{CorsBuilder, CorsMiddleware};
pub use types::{Request, Response, ResponseExt};
