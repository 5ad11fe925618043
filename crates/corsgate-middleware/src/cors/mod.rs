//! CORS policy model and decision engine.
//!
//! The pieces compose bottom-up:
//!
//! - [`glob`] matches wildcard origin patterns
//! - [`OriginPolicy`], [`MethodResolver`] and [`HeaderPolicy`] hold the configuration
//! - [`CorsSettings::evaluate`] turns a request into a [`CorsDecision`]
//! - [`ErrorHandler`] shapes the response for a [`CorsFailure`]
//!
//! The middleware stage in [`crate::stages::cors`] only executes decisions.

mod engine;
mod failure;
pub mod glob;
mod headers;
mod methods;
mod origin;

pub use engine::{attach_headers, classify, CorsDecision, CorsSettings, RequestKind};
pub use failure::{CorsFailure, DefaultErrorHandler, ErrorHandler};
pub use headers::{names, parse_request_headers, HeaderPolicy};
pub use methods::{is_method_allowed, MethodResolver, MethodsProvider, DEFAULT_METHODS};
pub use origin::{OriginPolicy, ANY_ORIGIN};
