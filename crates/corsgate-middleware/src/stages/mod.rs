//! Middleware stages.
//!
//! - [`cors`] - CORS origin, method and header negotiation

pub mod cors;

pub use cors::{CorsBuilder, CorsMiddleware};
