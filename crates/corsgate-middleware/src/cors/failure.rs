//! CORS check failures and the error-response hook.
//!
//! A failed check is never a transport error. The engine reports it as a
//! [`CorsFailure`], and the configured [`ErrorHandler`] turns it into the
//! response that is sent back.

use crate::types::{Request, Response};
use serde::Serialize;
use thiserror::Error;

/// Why a CORS request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CorsFailure {
    /// The `Origin` header did not match any allowed pattern.
    #[error("CORS request origin is not allowed: {origin}")]
    OriginNotAllowed {
        /// The rejected origin.
        origin: String,
    },

    /// The preflight asked for a method outside the resolved set.
    #[error("CORS requested method is not supported: {method}")]
    MethodNotAllowed {
        /// The requested method.
        method: String,
        /// The methods that were allowed for this request.
        allowed: Vec<String>,
    },

    /// The preflight asked for a header outside the allow-list.
    #[error("CORS requested header is not allowed: {header}")]
    HeaderNotAllowed {
        /// The first rejected header.
        header: String,
    },
}

impl CorsFailure {
    /// Stable snake_case identifier of the failed check.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::OriginNotAllowed { .. } => "origin_not_allowed",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::HeaderNotAllowed { .. } => "header_not_allowed",
        }
    }

    /// Fixed human-readable message for the failed check.
    pub fn message(&self) -> &'static str {
        match self {
            Self::OriginNotAllowed { .. } => "CORS request origin is not allowed.",
            Self::MethodNotAllowed { .. } => "CORS requested method is not supported.",
            Self::HeaderNotAllowed { .. } => "CORS requested header is not allowed.",
        }
    }

    /// Describes the failure as a JSON object.
    ///
    /// The object carries `reason`, `message` and the variant's own fields:
    ///
    /// ```
    /// use corsgate_middleware::cors::CorsFailure;
    ///
    /// let failure = CorsFailure::HeaderNotAllowed { header: "X-Nosuch".into() };
    /// let context = failure.context();
    /// assert_eq!(context["reason"], "header_not_allowed");
    /// assert_eq!(context["header"], "X-Nosuch");
    /// assert_eq!(context["message"], "CORS requested header is not allowed.");
    /// ```
    pub fn context(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(map) = value.as_object_mut() {
            map.insert("message".to_string(), self.message().into());
        }
        value
    }
}

/// Builds the response for a failed CORS check.
///
/// `response` is a fresh response with status `401 Unauthorized` and an empty
/// body. Returning it untouched keeps the default; handlers may change the
/// status, headers or body, or return a different response entirely.
///
/// Any `Fn(&Request, Response, &CorsFailure) -> Response` closure is a handler:
///
/// ```
/// use corsgate_middleware::cors::CorsFailure;
/// use corsgate_middleware::{Request, Response};
/// use http::StatusCode;
///
/// let handler = |_req: &Request, mut res: Response, _failure: &CorsFailure| {
///     *res.status_mut() = StatusCode::FORBIDDEN;
///     res
/// };
/// # let _ = handler;
/// ```
pub trait ErrorHandler: Send + Sync + 'static {
    /// Produces the final response for `failure`.
    fn handle(&self, request: &Request, response: Response, failure: &CorsFailure) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Request, Response, &CorsFailure) -> Response + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, response: Response, failure: &CorsFailure) -> Response {
        self(request, response, failure)
    }
}

/// Keeps the prepared `401 Unauthorized` response as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, _request: &Request, response: Response, _failure: &CorsFailure) -> Response {
        response
    }
}
