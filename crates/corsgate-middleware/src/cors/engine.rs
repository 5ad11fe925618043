//! The CORS decision engine.
//!
//! [`CorsSettings::evaluate`] looks at a request and decides, without side
//! effects beyond a dynamic method lookup, what the middleware has to do:
//!
//! ```text
//! no Origin / empty policy ──────────────────────────► PassThrough
//! OPTIONS + Access-Control-Request-Method
//!     origin ─► method ─► headers ──ok──────────────► Preflight(headers)
//!                 └──────────┴──────fail────────────► Reject(failure)
//! any other request with Origin
//!     origin ──ok───────────────────────────────────► Actual(headers)
//!        └─────fail─────────────────────────────────► Reject(failure)
//! ```

use super::failure::{CorsFailure, DefaultErrorHandler, ErrorHandler};
use super::headers::{names, parse_request_headers, HeaderPolicy};
use super::methods::{is_method_allowed, MethodResolver};
use super::origin::{OriginPolicy, ANY_ORIGIN};
use crate::types::{Request, Response, ResponseExt};
use corsgate_telemetry::fields;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How a request relates to CORS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// No `Origin` header.
    NonCors,
    /// `OPTIONS` with `Origin` and `Access-Control-Request-Method`.
    Preflight,
    /// Any other request carrying `Origin`.
    Actual,
}

impl RequestKind {
    /// Lower-case label used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonCors => "non_cors",
            Self::Preflight => "preflight",
            Self::Actual => "actual",
        }
    }
}

/// Classifies a request.
pub fn classify(request: &Request) -> RequestKind {
    let headers = request.headers();
    if !headers.contains_key(names::ORIGIN) {
        RequestKind::NonCors
    } else if request.method() == Method::OPTIONS && headers.contains_key(names::REQUEST_METHOD) {
        RequestKind::Preflight
    } else {
        RequestKind::Actual
    }
}

/// What the middleware must do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsDecision {
    /// Call the next handler and leave the response alone.
    PassThrough,
    /// Answer the preflight with status 200 and these headers; do not call the next handler.
    Preflight(HeaderMap),
    /// Call the next handler, then attach these headers to its response.
    Actual(HeaderMap),
    /// Answer with the error handler's response; do not call the next handler.
    Reject(CorsFailure),
}

/// Immutable CORS configuration and the logic that applies it.
///
/// Cloning is cheap; dynamic method providers and the error handler are shared.
#[derive(Clone)]
pub struct CorsSettings {
    pub(crate) origins: OriginPolicy,
    pub(crate) methods: MethodResolver,
    pub(crate) headers: HeaderPolicy,
    pub(crate) credentials: bool,
    pub(crate) max_age: Option<Duration>,
    pub(crate) error_handler: Arc<dyn ErrorHandler>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            origins: OriginPolicy::any(),
            methods: MethodResolver::default(),
            headers: HeaderPolicy::default(),
            credentials: false,
            max_age: None,
            error_handler: Arc::new(DefaultErrorHandler),
        }
    }
}

impl fmt::Debug for CorsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorsSettings")
            .field("origins", &self.origins)
            .field("methods", &self.methods)
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl CorsSettings {
    /// The allowed-origin policy.
    pub fn origins(&self) -> &OriginPolicy {
        &self.origins
    }

    /// The method policy.
    pub fn methods(&self) -> &MethodResolver {
        &self.methods
    }

    /// The header policy.
    pub fn headers(&self) -> &HeaderPolicy {
        &self.headers
    }

    /// Whether credentialed requests are allowed.
    pub fn credentials(&self) -> bool {
        self.credentials
    }

    /// Preflight cache duration, if configured.
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Decides whether `origin` is allowed by the origin policy.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.origins.is_origin_allowed(origin)
    }

    /// Decides what to do with `request`.
    pub fn evaluate(&self, request: &Request) -> CorsDecision {
        let kind = classify(request);
        if kind == RequestKind::NonCors || self.origins.is_empty() {
            return CorsDecision::PassThrough;
        }

        let outcome = match kind {
            RequestKind::Preflight => self.preflight(request).map(CorsDecision::Preflight),
            _ => self.actual(request).map(CorsDecision::Actual),
        };
        outcome.unwrap_or_else(CorsDecision::Reject)
    }

    /// Builds the terminal response for a successful preflight.
    pub fn preflight_response(&self, headers: HeaderMap) -> Response {
        let mut response = Response::empty(StatusCode::OK);
        *response.headers_mut() = headers;
        response
    }

    /// Builds the response for a failed check through the error handler.
    pub fn error_response(&self, request: &Request, failure: &CorsFailure) -> Response {
        let response = Response::empty(StatusCode::UNAUTHORIZED);
        self.error_handler.handle(request, response, failure)
    }

    // The raw value is echoed untouched; the lossy string is only for matching.
    fn check_origin(&self, request: &Request) -> Result<HeaderValue, CorsFailure> {
        let raw = request.headers().get(names::ORIGIN);
        let origin = header_lossy(request, names::ORIGIN).unwrap_or_default();
        match raw {
            Some(value) if self.origins.is_origin_allowed(&origin) => Ok(value.clone()),
            _ => Err(CorsFailure::OriginNotAllowed {
                origin: origin.into_owned(),
            }),
        }
    }

    fn preflight(&self, request: &Request) -> Result<HeaderMap, CorsFailure> {
        let origin = self.check_origin(request)?;

        let method = header_lossy(request, names::REQUEST_METHOD).unwrap_or_default();
        let method = method.trim();
        let allowed = self.methods.resolve(request);
        if !is_method_allowed(method, &allowed) {
            return Err(CorsFailure::MethodNotAllowed {
                method: method.to_string(),
                allowed,
            });
        }

        let raw_headers = header_lossy(request, names::REQUEST_HEADERS);
        let requested = raw_headers
            .as_deref()
            .map(parse_request_headers)
            .unwrap_or_default();
        if let Some(header) = self.headers.first_disallowed(&requested) {
            return Err(CorsFailure::HeaderNotAllowed {
                header: header.to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(names::ALLOW_ORIGIN, self.allow_origin_value(origin));
        if !allowed.is_empty() {
            set_header(&mut headers, names::ALLOW_METHODS, &allowed.join(","));
        }
        let allow_headers = if requested.is_empty() {
            self.headers.allow().join(",")
        } else {
            requested.join(",")
        };
        if !allow_headers.is_empty() {
            set_header(&mut headers, names::ALLOW_HEADERS, &allow_headers);
        }
        if self.credentials {
            set_header(&mut headers, names::ALLOW_CREDENTIALS, "true");
        }
        if let Some(max_age) = self.max_age {
            set_header(&mut headers, names::MAX_AGE, &max_age.as_secs().to_string());
        }
        Ok(headers)
    }

    fn actual(&self, request: &Request) -> Result<HeaderMap, CorsFailure> {
        let origin = self.check_origin(request)?;

        let mut headers = HeaderMap::new();
        headers.insert(names::ALLOW_ORIGIN, self.allow_origin_value(origin));
        if self.credentials {
            set_header(&mut headers, names::ALLOW_CREDENTIALS, "true");
        }
        if let Some(expose) = self.headers.expose_value() {
            set_header(&mut headers, names::EXPOSE_HEADERS, &expose);
        }
        set_header(&mut headers, names::VARY, "Origin");
        Ok(headers)
    }

    // Credentialed responses must name the origin; browsers reject `*` there.
    fn allow_origin_value(&self, origin: HeaderValue) -> HeaderValue {
        if self.origins.allows_any() && !self.credentials {
            HeaderValue::from_static(ANY_ORIGIN)
        } else {
            origin
        }
    }
}

/// Copies CORS headers onto a downstream response.
///
/// Every header replaces the handler's value except `Vary`, which gains
/// `Origin` while keeping whatever the handler already listed.
pub fn attach_headers(response: &mut Response, cors_headers: &HeaderMap) {
    let target = response.headers_mut();
    for (name, value) in cors_headers {
        if name.as_str() == names::VARY {
            merge_vary(target, value);
        } else {
            target.insert(name.clone(), value.clone());
        }
    }
}

fn merge_vary(headers: &mut HeaderMap, value: &HeaderValue) {
    let wanted = value.to_str().unwrap_or_default();
    let already = headers.get_all(names::VARY).iter().any(|existing| {
        existing
            .to_str()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .any(|v| v == "*" || v.eq_ignore_ascii_case(wanted))
    });
    if !already {
        headers.append(names::VARY, value.clone());
    }
}

fn header_lossy<'r>(request: &'r Request, name: &str) -> Option<Cow<'r, str>> {
    request
        .headers()
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => {
            tracing::warn!(
                { fields::HEADER } = name,
                "skipping CORS header with a value that is not valid in HTTP"
            );
        }
    }
}
