//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! This stage answers preflight requests itself, rejects requests whose
//! origin, method or headers are not allowed, and decorates the responses of
//! accepted cross-origin requests with the CORS headers a browser expects.
//!
//! ## Request Flow
//!
//! | request | outcome |
//! |---------|---------|
//! | no `Origin`, or no origins configured | forwarded untouched |
//! | preflight, all checks pass | `200 OK` with CORS headers, handler not called |
//! | actual request, origin allowed | forwarded, CORS headers added to the response |
//! | any check fails | error handler response (`401` by default), handler not called |
//!
//! ## Example
//!
//! ```
//! use corsgate_middleware::stages::CorsMiddleware;
//! use std::time::Duration;
//!
//! let cors = CorsMiddleware::builder()
//!     .origin("https://app.example.com")
//!     .origin("*.example.org")
//!     .methods(["GET", "POST", "PUT", "DELETE"])
//!     .allow_headers(["Authorization", "If-Match", "If-Unmodified-Since"])
//!     .expose_headers(["Authorization", "Etag"])
//!     .credentials(true)
//!     .max_age(Duration::from_secs(3600))
//!     .build();
//!
//! assert!(cors.settings().is_origin_allowed("https://api.example.org"));
//! ```

use crate::context::MiddlewareContext;
use crate::cors::{
    attach_headers, classify, names, CorsDecision, CorsSettings, ErrorHandler, HeaderPolicy,
    MethodResolver, MethodsProvider, OriginPolicy,
};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;
use std::time::Duration;
use corsgate_telemetry::fields;
use tracing::{debug, info};

/// CORS middleware stage.
///
/// Place it first in the pipeline so preflights and rejected requests never
/// reach the rest of the stack.
///
/// `CorsMiddleware::default()` allows any origin, the methods
/// `GET, POST, PUT, PATCH, DELETE`, no request headers, and no credentials.
#[derive(Debug, Clone, Default)]
pub struct CorsMiddleware {
    settings: CorsSettings,
}

impl CorsMiddleware {
    /// Creates a new CORS builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// The settings this stage enforces.
    pub fn settings(&self) -> &CorsSettings {
        &self.settings
    }
}

impl From<CorsSettings> for CorsMiddleware {
    fn from(settings: CorsSettings) -> Self {
        Self { settings }
    }
}

/// Builder for [`CorsMiddleware`].
///
/// Unset options keep the defaults of [`CorsMiddleware::default`]. Calling
/// [`origin`](Self::origin) or [`origins`](Self::origins) replaces the
/// default `*`.
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    origins: Option<OriginPolicy>,
    settings: CorsSettings,
    allow_headers: Vec<String>,
    expose_headers: Vec<String>,
}

impl CorsBuilder {
    /// Creates a new CORS builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allowed origin pattern.
    ///
    /// Patterns are exact origins, the literal `*`, or wildcards such as
    /// `*.example.com`.
    #[must_use]
    pub fn origin(mut self, pattern: impl Into<String>) -> Self {
        self.origins.get_or_insert_with(OriginPolicy::default).push(pattern);
        self
    }

    /// Replaces the allowed origin patterns.
    ///
    /// An empty list disables CORS handling: every request is forwarded
    /// untouched.
    #[must_use]
    pub fn origins<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins = Some(OriginPolicy::new(patterns));
        self
    }

    /// Sets a fixed list of allowed methods.
    #[must_use]
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.methods = MethodResolver::fixed(methods);
        self
    }

    /// Computes the allowed methods per request with a closure.
    ///
    /// ```
    /// use corsgate_middleware::stages::CorsMiddleware;
    ///
    /// let cors = CorsMiddleware::builder()
    ///     .methods_fn(|request| {
    ///         if request.uri().path().starts_with("/admin") {
    ///             vec!["GET".into(), "DELETE".into()]
    ///         } else {
    ///             vec!["GET".into()]
    ///         }
    ///     })
    ///     .build();
    /// # let _ = cors;
    /// ```
    #[must_use]
    pub fn methods_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Request) -> Vec<String> + Send + Sync + 'static,
    {
        self.methods_provider(f)
    }

    /// Computes the allowed methods per request with a [`MethodsProvider`].
    #[must_use]
    pub fn methods_provider(mut self, provider: impl MethodsProvider) -> Self {
        self.settings.methods = MethodResolver::dynamic(provider);
        self
    }

    /// Sets the request headers a client may send.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the response headers exposed to the client.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether credentialed requests are allowed.
    ///
    /// With credentials on, `Access-Control-Allow-Origin` always echoes the
    /// request origin, even when `*` is configured.
    #[must_use]
    pub fn credentials(mut self, allow: bool) -> Self {
        self.settings.credentials = allow;
        self
    }

    /// Sets how long browsers may cache a preflight response.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.settings.max_age = Some(duration);
        self
    }

    /// Sets the handler that shapes responses to rejected requests.
    #[must_use]
    pub fn error_handler(mut self, handler: impl ErrorHandler) -> Self {
        self.settings.error_handler = Arc::new(handler);
        self
    }

    /// Builds the CORS middleware.
    #[must_use]
    pub fn build(self) -> CorsMiddleware {
        let mut settings = self.settings;
        settings.origins = self.origins.unwrap_or_else(OriginPolicy::any);
        settings.headers = HeaderPolicy::new(self.allow_headers, self.expose_headers);
        CorsMiddleware { settings }
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let kind = classify(&request);
            ctx.set_extension(kind);

            let request_id = ctx.request_id();
            let origin = request
                .headers()
                .get(names::ORIGIN)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .unwrap_or_default();

            match self.settings.evaluate(&request) {
                CorsDecision::PassThrough => {
                    debug!(
                        { fields::REQUEST_ID } = display(request_id),
                        { fields::KIND } = kind.as_str(),
                        "CORS pass-through"
                    );
                    next.run(ctx, request).await
                }
                CorsDecision::Preflight(headers) => {
                    debug!(
                        { fields::REQUEST_ID } = display(request_id),
                        { fields::ORIGIN } = origin.as_str(),
                        "CORS preflight accepted"
                    );
                    self.settings.preflight_response(headers)
                }
                CorsDecision::Actual(headers) => {
                    debug!(
                        { fields::REQUEST_ID } = display(request_id),
                        { fields::ORIGIN } = origin.as_str(),
                        { fields::PATTERN } = self.settings.origins().matching_pattern(&origin),
                        "CORS request accepted"
                    );
                    let mut response = next.run(ctx, request).await;
                    attach_headers(&mut response, &headers);
                    response
                }
                CorsDecision::Reject(failure) => {
                    info!(
                        { fields::REQUEST_ID } = display(request_id),
                        { fields::ORIGIN } = origin.as_str(),
                        { fields::REASON } = failure.reason(),
                        { fields::DETAIL } = display(&failure),
                        "{}",
                        failure.message()
                    );
                    self.settings.error_response(&request, &failure)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::{CorsFailure, RequestKind};
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Method, Request as HttpRequest, StatusCode};
    use http_body_util::{BodyExt, Full};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn create_request_with_origin(method: Method, origin: &str) -> Request {
        HttpRequest::builder()
            .method(method)
            .uri("/test")
            .header(names::ORIGIN, origin)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn create_preflight_request(origin: &str, method: &str, headers: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/test")
            .header(names::ORIGIN, origin)
            .header(names::REQUEST_METHOD, method);

        if let Some(h) = headers {
            builder = builder.header(names::REQUEST_HEADERS, h);
        }

        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn create_handler(
        called: Arc<AtomicBool>,
    ) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> {
        move |_ctx, _req| {
            called.store(true, Ordering::SeqCst);
            Box::pin(async { Response::text(StatusCode::OK, "OK") })
        }
    }

    async fn run(cors: &CorsMiddleware, request: Request) -> (Response, bool, MiddlewareContext) {
        let called = Arc::new(AtomicBool::new(false));
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(create_handler(called.clone()));
        let response = cors.process(&mut ctx, request, next).await;
        (response, called.load(Ordering::SeqCst), ctx)
    }

    /// Collects the field names of every event it sees.
    struct FieldNames(Arc<std::sync::Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FieldNames {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut names = self.0.lock().unwrap();
            names.extend(event.fields().map(|f| f.name().to_string()));
        }
    }

    fn logged_fields(cors: &CorsMiddleware, request: Request) -> Vec<String> {
        use tracing_subscriber::layer::SubscriberExt;

        let names = Arc::new(std::sync::Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(FieldNames(names.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(run(cors, request));
        });
        let names = names.lock().unwrap().clone();
        names
    }

    #[test]
    fn test_rejection_logs_shared_field_names() {
        let cors = CorsMiddleware::builder().origin("https://example.com").build();
        let names = logged_fields(&cors, create_request_with_origin(Method::GET, "https://evil.com"));

        for field in [fields::REQUEST_ID, fields::ORIGIN, fields::REASON, fields::DETAIL] {
            assert!(names.iter().any(|n| n == field), "missing {field} in {names:?}");
        }
    }

    #[test]
    fn test_accept_logs_matching_pattern() {
        let cors = CorsMiddleware::builder().origin("*.example.com").build();
        let names = logged_fields(
            &cors,
            create_request_with_origin(Method::GET, "https://app.example.com"),
        );

        assert!(names.iter().any(|n| n == fields::PATTERN));
        assert!(names.iter().any(|n| n == fields::ORIGIN));
    }

    #[test]
    fn test_builder_default() {
        let cors = CorsMiddleware::builder().build();
        let settings = cors.settings();
        assert!(settings.origins().allows_any());
        assert!(!settings.credentials());
        assert!(settings.max_age().is_none());
        assert!(settings.headers().allow().is_empty());
    }

    #[test]
    fn test_builder_origin_replaces_default() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .origin("https://app.example.com")
            .build();

        assert!(!cors.settings().origins().allows_any());
        assert!(cors.settings().is_origin_allowed("https://example.com"));
        assert!(cors.settings().is_origin_allowed("https://app.example.com"));
        assert!(!cors.settings().is_origin_allowed("https://evil.com"));
    }

    #[test]
    fn test_builder_methods() {
        let cors = CorsMiddleware::builder().methods(["GET", "POST"]).build();
        assert!(!cors.settings().methods().is_dynamic());
        assert!(cors.settings().max_age().is_none());
    }

    #[test]
    fn test_builder_max_age() {
        let cors = CorsMiddleware::builder()
            .max_age(Duration::from_secs(3600))
            .build();
        assert_eq!(cors.settings().max_age(), Some(Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_preflight_allowed_origin() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .methods(["GET", "POST"])
            .build();

        let request = create_preflight_request("https://example.com", "POST", None);
        let (response, called, ctx) = run(&cors, request).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(names::ALLOW_ORIGIN).unwrap(),
            "https://example.com"
        );
        assert_eq!(response.headers().get(names::ALLOW_METHODS).unwrap(), "GET,POST");
        assert!(response.into_body().collect().await.unwrap().to_bytes().is_empty());
        assert_eq!(ctx.get_extension::<RequestKind>(), Some(&RequestKind::Preflight));
    }

    #[tokio::test]
    async fn test_preflight_disallowed_origin() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .build();

        let request = create_preflight_request("https://evil.com", "POST", None);
        let (response, called, _) = run(&cors, request).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!response.headers().contains_key(names::ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_preflight_disallowed_method() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .methods(["GET"])
            .build();

        let request = create_preflight_request("https://example.com", "DELETE", None);
        let (response, called, _) = run(&cors, request).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_preflight_disallowed_header() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .allow_headers(["Content-Type"])
            .build();

        let request =
            create_preflight_request("https://example.com", "POST", Some("X-Forbidden-Header"));
        let (response, called, _) = run(&cors, request).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_preflight_with_credentials_and_max_age() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .credentials(true)
            .max_age(Duration::from_secs(3600))
            .build();

        let request = create_preflight_request("https://example.com", "POST", None);
        let (response, _, _) = run(&cors, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(names::ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert_eq!(response.headers().get(names::MAX_AGE).unwrap(), "3600");
    }

    #[tokio::test]
    async fn test_actual_request_adds_headers() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .credentials(true)
            .expose_headers(["X-Request-ID"])
            .build();

        let request = create_request_with_origin(Method::GET, "https://example.com");
        let (response, called, ctx) = run(&cors, request).await;

        assert!(called);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(names::ALLOW_ORIGIN).unwrap(),
            "https://example.com"
        );
        assert_eq!(
            response.headers().get(names::ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert_eq!(response.headers().get(names::EXPOSE_HEADERS).unwrap(), "X-Request-ID");
        assert_eq!(response.headers().get(names::VARY).unwrap(), "Origin");
        assert_eq!(ctx.get_extension::<RequestKind>(), Some(&RequestKind::Actual));
    }

    #[tokio::test]
    async fn test_actual_request_disallowed_origin_is_rejected() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .build();

        let request = create_request_with_origin(Method::GET, "https://evil.com");
        let (response, called, _) = run(&cors, request).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!response.headers().contains_key(names::ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_request_without_origin() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .build();

        let request = HttpRequest::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (response, called, ctx) = run(&cors, request).await;

        assert!(called);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(names::ALLOW_ORIGIN));
        assert_eq!(ctx.get_extension::<RequestKind>(), Some(&RequestKind::NonCors));
    }

    #[tokio::test]
    async fn test_default_allows_any_origin() {
        let cors = CorsMiddleware::default();

        let request = create_request_with_origin(Method::DELETE, "https://any-origin.com");
        let (response, called, _) = run(&cors, request).await;

        assert!(called);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(names::ALLOW_ORIGIN).unwrap(), "*");
    }

    #[tokio::test]
    async fn test_error_handler_sees_failure() {
        let cors = CorsMiddleware::builder()
            .origin("https://example.com")
            .error_handler(|_req: &Request, mut res: Response, failure: &CorsFailure| {
                *res.status_mut() = StatusCode::FORBIDDEN;
                res.headers_mut()
                    .insert("x-cors-reason", failure.reason().parse().unwrap());
                res
            })
            .build();

        let request = create_request_with_origin(Method::GET, "https://evil.com");
        let (response, called, _) = run(&cors, request).await;

        assert!(!called);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get("x-cors-reason").unwrap(),
            "origin_not_allowed"
        );
    }

    #[test]
    fn test_middleware_name() {
        let cors = CorsMiddleware::builder().build();
        assert_eq!(cors.name(), "cors");
    }
}
