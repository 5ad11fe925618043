//! Allowed-method resolution.
//!
//! Methods are either a fixed list or computed per request by a
//! [`MethodsProvider`]. Both forms are resolved through
//! [`MethodResolver::resolve`], so the decision engine never needs to know
//! which one is configured.

use crate::types::Request;
use std::fmt;
use std::sync::Arc;

/// Methods allowed when nothing else is configured.
pub const DEFAULT_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Computes the allowed methods for a request.
///
/// Implemented for plain closures and for user types:
///
/// ```
/// use corsgate_middleware::cors::MethodsProvider;
/// use corsgate_middleware::Request;
///
/// struct ReadOnly;
///
/// impl MethodsProvider for ReadOnly {
///     fn methods(&self, _request: &Request) -> Vec<String> {
///         vec!["GET".into(), "HEAD".into()]
///     }
/// }
/// ```
///
/// Providers are called once per preflight and must not depend on shared
/// mutable state.
pub trait MethodsProvider: Send + Sync + 'static {
    /// Returns the methods allowed for `request`.
    fn methods(&self, request: &Request) -> Vec<String>;
}

impl<F> MethodsProvider for F
where
    F: Fn(&Request) -> Vec<String> + Send + Sync + 'static,
{
    fn methods(&self, request: &Request) -> Vec<String> {
        self(request)
    }
}

/// Static or per-request method policy.
#[derive(Clone)]
pub enum MethodResolver {
    /// A fixed list, kept in configured order.
    Static(Vec<String>),
    /// Computed from each request.
    Dynamic(Arc<dyn MethodsProvider>),
}

impl MethodResolver {
    /// Builds a static resolver, dropping duplicates and keeping order.
    pub fn fixed<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for method in methods {
            let method = method.into();
            if !list.contains(&method) {
                list.push(method);
            }
        }
        Self::Static(list)
    }

    /// Builds a dynamic resolver from a provider.
    pub fn dynamic(provider: impl MethodsProvider) -> Self {
        Self::Dynamic(Arc::new(provider))
    }

    /// Resolves the allowed methods for `request`.
    pub fn resolve(&self, request: &Request) -> Vec<String> {
        match self {
            Self::Static(methods) => methods.clone(),
            Self::Dynamic(provider) => provider.methods(request),
        }
    }

    /// Returns true when methods are computed per request.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl Default for MethodResolver {
    fn default() -> Self {
        Self::fixed(DEFAULT_METHODS)
    }
}

impl fmt::Debug for MethodResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(methods) => f.debug_tuple("Static").field(methods).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Returns true if `method` is in `allowed`. Comparison is case-sensitive.
pub fn is_method_allowed(method: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|m| m == method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_default_methods() {
        let resolver = MethodResolver::default();
        assert!(!resolver.is_dynamic());
        assert_eq!(
            resolver.resolve(&request("/")),
            vec!["GET", "POST", "PUT", "PATCH", "DELETE"]
        );
    }

    #[test]
    fn test_fixed_drops_duplicates() {
        let resolver = MethodResolver::fixed(["GET", "POST", "GET"]);
        assert_eq!(resolver.resolve(&request("/")), vec!["GET", "POST"]);
    }

    #[test]
    fn test_closure_provider_sees_request() {
        let resolver = MethodResolver::dynamic(|req: &Request| {
            if req.uri().path().starts_with("/admin") {
                vec!["GET".to_string(), "DELETE".to_string()]
            } else {
                vec!["GET".to_string()]
            }
        });

        assert!(resolver.is_dynamic());
        assert_eq!(resolver.resolve(&request("/admin/users")), vec!["GET", "DELETE"]);
        assert_eq!(resolver.resolve(&request("/public")), vec!["GET"]);
    }

    #[test]
    fn test_struct_provider() {
        struct Counting(Arc<AtomicUsize>);

        impl MethodsProvider for Counting {
            fn methods(&self, _request: &Request) -> Vec<String> {
                self.0.fetch_add(1, Ordering::SeqCst);
                vec!["GET".into(), "POST".into(), "DELETE".into()]
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = MethodResolver::dynamic(Counting(calls.clone()));
        assert_eq!(resolver.resolve(&request("/")).len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_membership_is_case_sensitive() {
        let allowed = vec!["GET".to_string(), "DELETE".to_string()];
        assert!(is_method_allowed("DELETE", &allowed));
        assert!(!is_method_allowed("delete", &allowed));
        assert!(!is_method_allowed("PUT", &allowed));
    }
}
