//! Request/response header policy and CORS header names.

/// CORS header names.
pub mod names {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header (preflight).
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// Headers a client may send (`allow`) and headers a client may read (`expose`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderPolicy {
    allow: Vec<String>,
    expose: Vec<String>,
}

impl HeaderPolicy {
    /// Creates a policy. Order is kept; duplicates are dropped case-insensitively.
    pub fn new<A, E, S, T>(allow: A, expose: E) -> Self
    where
        A: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            allow: dedup(allow),
            expose: dedup(expose),
        }
    }

    /// Headers the client is allowed to send.
    pub fn allow(&self) -> &[String] {
        &self.allow
    }

    /// Headers exposed to the client, in configured order.
    pub fn expose(&self) -> &[String] {
        &self.expose
    }

    /// Returns true if `header` is in the allow-list, ignoring ASCII case.
    pub fn is_header_allowed(&self, header: &str) -> bool {
        self.allow.iter().any(|h| h.eq_ignore_ascii_case(header))
    }

    /// Returns the first requested header that is not allowed, if any.
    pub fn first_disallowed<'a>(&self, requested: &[&'a str]) -> Option<&'a str> {
        requested
            .iter()
            .copied()
            .find(|h| !self.is_header_allowed(h))
    }

    /// The `Access-Control-Expose-Headers` value, or `None` when nothing is exposed.
    pub fn expose_value(&self) -> Option<String> {
        (!self.expose.is_empty()).then(|| self.expose.join(","))
    }
}

/// Splits an `Access-Control-Request-Headers` value into header names.
///
/// ```
/// use corsgate_middleware::cors::parse_request_headers;
///
/// assert_eq!(
///     parse_request_headers("Authorization, If-Match ,,"),
///     vec!["Authorization", "If-Match"]
/// );
/// ```
pub fn parse_request_headers(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .collect()
}

fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into();
        if !out.iter().any(|h| h.eq_ignore_ascii_case(&item)) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> HeaderPolicy {
        HeaderPolicy::new(
            ["Authorization", "If-Match", "If-Unmodified-Since"],
            ["Authorization", "Etag"],
        )
    }

    #[test]
    fn test_allow_is_case_insensitive() {
        let policy = policy();
        assert!(policy.is_header_allowed("authorization"));
        assert!(policy.is_header_allowed("IF-MATCH"));
        assert!(!policy.is_header_allowed("X-Nosuch"));
    }

    #[test]
    fn test_first_disallowed() {
        let policy = policy();
        assert_eq!(policy.first_disallowed(&["Authorization", "If-Match"]), None);
        assert_eq!(
            policy.first_disallowed(&["Authorization", "X-Nosuch", "X-Other"]),
            Some("X-Nosuch")
        );
    }

    #[test]
    fn test_expose_value_keeps_order() {
        assert_eq!(policy().expose_value(), Some("Authorization,Etag".to_string()));
        assert_eq!(HeaderPolicy::default().expose_value(), None);
    }

    #[test]
    fn test_dedup_ignores_case() {
        let policy = HeaderPolicy::new(["X-Token", "x-token"], Vec::<String>::new());
        assert_eq!(policy.allow(), ["X-Token".to_string()]);
    }

    #[test]
    fn test_parse_request_headers() {
        assert!(parse_request_headers("").is_empty());
        assert_eq!(parse_request_headers("X-Nosuch"), vec!["X-Nosuch"]);
    }
}
