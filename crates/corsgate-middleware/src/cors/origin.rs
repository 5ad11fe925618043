//! Allowed-origin policy.

use super::glob::{glob_match, is_glob};

/// The literal pattern that admits every origin.
pub const ANY_ORIGIN: &str = "*";

/// An ordered list of allowed-origin patterns.
///
/// Each pattern is either an exact origin (`https://app.example.com`), the
/// literal `*`, or a wildcard pattern (`*.example.com`). An empty policy admits
/// nothing and switches the middleware into pass-through mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    patterns: Vec<String>,
}

impl OriginPolicy {
    /// Creates a policy from patterns, keeping their order and dropping duplicates.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::default();
        for pattern in patterns {
            policy.push(pattern);
        }
        policy
    }

    /// A policy that admits every origin.
    #[must_use]
    pub fn any() -> Self {
        Self::new([ANY_ORIGIN])
    }

    /// Appends a pattern unless it is already present.
    pub fn push(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// Returns the configured patterns in order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true when no pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true when the literal `*` pattern is configured.
    pub fn allows_any(&self) -> bool {
        self.patterns.iter().any(|p| p == ANY_ORIGIN)
    }

    /// Decides whether `origin` is allowed.
    ///
    /// Exact matches (case-sensitive) and the literal `*` are tried first,
    /// then wildcard patterns in configured order.
    ///
    /// ```
    /// use corsgate_middleware::cors::OriginPolicy;
    ///
    /// let policy = OriginPolicy::new(["http://www.example.com", "*.example.org"]);
    /// assert!(policy.is_origin_allowed("http://www.example.com"));
    /// assert!(policy.is_origin_allowed("https://api.example.org"));
    /// assert!(!policy.is_origin_allowed("http://www.foo.com"));
    /// ```
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.matching_pattern(origin).is_some()
    }

    /// Returns the first pattern that admits `origin`.
    pub fn matching_pattern(&self, origin: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.as_str() == ANY_ORIGIN || p.as_str() == origin)
            .or_else(|| {
                self.patterns
                    .iter()
                    .filter(|p| is_glob(p))
                    .find(|p| glob_match(p, origin))
            })
            .map(String::as_str)
    }
}
