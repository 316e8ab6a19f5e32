//! Path and query-string assembly for endpoint wrappers.

use std::fmt::Display;

use url::form_urlencoded;

/// Percent-encode one path segment (an id interpolated into a route).
pub fn segment(value: impl Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

/// `application/x-www-form-urlencoded` query builder that only emits the
/// parameters that are actually present.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: &str, value: impl Display) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Push `key` only when `value` is present and non-empty.
    pub fn push_opt(self, key: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Append the query to `path`; no `?` is added when nothing was pushed.
    pub fn to_path(&self, path: &str) -> String {
        if self.pairs.is_empty() {
            return path.to_string();
        }
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        format!("{path}?{encoded}")
    }
}
