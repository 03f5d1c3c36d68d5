//! Reusable request specification shared across test cases
//!
//! A [`RequestSpec`] is built once per run and never mutated. Cases needing a
//! different baseline (e.g. asserting the unauthorized path) derive their own
//! copy with [`RequestSpec::without_param`] — there is no shared mutable
//! specification for one case to leak into the next.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default attributes composed into every outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    base_url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl RequestSpec {
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> RequestSpecBuilder {
        RequestSpecBuilder {
            base_url: base_url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Derive a new spec with every occurrence of `key` removed from the
    /// default query parameters. Pure: `self` is untouched.
    #[must_use]
    pub fn without_param(&self, key: &str) -> Self {
        Self {
            base_url: self.base_url.clone(),
            query: self
                .query
                .iter()
                .filter(|(k, _)| k != key)
                .cloned()
                .collect(),
            headers: self.headers.clone(),
        }
    }
}

/// Builder for [`RequestSpec`] with input validation.
pub struct RequestSpecBuilder {
    base_url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl RequestSpecBuilder {
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Finalize the spec.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not absolute http(s) or any query key
    /// is empty.
    pub fn build(self) -> Result<RequestSpec, SpecError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SpecError::InvalidBaseUrl(self.base_url));
        }
        if self.query.iter().any(|(k, _)| k.is_empty()) {
            return Err(SpecError::EmptyParamKey);
        }
        Ok(RequestSpec {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            query: self.query,
            headers: self.headers,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("base URL must be absolute http(s): {0}")]
    InvalidBaseUrl(String),
    #[error("query parameter keys must be non-empty")]
    EmptyParamKey,
}

/// Per-case additions layered on top of a [`RequestSpec`].
///
/// Merged with, not replacing, the base spec: the base `apiKey` persists
/// unless the owning case derives a spec without it.
#[derive(Debug, Clone, Default)]
pub struct CaseOverride {
    /// Extra query parameters (appended after the spec defaults)
    pub query: Vec<(String, String)>,
    /// Values substituted into `{name}` segments of the path template
    pub path_params: Vec<(String, String)>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// JSON request body for write operations
    pub body: Option<Value>,
}

impl CaseOverride {
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Merge base spec query parameters with a case's extras, in declaration
/// order: spec defaults first, then overrides.
#[must_use]
pub fn merged_query(spec: &RequestSpec, over: &CaseOverride) -> Vec<(String, String)> {
    let mut out = spec.query().to_vec();
    out.extend(over.query.iter().cloned());
    out
}

/// Fill `{name}` placeholders in a path template from the override's path
/// parameters. Unknown placeholders are left as-is so the request fails
/// loudly server-side rather than silently dropping a segment.
#[must_use]
pub fn fill_path(template: &str, params: &[(String, String)]) -> String {
    let mut path = template.to_string();
    for (key, value) in params {
        path = path.replace(&format!("{{{key}}}"), value);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_spec() -> RequestSpec {
        RequestSpec::builder("https://api.spoonacular.com")
            .query_param("apiKey", "secret")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_validates_base_url() {
        let err = RequestSpec::builder("api.spoonacular.com").build();
        assert!(matches!(err, Err(SpecError::InvalidBaseUrl(_))));
    }

    #[test]
    fn builder_rejects_empty_param_key() {
        let err = RequestSpec::builder("https://api.spoonacular.com")
            .query_param("", "v")
            .build();
        assert!(matches!(err, Err(SpecError::EmptyParamKey)));
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let spec = RequestSpec::builder("https://api.spoonacular.com/")
            .build()
            .unwrap();
        assert_eq!(spec.base_url(), "https://api.spoonacular.com");
    }

    #[test]
    fn without_param_does_not_mutate_source() {
        let spec = base_spec();
        let derived = spec.without_param("apiKey");

        assert!(derived.query().iter().all(|(k, _)| k != "apiKey"));
        // The original still carries the key
        assert!(spec.query().iter().any(|(k, _)| k == "apiKey"));
    }

    #[test]
    fn without_param_removes_all_occurrences() {
        let spec = RequestSpec::builder("https://api.spoonacular.com")
            .query_param("apiKey", "a")
            .query_param("apiKey", "b")
            .query_param("hash", "h")
            .build()
            .unwrap();
        let derived = spec.without_param("apiKey");
        assert_eq!(derived.query(), &[("hash".to_string(), "h".to_string())]);
    }

    #[test]
    fn merged_query_keeps_base_then_extras() {
        let spec = base_spec();
        let over = CaseOverride::default()
            .query_param("query", "bread")
            .query_param("number", "3");

        let merged = merged_query(&spec, &over);
        assert_eq!(merged[0].0, "apiKey");
        assert_eq!(merged[1], ("query".to_string(), "bread".to_string()));
        assert_eq!(merged[2], ("number".to_string(), "3".to_string()));
    }

    #[test]
    fn fill_path_substitutes_placeholders() {
        let over = CaseOverride::default()
            .path_param("username", "murphy-erdman19")
            .path_param("start-date", "2022-02-06")
            .path_param("end-date", "2022-02-28");

        let path = fill_path(
            "/mealplanner/{username}/shopping-list/{start-date}/{end-date}",
            &over.path_params,
        );
        assert_eq!(
            path,
            "/mealplanner/murphy-erdman19/shopping-list/2022-02-06/2022-02-28"
        );
    }

    #[test]
    fn fill_path_leaves_unknown_placeholders() {
        let path = fill_path("/items/{id}", &[]);
        assert_eq!(path, "/items/{id}");
    }
}
