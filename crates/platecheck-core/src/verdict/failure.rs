//! Failure kinds and structured case-failure records

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::compare::Diff;

use super::Severity;

/// What went wrong with a test case - determines default severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network/connection failure: the case fails immediately, no retry
    Transport,
    /// Golden document or fixture asset missing — fatal before any request
    ResourceNotFound,
    /// A contract clause did not hold (status, header, body field)
    AssertionViolation,
    /// Actual JSON diverged from the golden document
    ComparisonMismatch,
    /// Round trip exceeded the wall-clock budget (soft, environment-dependent)
    TimingBudget,
}

impl FailureKind {
    /// Default severity for this failure kind
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Transport | Self::ResourceNotFound => Severity::Critical,
            Self::AssertionViolation | Self::ComparisonMismatch => Severity::Error,
            Self::TimingBudget => Severity::Warning,
        }
    }

    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Transport => "Transport failure",
            Self::ResourceNotFound => "Golden document or fixture not found",
            Self::AssertionViolation => "Contract clause violated",
            Self::ComparisonMismatch => "JSON body differs from golden document",
            Self::TimingBudget => "Response time budget exceeded",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Snapshot of the HTTP request for reproduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Snapshot of the HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// One failed expectation of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaseFailure {
    /// Unique identifier for reproduction
    pub id: String,
    /// Owning test case name
    pub case: String,
    /// What went wrong
    pub kind: FailureKind,
    /// Severity level
    pub severity: Severity,
    /// The violated clause, e.g. `status == 200`
    pub clause: String,
    /// Detailed message with expected vs actual
    pub message: String,
    /// Full request for reproduction
    pub request: RequestSnapshot,
    /// Response received (absent on transport failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    /// Structural diffs (golden comparison failures only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<Diff>,
}

impl CaseFailure {
    /// Create a failure with the kind's default severity
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        case: impl Into<String>,
        kind: FailureKind,
        clause: impl Into<String>,
        message: impl Into<String>,
        request: RequestSnapshot,
    ) -> Self {
        Self {
            id: id.into(),
            case: case.into(),
            kind,
            severity: kind.default_severity(),
            clause: clause.into(),
            message: message.into(),
            request,
            response: None,
            diffs: Vec::new(),
        }
    }

    /// Add response to failure
    #[must_use]
    pub fn with_response(mut self, response: ResponseSnapshot) -> Self {
        self.response = Some(response);
        self
    }

    /// Attach comparator diffs
    #[must_use]
    pub fn with_diffs(mut self, diffs: Vec<Diff>) -> Self {
        self.diffs = diffs;
        self
    }

    /// Override severity (soft clauses downgrade to Warning)
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> RequestSnapshot {
        RequestSnapshot {
            method: "POST".to_string(),
            url: "https://api.spoonacular.com/users/connect".to_string(),
            headers: HashMap::new(),
            body: Some(r#"{"username": "random"}"#.to_string()),
        }
    }

    #[test]
    fn kind_severity_mapping() {
        assert_eq!(
            FailureKind::Transport.default_severity(),
            Severity::Critical
        );
        assert_eq!(
            FailureKind::ResourceNotFound.default_severity(),
            Severity::Critical
        );
        assert_eq!(
            FailureKind::AssertionViolation.default_severity(),
            Severity::Error
        );
        assert_eq!(
            FailureKind::ComparisonMismatch.default_severity(),
            Severity::Error
        );
        assert_eq!(
            FailureKind::TimingBudget.default_severity(),
            Severity::Warning
        );
    }

    #[test]
    fn new_failure_takes_default_severity() {
        let failure = CaseFailure::new(
            "f1",
            "connect_user",
            FailureKind::AssertionViolation,
            "status == 200",
            "expected 200, got 401",
            sample_request(),
        );
        assert_eq!(failure.severity, Severity::Error);
        assert_eq!(failure.clause, "status == 200");
        assert!(failure.response.is_none());
    }

    #[test]
    fn builder_pattern() {
        let failure = CaseFailure::new(
            "f1",
            "search_bread",
            FailureKind::AssertionViolation,
            "totalResults == 175",
            "expected 175, got 182",
            sample_request(),
        )
        .with_severity(Severity::Warning)
        .with_response(ResponseSnapshot {
            status_code: 200,
            headers: HashMap::new(),
            body: None,
            elapsed_ms: 312,
        });

        assert_eq!(failure.severity, Severity::Warning);
        assert_eq!(failure.response.unwrap().status_code, 200);
    }

    #[test]
    fn serialization_roundtrip() {
        let failure = CaseFailure::new(
            "f1",
            "get_shopping_list",
            FailureKind::ComparisonMismatch,
            "body equals getShoppingListWithItem.json",
            "1 diff",
            sample_request(),
        );
        let json = serde_json::to_string(&failure).unwrap();
        let parsed: CaseFailure = serde_json::from_str(&json).unwrap();

        assert_eq!(failure, parsed);
    }
}
