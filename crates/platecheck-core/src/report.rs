//! Run reports: per-case and suite-level results
//!
//! These types are the persisted/printed output of a run. `summary.json`
//! under the report directory is a serialized [`SuiteReport`]; the `schema`
//! subcommand emits the JSON Schema for it so downstream tooling can validate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::verdict::{CaseFailure, RequestSnapshot, ResponseSnapshot, Severity, Verdict};

/// Result of a single executed (or planned) test case.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaseReport {
    /// Random hex id, shared by this case's failures and repro entries
    pub id: String,
    /// Case name, e.g. "search_recipes_bread"
    pub name: String,
    /// Suite group, e.g. "recipes" or "mealplanner"
    pub group: String,
    pub method: String,
    /// Full URL after path-parameter substitution, without the query string
    pub url: String,
    /// Response status (absent on transport failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Round-trip time (absent on transport failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    /// The request as sent, for transcripts and reproduction
    pub request: RequestSnapshot,
    /// The response as received (absent on transport failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CaseFailure>,
}

impl CaseReport {
    /// A case passed when no failure of Error severity or above was recorded.
    /// Soft violations (warnings) leave the case passing.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.iter().all(|f| f.severity < Severity::Error)
    }

    /// Highest severity among this case's failures.
    #[must_use]
    pub fn worst_severity(&self) -> Option<Severity> {
        self.failures.iter().map(|f| f.severity).max()
    }
}

/// Complete result of one suite run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    /// Target the suite ran against
    pub base_url: String,
    /// Cases executed
    pub total: u64,
    /// Cases with no Error-or-above failure
    pub passed: u64,
    pub cases: Vec<CaseReport>,
    pub verdict: Verdict,
}

impl SuiteReport {
    /// Build the suite report from finished case reports.
    #[must_use]
    pub fn from_cases(
        base_url: impl Into<String>,
        cases: Vec<CaseReport>,
        verdict: Verdict,
    ) -> Self {
        let total = cases.len() as u64;
        let passed = cases.iter().filter(|c| c.passed()).count() as u64;
        Self {
            base_url: base_url.into(),
            total,
            passed,
            cases,
            verdict,
        }
    }

    /// All failures across all cases, in case order.
    #[must_use]
    pub fn failures(&self) -> Vec<&CaseFailure> {
        self.cases.iter().flat_map(|c| c.failures.iter()).collect()
    }
}

/// Generate JSON Schema for the suite report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
