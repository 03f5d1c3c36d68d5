//! Assertion contract: the ordered expectations one test case places on one
//! response
//!
//! Clauses are evaluated in declaration order against a captured
//! [`ResponseRecord`]. A case passes iff every clause holds. Soft clauses
//! (timing budgets, known-flaky exact values against live data) report as
//! Warning instead of Error.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::compare::{self, CompareOptions, Diff};
use crate::verdict::FailureKind;

/// Everything captured from one HTTP round trip. Produced once per case,
/// consumed only by contract evaluation, discarded with the case.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub status: u16,
    pub elapsed_ms: u64,
    /// Header names lowercased; values as received
    pub headers: BTreeMap<String, String>,
    pub body: String,
    json: Option<Value>,
}

impl ResponseRecord {
    /// Capture a response; the body is parsed as JSON once, here.
    #[must_use]
    pub fn new(
        status: u16,
        elapsed_ms: u64,
        headers: BTreeMap<String, String>,
        body: String,
    ) -> Self {
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            elapsed_ms,
            headers,
            body,
            json,
        }
    }

    /// Parsed JSON body, if the body was valid JSON.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Expectation on a single body field.
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
    Equals(Value),
    NotNull,
    GreaterThan(f64),
    HasLen(usize),
}

/// A single expectation clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Status code equals
    Status(u16),
    /// Round trip took no longer than this many milliseconds
    TimeWithin(u64),
    /// Header equals exactly (name matched case-insensitively)
    Header { name: String, value: String },
    /// Body field at a dotted JSON path satisfies the expectation
    Body { path: String, expect: Expect },
    /// Full body equals a golden document under comparator options
    JsonMatchesGolden {
        group: String,
        resource: String,
        options: CompareOptions,
    },
}

impl Check {
    /// Short clause description used in failure reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Status(code) => format!("status == {code}"),
            Self::TimeWithin(ms) => format!("elapsed <= {ms}ms"),
            Self::Header { name, value } => format!("header[{name}] == {value:?}"),
            Self::Body { path, expect } => match expect {
                Expect::Equals(v) => format!("body.{path} == {v}"),
                Expect::NotNull => format!("body.{path} is not null"),
                Expect::GreaterThan(t) => format!("body.{path} > {t}"),
                Expect::HasLen(n) => format!("body.{path} has {n} elements"),
            },
            Self::JsonMatchesGolden {
                group, resource, ..
            } => format!("body equals golden {group}/{resource}"),
        }
    }

    const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::TimeWithin(_) => FailureKind::TimingBudget,
            Self::JsonMatchesGolden { .. } => FailureKind::ComparisonMismatch,
            _ => FailureKind::AssertionViolation,
        }
    }
}

/// A clause plus its softness. Soft clauses are best-effort checks — they are
/// reported but carry Warning severity.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractClause {
    pub check: Check,
    pub soft: bool,
}

/// How many violated clauses to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Stop at the first violated clause
    FirstFailure,
    /// Evaluate every clause and report all violations
    #[default]
    AllFailures,
}

/// A violated clause with expected vs actual for diagnosis.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub clause: String,
    pub kind: FailureKind,
    pub soft: bool,
    pub expected: String,
    pub actual: String,
    pub diffs: Vec<Diff>,
}

/// Ordered set of expectation clauses for one test case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssertionContract {
    clauses: Vec<ContractClause>,
    pub strictness: Strictness,
}

impl AssertionContract {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn clauses(&self) -> &[ContractClause] {
        &self.clauses
    }

    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    #[must_use]
    pub fn clause(mut self, check: Check) -> Self {
        self.clauses.push(ContractClause { check, soft: false });
        self
    }

    /// Mark the most recently added clause as soft. Timing clauses are soft
    /// already; use this for known-flaky exact-value assertions against live
    /// data.
    #[must_use]
    pub fn soft(mut self) -> Self {
        if let Some(last) = self.clauses.last_mut() {
            last.soft = true;
        }
        self
    }

    #[must_use]
    pub fn status(self, code: u16) -> Self {
        self.clause(Check::Status(code))
    }

    /// Timing budgets are inherently environment-dependent, so this clause is
    /// always soft.
    #[must_use]
    pub fn time_within(self, millis: u64) -> Self {
        self.clause(Check::TimeWithin(millis)).soft()
    }

    #[must_use]
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.clause(Check::Header {
            name: name.into(),
            value: value.into(),
        })
    }

    #[must_use]
    pub fn body_equals(self, path: impl Into<String>, value: Value) -> Self {
        self.clause(Check::Body {
            path: path.into(),
            expect: Expect::Equals(value),
        })
    }

    #[must_use]
    pub fn body_not_null(self, path: impl Into<String>) -> Self {
        self.clause(Check::Body {
            path: path.into(),
            expect: Expect::NotNull,
        })
    }

    #[must_use]
    pub fn body_greater_than(self, path: impl Into<String>, threshold: f64) -> Self {
        self.clause(Check::Body {
            path: path.into(),
            expect: Expect::GreaterThan(threshold),
        })
    }

    #[must_use]
    pub fn body_has_len(self, path: impl Into<String>, len: usize) -> Self {
        self.clause(Check::Body {
            path: path.into(),
            expect: Expect::HasLen(len),
        })
    }

    #[must_use]
    pub fn matches_golden(
        self,
        group: impl Into<String>,
        resource: impl Into<String>,
        options: CompareOptions,
    ) -> Self {
        self.clause(Check::JsonMatchesGolden {
            group: group.into(),
            resource: resource.into(),
            options,
        })
    }

    /// Golden documents referenced by this contract, as `(group, resource)`.
    /// The executor preloads these before sending anything.
    #[must_use]
    pub fn golden_refs(&self) -> Vec<(String, String)> {
        self.clauses
            .iter()
            .filter_map(|c| match &c.check {
                Check::JsonMatchesGolden {
                    group, resource, ..
                } => Some((group.clone(), resource.clone())),
                _ => None,
            })
            .collect()
    }

    /// Evaluate every clause against a captured response, in declaration
    /// order. `goldens` maps `group/resource` to preloaded document text.
    #[must_use]
    pub fn evaluate(
        &self,
        record: &ResponseRecord,
        goldens: &BTreeMap<String, String>,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for clause in &self.clauses {
            if let Some(v) = eval_clause(clause, record, goldens) {
                violations.push(v);
                if self.strictness == Strictness::FirstFailure {
                    break;
                }
            }
        }
        violations
    }
}

fn eval_clause(
    clause: &ContractClause,
    record: &ResponseRecord,
    goldens: &BTreeMap<String, String>,
) -> Option<Violation> {
    let violation = |expected: String, actual: String, diffs: Vec<Diff>| Violation {
        clause: clause.check.describe(),
        kind: clause.check.failure_kind(),
        soft: clause.soft,
        expected,
        actual,
        diffs,
    };

    match &clause.check {
        Check::Status(code) => (record.status != *code)
            .then(|| violation(code.to_string(), record.status.to_string(), vec![])),
        Check::TimeWithin(ms) => (record.elapsed_ms > *ms).then(|| {
            violation(
                format!("<= {ms}ms"),
                format!("{}ms", record.elapsed_ms),
                vec![],
            )
        }),
        Check::Header { name, value } => {
            let actual = record.header(name);
            (actual != Some(value.as_str())).then(|| {
                violation(
                    format!("{value:?}"),
                    actual.map_or_else(|| "<absent>".to_string(), |v| format!("{v:?}")),
                    vec![],
                )
            })
        }
        Check::Body { path, expect } => {
            let Some(json) = record.json() else {
                return Some(violation(
                    "a JSON body".to_string(),
                    format!("unparseable body: {}", truncate(&record.body, 120)),
                    vec![],
                ));
            };
            let node = lookup_path(json, path);
            eval_expect(expect, node).map(|(expected, actual)| violation(expected, actual, vec![]))
        }
        Check::JsonMatchesGolden {
            group,
            resource,
            options,
        } => {
            let key = format!("{group}/{resource}");
            let Some(expected_doc) = goldens.get(&key) else {
                // Executor preloads goldens; reaching this means it did not.
                return Some(Violation {
                    clause: clause.check.describe(),
                    kind: FailureKind::ResourceNotFound,
                    soft: false,
                    expected: format!("golden {key} preloaded"),
                    actual: "<not loaded>".to_string(),
                    diffs: vec![],
                });
            };
            match compare::compare(expected_doc, &record.body, *options) {
                Ok(result) if result.equal => None,
                Ok(result) => Some(violation(
                    format!("body equal to {key}"),
                    format!("{} diffs", result.diffs.len()),
                    result.diffs,
                )),
                Err(e) => Some(violation(
                    format!("body comparable to {key}"),
                    e.to_string(),
                    vec![],
                )),
            }
        }
    }
}

/// Returns `Some((expected, actual))` on violation, `None` when satisfied.
fn eval_expect(expect: &Expect, node: Option<&Value>) -> Option<(String, String)> {
    match expect {
        Expect::Equals(want) => match node {
            Some(got) if compare::compare_values(want, got, CompareOptions::default()).equal => {
                None
            }
            Some(got) => Some((want.to_string(), got.to_string())),
            None => Some((want.to_string(), "<absent>".to_string())),
        },
        Expect::NotNull => match node {
            Some(Value::Null) => Some(("non-null value".to_string(), "null".to_string())),
            Some(_) => None,
            None => Some(("non-null value".to_string(), "<absent>".to_string())),
        },
        Expect::GreaterThan(threshold) => match node.and_then(Value::as_f64) {
            Some(n) if n > *threshold => None,
            Some(n) => Some((format!("> {threshold}"), n.to_string())),
            None => Some((format!("number > {threshold}"), render_node(node))),
        },
        Expect::HasLen(len) => match node {
            Some(Value::Array(items)) if items.len() == *len => None,
            Some(Value::Array(items)) => {
                Some((format!("{len} elements"), format!("{} elements", items.len())))
            }
            other => Some((format!("array of {len} elements"), render_node(other))),
        },
    }
}

/// Resolve a dotted JSON path. Segments index objects by key; on arrays a
/// numeric segment indexes by position.
#[must_use]
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.split('.') {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

fn render_node(node: Option<&Value>) -> String {
    node.map_or_else(|| "<absent>".to_string(), ToString::to_string)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(status: u16, elapsed_ms: u64, body: &str) -> ResponseRecord {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        ResponseRecord::new(status, elapsed_ms, headers, body.to_string())
    }

    fn no_goldens() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    // ── lookup_path ──

    #[test]
    fn lookup_nested_and_indexed() {
        let doc = json!({"results": [{"id": 7}, {"id": 8}], "status": "success"});
        assert_eq!(lookup_path(&doc, "status"), Some(&json!("success")));
        assert_eq!(lookup_path(&doc, "results.1.id"), Some(&json!(8)));
        assert_eq!(lookup_path(&doc, "results.2.id"), None);
        assert_eq!(lookup_path(&doc, "missing"), None);
        assert_eq!(lookup_path(&doc, "status.deeper"), None);
    }

    // ── individual clauses ──

    #[test]
    fn status_clause() {
        let contract = AssertionContract::new().status(200);
        assert!(contract.evaluate(&record(200, 10, "{}"), &no_goldens()).is_empty());

        let violations = contract.evaluate(&record(401, 10, "{}"), &no_goldens());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, FailureKind::AssertionViolation);
        assert_eq!(violations[0].expected, "200");
        assert_eq!(violations[0].actual, "401");
    }

    #[test]
    fn timing_clause_is_soft() {
        let contract = AssertionContract::new().time_within(1500);
        assert!(contract.evaluate(&record(200, 1500, "{}"), &no_goldens()).is_empty());

        let violations = contract.evaluate(&record(200, 1893, "{}"), &no_goldens());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, FailureKind::TimingBudget);
        assert!(violations[0].soft);
        assert_eq!(violations[0].actual, "1893ms");
    }

    #[test]
    fn header_clause_name_case_insensitive() {
        let contract = AssertionContract::new().header("Content-Type", "application/json");
        assert!(contract.evaluate(&record(200, 10, "{}"), &no_goldens()).is_empty());

        let charset = AssertionContract::new()
            .header("Content-Type", "application/json;charset=utf-8");
        let violations = charset.evaluate(&record(200, 10, "{}"), &no_goldens());
        assert_eq!(violations.len(), 1, "value comparison is exact");
    }

    #[test]
    fn header_clause_missing_header() {
        let contract = AssertionContract::new().header("X-Request-Id", "abc");
        let violations = contract.evaluate(&record(200, 10, "{}"), &no_goldens());
        assert_eq!(violations[0].actual, "<absent>");
    }

    #[test]
    fn body_equals_clause() {
        let contract = AssertionContract::new()
            .body_equals("status", json!("failure"))
            .body_equals("code", json!(400));
        let ok = record(400, 10, r#"{"status": "failure", "code": 400}"#);
        assert!(contract.evaluate(&ok, &no_goldens()).is_empty());

        let bad = record(400, 10, r#"{"status": "success", "code": 400}"#);
        let violations = contract.evaluate(&bad, &no_goldens());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].expected, "\"failure\"");
        assert_eq!(violations[0].actual, "\"success\"");
    }

    #[test]
    fn body_equals_is_numeric() {
        // cost serialized as 0 or 0.0 must both satisfy Equals(0.0)
        let contract = AssertionContract::new().body_equals("cost", json!(0.0));
        assert!(contract
            .evaluate(&record(200, 10, r#"{"cost": 0}"#), &no_goldens())
            .is_empty());
    }

    #[test]
    fn body_not_null_clause() {
        let contract = AssertionContract::new().body_not_null("aisles");
        assert!(contract
            .evaluate(&record(200, 10, r#"{"aisles": []}"#), &no_goldens())
            .is_empty());

        for body in [r#"{"aisles": null}"#, r#"{}"#] {
            let violations = contract.evaluate(&record(200, 10, body), &no_goldens());
            assert_eq!(violations.len(), 1, "body: {body}");
        }
    }

    #[test]
    fn body_greater_than_clause() {
        let contract = AssertionContract::new().body_greater_than("probability", 0.6);
        assert!(contract
            .evaluate(&record(200, 10, r#"{"probability": 0.92}"#), &no_goldens())
            .is_empty());

        let violations = contract
            .evaluate(&record(200, 10, r#"{"probability": 0.4}"#), &no_goldens());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].actual, "0.4");

        let not_a_number = contract
            .evaluate(&record(200, 10, r#"{"probability": "high"}"#), &no_goldens());
        assert_eq!(not_a_number.len(), 1);
    }

    #[test]
    fn body_has_len_clause() {
        let contract = AssertionContract::new().body_has_len("results", 3);
        assert!(contract
            .evaluate(&record(200, 10, r#"{"results": [1, 2, 3]}"#), &no_goldens())
            .is_empty());

        let violations =
            contract.evaluate(&record(200, 10, r#"{"results": [1]}"#), &no_goldens());
        assert_eq!(violations[0].actual, "1 elements");
    }

    #[test]
    fn body_clause_on_unparseable_body() {
        let contract = AssertionContract::new().body_equals("status", json!("success"));
        let violations = contract.evaluate(&record(200, 10, "<html>oops</html>"), &no_goldens());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].actual.contains("unparseable"));
    }

    // ── golden comparison ──

    #[test]
    fn golden_clause_with_diffs() {
        let contract = AssertionContract::new().matches_golden(
            "recipes",
            "expected.json",
            CompareOptions::ignoring_array_order(),
        );
        let mut goldens = BTreeMap::new();
        goldens.insert(
            "recipes/expected.json".to_string(),
            r#"{"results": [1, 2, 3]}"#.to_string(),
        );

        let ok = record(200, 10, r#"{"results": [3, 1, 2]}"#);
        assert!(contract.evaluate(&ok, &goldens).is_empty());

        let bad = record(200, 10, r#"{"results": [1, 2, 9]}"#);
        let violations = contract.evaluate(&bad, &goldens);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, FailureKind::ComparisonMismatch);
        assert!(!violations[0].diffs.is_empty());
    }

    #[test]
    fn golden_clause_not_preloaded_is_resource_error() {
        let contract = AssertionContract::new().matches_golden(
            "recipes",
            "expected.json",
            CompareOptions::default(),
        );
        let violations = contract.evaluate(&record(200, 10, "{}"), &no_goldens());
        assert_eq!(violations[0].kind, FailureKind::ResourceNotFound);
    }

    #[test]
    fn golden_refs_lists_referenced_documents() {
        let contract = AssertionContract::new()
            .status(200)
            .matches_golden("recipes", "expected.json", CompareOptions::default());
        assert_eq!(
            contract.golden_refs(),
            vec![("recipes".to_string(), "expected.json".to_string())]
        );
    }

    // ── strictness & soft marking ──

    #[test]
    fn all_failures_reports_every_violation() {
        let contract = AssertionContract::new()
            .status(200)
            .body_equals("status", json!("success"));
        let violations = contract.evaluate(
            &record(401, 10, r#"{"status": "failure"}"#),
            &no_goldens(),
        );
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn first_failure_stops_at_first_violation() {
        let contract = AssertionContract::new()
            .status(200)
            .body_equals("status", json!("success"))
            .with_strictness(Strictness::FirstFailure);
        let violations = contract.evaluate(
            &record(401, 10, r#"{"status": "failure"}"#),
            &no_goldens(),
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].clause.contains("status == 200"));
    }

    #[test]
    fn soft_marks_the_last_clause_only() {
        let contract = AssertionContract::new()
            .body_equals("totalResults", json!(175))
            .soft()
            .body_has_len("results", 3);
        let clauses = contract.clauses();
        assert!(clauses[0].soft);
        assert!(!clauses[1].soft);
    }

    #[test]
    fn clause_descriptions() {
        let contract = AssertionContract::new()
            .status(200)
            .time_within(1500)
            .header("Content-Type", "application/json")
            .body_not_null("hash")
            .matches_golden("recipes", "expected.json", CompareOptions::default());
        let described: Vec<String> = contract
            .clauses()
            .iter()
            .map(|c| c.check.describe())
            .collect();
        assert_eq!(described[0], "status == 200");
        assert_eq!(described[1], "elapsed <= 1500ms");
        assert_eq!(described[2], "header[Content-Type] == \"application/json\"");
        assert_eq!(described[3], "body.hash is not null");
        assert_eq!(described[4], "body equals golden recipes/expected.json");
    }
}
