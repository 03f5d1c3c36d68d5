//! Test case executor
//!
//! Builds each case's immutable request spec, sends it with reqwest, captures
//! the response, and evaluates the case's contract. Cases run sequentially;
//! each one operates on its own derived spec, so removing a default parameter
//! for one case cannot leak into the next.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use platecheck_core::request::{fill_path, merged_query};
use platecheck_core::{
    CaseFailure, CaseReport, Config, FailureKind, RequestSpec, ResponseRecord, ResponseSnapshot,
    RequestSnapshot, Severity, SpecError, Violation,
};

use crate::golden::GoldenLoader;
use crate::suite::TestCase;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("invalid request spec: {0}")]
    Spec(#[from] SpecError),
    #[error("HTTP client setup failed: {0}")]
    Http(String),
}

/// Sequential executor over declarative contract cases.
pub struct CaseRunner {
    base: RequestSpec,
    client: reqwest::blocking::Client,
    goldens: GoldenLoader,
    stop_on_failure: bool,
}

impl CaseRunner {
    /// Build the executor from config: base spec carries the `apiKey` default
    /// query parameter, the client a hard timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, RunnerError> {
        let base = RequestSpec::builder(&config.base_url)
            .query_param("apiKey", &config.api_key)
            .build()?;

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RunnerError::Http(e.to_string()))?;

        Ok(Self {
            base,
            client,
            goldens: GoldenLoader::new(&config.fixtures_dir),
            stop_on_failure: false,
        })
    }

    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Run a list of cases in order, reporting progress to stderr.
    #[must_use]
    pub fn run_suite(&self, cases: &[TestCase]) -> Vec<CaseReport> {
        let mut rng = SmallRng::from_entropy();
        let mut reports = Vec::with_capacity(cases.len());

        eprintln!(
            "Running {} cases against {}...",
            cases.len(),
            self.base.base_url()
        );

        for case in cases {
            let report = self.run_case(case, &mut rng);

            if report.passed() {
                match (report.status, report.elapsed_ms) {
                    (Some(status), Some(elapsed)) => {
                        eprintln!("  {}: OK ({status} in {elapsed}ms)", case.name);
                    }
                    _ => eprintln!("  {}: OK", case.name),
                }
            } else {
                let clauses: Vec<&str> = report
                    .failures
                    .iter()
                    .map(|f| f.clause.as_str())
                    .collect();
                eprintln!(
                    "  {}: FAIL ({} failures: {})",
                    case.name,
                    report.failures.len(),
                    clauses.join("; ")
                );
            }

            let failed = !report.passed();
            reports.push(report);

            if self.stop_on_failure && failed {
                eprintln!("Stopped early: failure detected (--stop-on-failure)");
                break;
            }
        }

        reports
    }

    /// Execute one case end to end.
    #[must_use]
    pub fn run_case(&self, case: &TestCase, rng: &mut SmallRng) -> CaseReport {
        let id = format!("{:016x}", rng.r#gen::<u64>());

        // Derive this case's spec from the base; removal never mutates base
        let mut spec = self.base.clone();
        for key in &case.drop_params {
            spec = spec.without_param(key);
        }

        let path = fill_path(&case.path, &case.overrides.path_params);
        let query = merged_query(&spec, &case.overrides);
        let body_text = case
            .overrides
            .body
            .as_ref()
            .map(|b| serde_json::to_string(b).unwrap_or_default());

        let bare_url = format!("{}{path}", spec.base_url());
        let url = match reqwest::Url::parse_with_params(&bare_url, &query) {
            Ok(url) => url,
            Err(e) => {
                let request = snapshot(case, &bare_url, &spec, body_text);
                let failure = CaseFailure::new(
                    &id,
                    &case.name,
                    FailureKind::Transport,
                    "build request URL",
                    e.to_string(),
                    request.clone(),
                );
                return failed_report(&id, case, &bare_url, request, vec![failure]);
            }
        };
        let request = snapshot(case, url.as_str(), &spec, body_text.clone());

        // Goldens must exist before anything is sent
        let goldens = match self.goldens.preload(&case.contract) {
            Ok(goldens) => goldens,
            Err(e) => {
                let failure = CaseFailure::new(
                    &id,
                    &case.name,
                    FailureKind::ResourceNotFound,
                    "preload golden documents",
                    e.to_string(),
                    request.clone(),
                );
                return failed_report(&id, case, &bare_url, request, vec![failure]);
            }
        };

        let method = match reqwest::Method::from_bytes(case.method.as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                let failure = CaseFailure::new(
                    &id,
                    &case.name,
                    FailureKind::Transport,
                    "build request",
                    format!("invalid HTTP method '{}'", case.method),
                    request.clone(),
                );
                return failed_report(&id, case, &bare_url, request, vec![failure]);
            }
        };

        let mut req = self.client.request(method, url);
        for (name, value) in spec.headers().iter().chain(case.overrides.headers.iter()) {
            req = req.header(name, value);
        }
        if let Some(body) = &case.overrides.body {
            req = req.header("Content-Type", "application/json");
            req = req.json(body);
        }

        // Send and measure
        let start = Instant::now();
        let resp = match req.send() {
            Ok(resp) => resp,
            Err(e) => {
                let failure = CaseFailure::new(
                    &id,
                    &case.name,
                    FailureKind::Transport,
                    "send request",
                    e.to_string(),
                    request.clone(),
                );
                return failed_report(&id, case, &bare_url, request, vec![failure]);
            }
        };

        let status = resp.status().as_u16();
        let mut headers = BTreeMap::new();
        for (name, value) in resp.headers() {
            if let Ok(text) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), text.to_string());
            }
        }
        let body = resp.text().unwrap_or_default();
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let record = ResponseRecord::new(status, elapsed_ms, headers, body);
        let violations = case.contract.evaluate(&record, &goldens);
        let failures = violations
            .into_iter()
            .map(|v| failure_from_violation(&id, case, &request, &record, v))
            .collect();

        CaseReport {
            id,
            name: case.name.clone(),
            group: case.group.clone(),
            method: case.method.clone(),
            url: bare_url,
            status: Some(status),
            elapsed_ms: Some(elapsed_ms),
            request,
            response: Some(response_snapshot(&record)),
            failures,
        }
    }
}

fn snapshot(
    case: &TestCase,
    url: &str,
    spec: &RequestSpec,
    body: Option<String>,
) -> RequestSnapshot {
    let mut headers = HashMap::new();
    for (name, value) in spec.headers().iter().chain(case.overrides.headers.iter()) {
        headers.insert(name.clone(), value.clone());
    }
    RequestSnapshot {
        method: case.method.clone(),
        url: url.to_string(),
        headers,
        body,
    }
}

fn failed_report(
    id: &str,
    case: &TestCase,
    url: &str,
    request: RequestSnapshot,
    failures: Vec<CaseFailure>,
) -> CaseReport {
    CaseReport {
        id: id.to_string(),
        name: case.name.clone(),
        group: case.group.clone(),
        method: case.method.clone(),
        url: url.to_string(),
        status: None,
        elapsed_ms: None,
        request,
        response: None,
        failures,
    }
}

fn response_snapshot(record: &ResponseRecord) -> ResponseSnapshot {
    ResponseSnapshot {
        status_code: record.status,
        headers: record.headers.clone().into_iter().collect(),
        body: (!record.body.is_empty()).then(|| record.body.clone()),
        elapsed_ms: record.elapsed_ms,
    }
}

fn failure_from_violation(
    id: &str,
    case: &TestCase,
    request: &RequestSnapshot,
    record: &ResponseRecord,
    violation: Violation,
) -> CaseFailure {
    let severity = if violation.soft {
        Severity::Warning
    } else {
        violation.kind.default_severity()
    };

    CaseFailure::new(
        id,
        &case.name,
        violation.kind,
        violation.clause,
        format!("expected {}, got {}", violation.expected, violation.actual),
        request.clone(),
    )
    .with_severity(severity)
    .with_response(response_snapshot(record))
    .with_diffs(violation.diffs)
}
