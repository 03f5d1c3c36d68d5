//! Verdict policy - determines how case failures are filtered and judged

use super::{CaseFailure, FailureKind, Severity};

/// Policy for filtering and judging failures
#[derive(Debug, Clone)]
pub struct VerdictPolicy {
    /// Strict mode: soft (Warning) failures fail the run
    pub strict: bool,
    /// Failure kinds to ignore
    pub ignore_kinds: Vec<FailureKind>,
    /// Minimum severity to report (below this = ignored)
    pub min_severity: Severity,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self {
            strict: true, // Default is strict - explicit opt-out required
            ignore_kinds: vec![],
            min_severity: Severity::Warning,
        }
    }
}

impl VerdictPolicy {
    /// Create a lenient policy (soft failures don't fail the run)
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Default::default()
        }
    }

    /// Filter failures according to policy
    #[must_use]
    pub fn filter(&self, failures: Vec<CaseFailure>) -> Vec<CaseFailure> {
        failures
            .into_iter()
            .filter(|f| self.should_report(f))
            .collect()
    }

    fn should_report(&self, failure: &CaseFailure) -> bool {
        if self.ignore_kinds.contains(&failure.kind) {
            return false;
        }
        if failure.severity < self.min_severity {
            return false;
        }
        true
    }

    /// Determine final exit code from failures.
    ///
    /// Returns the highest exit code among all failures; exit 3 is reserved
    /// for tool errors and never produced here.
    #[must_use]
    pub fn exit_code(&self, failures: &[CaseFailure]) -> i32 {
        failures
            .iter()
            .map(|f| f.severity.exit_code(self.strict))
            .max()
            .unwrap_or(0)
    }

    /// Determine verdict from case counts and filtered failures.
    ///
    /// PASS requires every case to have run and held its full contract.
    #[must_use]
    pub fn verdict(&self, failures: &[CaseFailure], total: u64, passed: u64) -> Verdict {
        let exit_code = self.exit_code(failures);

        let status = if passed == total && total > 0 && exit_code == 0 {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let reason = if status == VerdictStatus::Pass {
            format!("All {total} cases passed")
        } else if total == 0 {
            "No cases were run".to_string()
        } else {
            let critical = failures
                .iter()
                .filter(|f| f.severity == Severity::Critical)
                .count();
            let error = failures
                .iter()
                .filter(|f| f.severity == Severity::Error)
                .count();
            let warning = failures
                .iter()
                .filter(|f| f.severity == Severity::Warning)
                .count();
            format!(
                "{} of {total} cases failed: {} failures ({critical} critical, {error} error, {warning} warning)",
                total - passed,
                failures.len(),
            )
        };

        Verdict {
            status,
            exit_code,
            reason,
        }
    }
}

/// Final verdict
#[derive(
    Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema,
)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
