//! platecheck-core: Core types and verdict logic for API contract testing
//!
//! This crate provides the fundamental types for describing HTTP contract
//! cases (request derivation, assertion clauses, golden-document comparison),
//! the failure taxonomy, and policies for determining pass/fail verdicts.

pub mod compare;
pub mod config;
pub mod contract;
pub mod report;
pub mod repro;
pub mod request;
pub mod transcript;
pub mod verdict;

pub use compare::{
    CompareError, CompareOptions, ComparisonResult, Diff, DiffKind, compare, compare_values,
};
pub use config::{Config, ConfigError};
pub use contract::{
    AssertionContract, Check, ContractClause, Expect, ResponseRecord, Strictness, Violation,
};
pub use report::{CaseReport, SuiteReport, generate_schema};
pub use repro::to_http_file;
pub use request::{CaseOverride, RequestSpec, SpecError};
pub use transcript::{TranscriptError, TranscriptIndex, write_transcript};
pub use verdict::{
    CaseFailure, FailureKind, RequestSnapshot, ResponseSnapshot, Severity, Verdict, VerdictPolicy,
    VerdictStatus,
};
