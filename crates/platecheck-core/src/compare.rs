//! JSON equivalence comparator
//!
//! Compares two JSON documents under configurable rules: object key order
//! never matters; array order matters unless `ignore_array_order` is set, in
//! which case arrays are matched as multisets via a genuine bipartite
//! matching (elements can be structurally equal without being
//! order-comparable, so sort-then-compare would produce false negatives);
//! `ignore_values` keeps the structural walk but compares scalars by type
//! only. Numbers are equal when numerically equal, whatever their textual
//! representation.

use serde_json::Value;

/// Rules applied symmetrically to both sides of a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Treat every array as a multiset instead of a sequence
    pub ignore_array_order: bool,
    /// Compare scalar type presence only, not scalar values
    pub ignore_values: bool,
}

impl CompareOptions {
    #[must_use]
    pub const fn ignoring_array_order() -> Self {
        Self {
            ignore_array_order: true,
            ignore_values: false,
        }
    }

    #[must_use]
    pub const fn ignoring_values() -> Self {
        Self {
            ignore_array_order: false,
            ignore_values: true,
        }
    }
}

/// What kind of divergence a [`Diff`] describes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Node types differ (e.g. object vs array)
    TypeMismatch,
    /// Scalar values differ
    ValueMismatch,
    /// Key present in expected, absent in actual
    MissingKey,
    /// Key present in actual, absent in expected
    ExtraKey,
    /// Arrays have different lengths
    LengthMismatch,
    /// No permutation of the actual array matches the expected multiset
    UnmatchedElement,
}

/// One structural or value divergence between the documents.
#[derive(
    Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema,
)]
pub struct Diff {
    /// JSON path of the divergent node, e.g. `$.results[2].title`
    pub path: String,
    pub kind: DiffKind,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {:?} expected {} got {}",
            self.path, self.kind, self.expected, self.actual
        )
    }
}

/// Outcome of a comparison: overall equality plus the ordered diff list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub equal: bool,
    pub diffs: Vec<Diff>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("expected document is not valid JSON: {0}")]
    ExpectedParse(String),
    #[error("actual document is not valid JSON: {0}")]
    ActualParse(String),
}

/// Compare two JSON documents given as text.
///
/// # Errors
///
/// Returns error if either side fails to parse.
pub fn compare(
    expected: &str,
    actual: &str,
    options: CompareOptions,
) -> Result<ComparisonResult, CompareError> {
    let expected: Value =
        serde_json::from_str(expected).map_err(|e| CompareError::ExpectedParse(e.to_string()))?;
    let actual: Value =
        serde_json::from_str(actual).map_err(|e| CompareError::ActualParse(e.to_string()))?;
    Ok(compare_values(&expected, &actual, options))
}

/// Compare two already-parsed JSON trees.
#[must_use]
pub fn compare_values(expected: &Value, actual: &Value, options: CompareOptions) -> ComparisonResult {
    let mut diffs = Vec::new();
    diff_nodes(expected, actual, "$", options, &mut diffs);
    ComparisonResult {
        equal: diffs.is_empty(),
        diffs,
    }
}

fn diff_nodes(expected: &Value, actual: &Value, path: &str, opts: CompareOptions, out: &mut Vec<Diff>) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_val) in exp {
                match act.get(key) {
                    Some(act_val) => {
                        diff_nodes(exp_val, act_val, &format!("{path}.{key}"), opts, out);
                    }
                    None => out.push(Diff {
                        path: format!("{path}.{key}"),
                        kind: DiffKind::MissingKey,
                        expected: render(exp_val),
                        actual: "<absent>".into(),
                    }),
                }
            }
            for (key, act_val) in act {
                if !exp.contains_key(key) {
                    out.push(Diff {
                        path: format!("{path}.{key}"),
                        kind: DiffKind::ExtraKey,
                        expected: "<absent>".into(),
                        actual: render(act_val),
                    });
                }
            }
        }
        (Value::Array(exp), Value::Array(act)) => {
            if exp.len() != act.len() {
                out.push(Diff {
                    path: path.to_string(),
                    kind: DiffKind::LengthMismatch,
                    expected: format!("{} elements", exp.len()),
                    actual: format!("{} elements", act.len()),
                });
            } else if opts.ignore_array_order {
                diff_unordered(exp, act, path, opts, out);
            } else {
                for (i, (e, a)) in exp.iter().zip(act.iter()).enumerate() {
                    diff_nodes(e, a, &format!("{path}[{i}]"), opts, out);
                }
            }
        }
        (Value::Number(e), Value::Number(a)) => {
            if !opts.ignore_values && !numbers_equal(e, a) {
                out.push(Diff {
                    path: path.to_string(),
                    kind: DiffKind::ValueMismatch,
                    expected: e.to_string(),
                    actual: a.to_string(),
                });
            }
        }
        (Value::String(e), Value::String(a)) => {
            if !opts.ignore_values && e != a {
                out.push(Diff {
                    path: path.to_string(),
                    kind: DiffKind::ValueMismatch,
                    expected: render(expected),
                    actual: render(actual),
                });
            }
        }
        (Value::Bool(e), Value::Bool(a)) => {
            if !opts.ignore_values && e != a {
                out.push(Diff {
                    path: path.to_string(),
                    kind: DiffKind::ValueMismatch,
                    expected: e.to_string(),
                    actual: a.to_string(),
                });
            }
        }
        (Value::Null, Value::Null) => {}
        // Shapes differ entirely: one clear diff, no partial descent
        _ => out.push(Diff {
            path: path.to_string(),
            kind: DiffKind::TypeMismatch,
            expected: render(expected),
            actual: render(actual),
        }),
    }
}

/// Multiset comparison of equal-length arrays: build the bipartite graph of
/// recursively-equal (expected, actual) pairs and look for a perfect matching
/// with Kuhn's augmenting paths. A greedy or sort-based pairing is not enough
/// once elements are objects with no canonical order.
fn diff_unordered(exp: &[Value], act: &[Value], path: &str, opts: CompareOptions, out: &mut Vec<Diff>) {
    let n = exp.len();
    let adjacency: Vec<Vec<usize>> = exp
        .iter()
        .map(|e| {
            act.iter()
                .enumerate()
                .filter(|(_, a)| nodes_equal(e, a, opts))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    // matched_actual[j] = expected index currently matched to actual j
    let mut matched_actual: Vec<Option<usize>> = vec![None; n];
    let mut unmatched = Vec::new();

    for i in 0..n {
        let mut visited = vec![false; n];
        if !augment(i, &adjacency, &mut matched_actual, &mut visited) {
            unmatched.push(i);
        }
    }

    for i in unmatched {
        out.push(Diff {
            path: format!("{path}[{i}]"),
            kind: DiffKind::UnmatchedElement,
            expected: render(&exp[i]),
            actual: "<no matching element>".into(),
        });
    }
}

fn augment(
    u: usize,
    adjacency: &[Vec<usize>],
    matched_actual: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &v in &adjacency[u] {
        if visited[v] {
            continue;
        }
        visited[v] = true;
        match matched_actual[v] {
            None => {
                matched_actual[v] = Some(u);
                return true;
            }
            Some(owner) => {
                if augment(owner, adjacency, matched_actual, visited) {
                    matched_actual[v] = Some(u);
                    return true;
                }
            }
        }
    }
    false
}

/// Boolean recursion used for matching candidates — same rules as
/// `diff_nodes`, without diff collection.
fn nodes_equal(expected: &Value, actual: &Value, opts: CompareOptions) -> bool {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            exp.len() == act.len()
                && exp.iter().all(|(key, e)| {
                    act.get(key).is_some_and(|a| nodes_equal(e, a, opts))
                })
        }
        (Value::Array(exp), Value::Array(act)) => {
            if exp.len() != act.len() {
                return false;
            }
            if opts.ignore_array_order {
                let mut sink = Vec::new();
                diff_unordered(exp, act, "$", opts, &mut sink);
                sink.is_empty()
            } else {
                exp.iter().zip(act.iter()).all(|(e, a)| nodes_equal(e, a, opts))
            }
        }
        (Value::Number(e), Value::Number(a)) => opts.ignore_values || numbers_equal(e, a),
        (Value::String(e), Value::String(a)) => opts.ignore_values || e == a,
        (Value::Bool(e), Value::Bool(a)) => opts.ignore_values || e == a,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Numeric equality across textual representations: `1`, `1.0` and `1e0` are
/// the same logical number.
fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Short single-line rendering for diff messages.
fn render(value: &Value) -> String {
    const MAX: usize = 80;
    let text = value.to_string();
    if text.len() <= MAX {
        return text;
    }
    let mut end = MAX;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
