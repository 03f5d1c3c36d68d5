//! Full request/response transcript to JSONL files
//!
//! Writes every executed case (not just failures) to per-group JSONL files
//! for post-hoc analysis, debugging, and audit trails.
//!
//! ```text
//! .platecheck/transcripts/
//! ├── recipes.jsonl
//! ├── shoppinglist.jsonl
//! └── index.json
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::report::CaseReport;

/// Headers that should be masked in transcripts for security.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Query parameters that carry credentials and should be masked in URLs.
const SENSITIVE_PARAMS: &[&str] = &["apiKey", "hash"];

/// Mask value for redacted headers and parameters.
const MASK: &str = "***";

/// Summary of a transcript write, persisted as `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptIndex {
    /// Total cases written
    pub total: u64,
    /// Per-group file listing
    pub groups: Vec<TranscriptGroupEntry>,
    /// Directory where files were written
    pub transcript_dir: PathBuf,
}

/// An entry in the transcript index for one suite group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptGroupEntry {
    /// Group label, e.g. "shoppinglist"
    pub group: String,
    /// Filename within the transcript directory
    pub file: String,
    /// Number of cases in this file
    pub count: u64,
}

/// Write all case reports to per-group JSONL files.
///
/// # Errors
///
/// Returns error if the transcript directory cannot be created or files
/// cannot be written.
pub fn write_transcript(
    reports: &[CaseReport],
    transcript_dir: &Path,
    mask_credentials: bool,
) -> Result<TranscriptIndex, TranscriptError> {
    std::fs::create_dir_all(transcript_dir)
        .map_err(|e| TranscriptError::Io(format!("create {}: {e}", transcript_dir.display())))?;

    let mut groups: HashMap<String, Vec<&CaseReport>> = HashMap::new();
    for report in reports {
        groups.entry(report.group.clone()).or_default().push(report);
    }

    let mut entries = Vec::new();
    let mut total: u64 = 0;

    // Sort by group name for deterministic output
    let mut sorted: Vec<_> = groups.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    for (group, reports) in sorted {
        let filename = sanitize_filename(&group);
        let filepath = transcript_dir.join(&filename);

        let file = std::fs::File::create(&filepath)
            .map_err(|e| TranscriptError::Io(format!("create {}: {e}", filepath.display())))?;
        let mut writer = std::io::BufWriter::new(file);

        let count = reports.len() as u64;
        total += count;

        for report in reports {
            let line = if mask_credentials {
                serde_json::to_string(&mask_report(report))
            } else {
                serde_json::to_string(report)
            }
            .map_err(|e| TranscriptError::Serialize(e.to_string()))?;
            writer
                .write_all(line.as_bytes())
                .map_err(|e| TranscriptError::Io(format!("write {}: {e}", filepath.display())))?;
            writer
                .write_all(b"\n")
                .map_err(|e| TranscriptError::Io(format!("write {}: {e}", filepath.display())))?;
        }

        writer
            .flush()
            .map_err(|e| TranscriptError::Io(format!("flush {}: {e}", filepath.display())))?;

        entries.push(TranscriptGroupEntry {
            group,
            file: filename,
            count,
        });
    }

    let index = TranscriptIndex {
        total,
        groups: entries,
        transcript_dir: transcript_dir.to_path_buf(),
    };

    let index_path = transcript_dir.join("index.json");
    let index_json = serde_json::to_string_pretty(&index)
        .map_err(|e| TranscriptError::Serialize(e.to_string()))?;
    std::fs::write(&index_path, index_json)
        .map_err(|e| TranscriptError::Io(format!("write {}: {e}", index_path.display())))?;

    Ok(index)
}

/// Maximum characters kept from the group label in the filename.
const MAX_FILENAME_LEN: usize = 200;

/// Convert a group label to a safe filename.
fn sanitize_filename(group: &str) -> String {
    let sanitized: String = group
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '_',
        })
        .collect();
    format!("{sanitized}.jsonl")
}

/// Returns true if the header name matches a known sensitive header (case-insensitive).
fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

/// Mask credentials in a case report before it is written out.
///
/// Sensitive request headers are replaced with `***`, and credential query
/// parameters (`apiKey`, `hash`) have their values masked in the request URL.
fn mask_report(report: &CaseReport) -> CaseReport {
    let mut masked = report.clone();
    for (key, value) in masked.request.headers.iter_mut() {
        if is_sensitive_header(key) {
            *value = MASK.to_string();
        }
    }
    masked.request.url = mask_url(&masked.request.url);
    for failure in masked.failures.iter_mut() {
        for (key, value) in failure.request.headers.iter_mut() {
            if is_sensitive_header(key) {
                *value = MASK.to_string();
            }
        }
        failure.request.url = mask_url(&failure.request.url);
    }
    masked
}

/// Mask credential query-parameter values in a URL string.
fn mask_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if SENSITIVE_PARAMS.contains(&name) => format!("{name}={MASK}"),
            _ => pair.to_string(),
        })
        .collect();
    format!("{base}?{}", masked.join("&"))
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::RequestSnapshot;

    fn report(name: &str, group: &str) -> CaseReport {
        CaseReport {
            id: "00000000deadbeef".into(),
            name: name.into(),
            group: group.into(),
            method: "GET".into(),
            url: "https://api.spoonacular.com/recipes/complexSearch".into(),
            status: Some(200),
            elapsed_ms: Some(120),
            request: RequestSnapshot {
                method: "GET".into(),
                url: "https://api.spoonacular.com/recipes/complexSearch?query=bread&apiKey=sk-real"
                    .into(),
                headers: HashMap::from([
                    ("Authorization".into(), "Bearer secret-token".into()),
                    ("Accept".into(), "application/json".into()),
                ]),
                body: None,
            },
            response: None,
            failures: vec![],
        }
    }

    #[test]
    fn sanitize_simple() {
        assert_eq!(sanitize_filename("recipes"), "recipes.jsonl");
    }

    #[test]
    fn sanitize_odd_characters() {
        assert_eq!(sanitize_filename("meal plan/v2"), "meal_plan_v2.jsonl");
    }

    #[test]
    fn mask_authorization_header() {
        let masked = mask_report(&report("search", "recipes"));
        assert_eq!(masked.request.headers["Authorization"], "***");
        assert_eq!(masked.request.headers["Accept"], "application/json");
    }

    #[test]
    fn mask_api_key_in_url() {
        let masked = mask_report(&report("search", "recipes"));
        assert_eq!(
            masked.request.url,
            "https://api.spoonacular.com/recipes/complexSearch?query=bread&apiKey=***"
        );
    }

    #[test]
    fn mask_url_without_query_is_untouched() {
        assert_eq!(
            mask_url("https://api.spoonacular.com/recipes"),
            "https://api.spoonacular.com/recipes"
        );
    }

    #[test]
    fn no_mask_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let reports = vec![report("search", "recipes")];
        let index = write_transcript(&reports, dir.path(), false).unwrap();
        assert_eq!(index.total, 1);

        let file_path = dir.path().join(&index.groups[0].file);
        let content = std::fs::read_to_string(file_path).unwrap();
        let parsed: CaseReport = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed.request.headers["Authorization"], "Bearer secret-token");
        assert!(parsed.request.url.contains("apiKey=sk-real"));
    }

    #[test]
    fn write_transcript_groups_cases() {
        let dir = tempfile::tempdir().unwrap();
        let reports = vec![
            report("search", "recipes"),
            report("classify_0", "images"),
            report("classify_1", "images"),
        ];

        let index = write_transcript(&reports, dir.path(), true).unwrap();

        assert_eq!(index.total, 3);
        assert_eq!(index.groups.len(), 2);
        assert_eq!(index.groups[0].group, "images");
        assert_eq!(index.groups[0].count, 2);
        assert_eq!(index.groups[1].group, "recipes");
        assert_eq!(index.groups[1].count, 1);

        for entry in &index.groups {
            let path = dir.path().join(&entry.file);
            let content = std::fs::read_to_string(&path).unwrap();
            let lines: Vec<_> = content.lines().collect();
            assert_eq!(lines.len(), entry.count as usize);
            for line in lines {
                let parsed: CaseReport = serde_json::from_str(line).unwrap();
                assert_eq!(parsed.request.headers["Authorization"], "***");
            }
        }

        let index_path = dir.path().join("index.json");
        assert!(index_path.exists());
        let parsed: TranscriptIndex =
            serde_json::from_str(&std::fs::read_to_string(index_path).unwrap()).unwrap();
        assert_eq!(parsed.total, 3);
    }

    #[test]
    fn write_transcript_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_transcript(&[], dir.path(), true).unwrap();
        assert_eq!(index.total, 0);
        assert!(index.groups.is_empty());
        assert!(dir.path().join("index.json").exists());
    }
}
