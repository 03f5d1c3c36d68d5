//! Persistent report storage — `~/.platecheck/reports/`
//!
//! Every `platecheck run` is automatically saved regardless of `--output` mode.
//! Directory layout: `{host_port}_{timestamp}/`

use std::path::PathBuf;
use std::time::SystemTime;

use platecheck_core::{Config, SuiteReport, to_http_file};

/// Everything needed to persist a run.
pub struct ReportData<'a> {
    pub config: &'a Config,
    pub report: &'a SuiteReport,
    pub duration_secs: f64,
}

/// Save a run report to `~/.platecheck/reports/{host_port}_{timestamp}/`.
///
/// Returns the report directory path on success.
pub fn save_report(data: &ReportData) -> Result<PathBuf, std::io::Error> {
    let base = report_base_dir()?;
    let dir_name = build_dir_name(&data.config.base_url);
    let report_dir = base.join(&dir_name);
    std::fs::create_dir_all(&report_dir)?;

    // config.toml — snapshot of the config used, credentials redacted
    let config_toml = toml::to_string_pretty(&redacted(data.config))
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(report_dir.join("config.toml"), config_toml)?;

    // summary.json — the full suite report plus run metadata
    let summary = serde_json::json!({
        "report": data.report,
        "meta": {
            "timestamp": timestamp_iso(),
            "duration_secs": data.duration_secs,
            "base_url": data.config.base_url,
        },
    });
    std::fs::write(
        report_dir.join("summary.json"),
        serde_json::to_string_pretty(&summary).unwrap_or_default(),
    )?;

    let failures = data.report.failures();
    if !failures.is_empty() {
        std::fs::write(
            report_dir.join("failures.json"),
            serde_json::to_string_pretty(&failures).unwrap_or_default(),
        )?;

        // reproductions.http — for quick replay in IDE/curl
        let owned: Vec<_> = failures.into_iter().cloned().collect();
        let http_content = to_http_file(&owned, "base_url");
        std::fs::write(report_dir.join("reproductions.http"), http_content)?;
    }

    Ok(report_dir)
}

/// Config snapshot with credentials masked. Report directories get shared;
/// the key and user hash must not.
fn redacted(config: &Config) -> Config {
    let mut copy = config.clone();
    if !copy.api_key.is_empty() {
        copy.api_key = "<redacted>".to_string();
    }
    if !copy.user_hash.is_empty() {
        copy.user_hash = "<redacted>".to_string();
    }
    copy
}

fn report_base_dir() -> Result<PathBuf, std::io::Error> {
    let home = std::env::var("HOME")
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
    Ok(PathBuf::from(home).join(".platecheck").join("reports"))
}

/// `{host_port}_{timestamp}` e.g. `api.spoonacular.com_20260826T193000`
fn build_dir_name(base_url: &str) -> String {
    let host_port = extract_host_port(base_url);
    let ts = timestamp_compact();
    format!("{host_port}_{ts}")
}

/// `"http://localhost:8080/path"` → `"localhost_8080"`
fn extract_host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("unknown")
        .replace(':', "_")
}

/// `"20260826T193000"` — filesystem-safe compact timestamp.
fn timestamp_compact() -> String {
    let (y, mo, d, h, mi, s) = utc_now();
    format!("{y:04}{mo:02}{d:02}T{h:02}{mi:02}{s:02}")
}

/// `"2026-08-26T19:30:00Z"` — ISO 8601 for JSON.
fn timestamp_iso() -> String {
    let (y, mo, d, h, mi, s) = utc_now();
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}Z")
}

/// Current UTC date-time from epoch. No external crate needed.
fn utc_now() -> (i32, u32, u32, u32, u32, u32) {
    let epoch_secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let days = (epoch_secs / 86400) as i64;
    let tod = epoch_secs % 86400;
    let (y, m, d) = civil_from_days(days);
    (
        y,
        m,
        d,
        (tod / 3600) as u32,
        ((tod % 3600) / 60) as u32,
        (tod % 60) as u32,
    )
}

/// Howard Hinnant's `civil_from_days` — epoch days → (year, month, day).
///
/// Reference: <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
