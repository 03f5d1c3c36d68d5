//! HTTP file generator - converts case failures to .http format

use crate::verdict::{CaseFailure, RequestSnapshot};

/// Generate .http file content from case failures
pub fn to_http_file(failures: &[CaseFailure], base_url_var: &str) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "# Auto-generated reproduction cases ({} failures)",
        failures.len()
    ));
    lines.push(format!("# Base URL variable: {{{{{base_url_var}}}}}"));
    lines.push(String::new());

    for (idx, failure) in failures.iter().enumerate() {
        lines.push(format!(
            "### [{idx}] {} - {} - {}",
            failure.severity, failure.case, failure.clause
        ));
        lines.push(format!("# ID: {}", failure.id));
        if let Some(response) = &failure.response {
            lines.push(format!(
                "# Observed: {} in {}ms",
                response.status_code, response.elapsed_ms
            ));
        }

        // Request line
        let url = if failure.request.url.starts_with("http") {
            failure.request.url.clone()
        } else {
            format!("{{{{{base_url_var}}}}}{}", failure.request.url)
        };
        lines.push(format!("{} {}", failure.request.method, url));

        // Headers
        for (key, value) in &failure.request.headers {
            if !matches!(key.to_lowercase().as_str(), "host" | "content-length") {
                lines.push(format!("{key}: {value}"));
            }
        }

        // Body
        if let Some(body) = &failure.request.body {
            if !failure.request.headers.contains_key("Content-Type") {
                lines.push("Content-Type: application/json".to_string());
            }
            lines.push(String::new());
            lines.push(body.clone());
        }

        lines.push(String::new());
        lines.push("###".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Generate a single request as .http format
pub fn request_to_http(request: &RequestSnapshot, comment: Option<&str>) -> String {
    let mut lines = Vec::new();

    if let Some(c) = comment {
        lines.push(format!("### {c}"));
    }

    lines.push(format!("{} {}", request.method, request.url));

    for (key, value) in &request.headers {
        lines.push(format!("{key}: {value}"));
    }

    if let Some(body) = &request.body {
        lines.push(String::new());
        lines.push(body.clone());
    }

    lines.join("\n")
}
