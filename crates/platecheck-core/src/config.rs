//! Harness configuration for contract-test runs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the API under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key injected as the `apiKey` default query parameter
    pub api_key: String,

    /// Per-user hash sent as the `hash` query parameter on meal-plan operations
    #[serde(default)]
    pub user_hash: String,

    /// Connected username for meal-plan path parameters
    #[serde(default)]
    pub username: String,

    /// Root directory for golden documents and indexed fixture files
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,

    /// Wall-clock budget per request in milliseconds (soft assertion)
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,

    /// Hard HTTP client timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Write a full request/response transcript after each run
    #[serde(default)]
    pub transcript: bool,

    /// Transcript output directory (defaults to .platecheck/transcripts)
    #[serde(default)]
    pub transcript_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://api.spoonacular.com".to_string()
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

const fn default_time_budget_ms() -> u64 {
    1500
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            user_hash: String::new(),
            username: String::new(),
            fixtures_dir: default_fixtures_dir(),
            time_budget_ms: default_time_budget_ms(),
            timeout_secs: default_timeout_secs(),
            transcript: false,
            transcript_dir: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.platecheck.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".platecheck.toml", ".platecheck.json", "platecheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# platecheck configuration

# API under test
base_url = "https://api.spoonacular.com"

# Static API key (every request carries it unless a case removes it)
api_key = "your-api-key"

# Connected user credentials for meal-plan cases
# user_hash = "cfb46db8e2cff3e37fe328a89320e14cf18efa8c"
# username = "murphy-erdman19"

# Golden documents and indexed fixtures
fixtures_dir = "fixtures"

# Per-request wall-clock budget in milliseconds (soft assertion)
time_budget_ms = 1500

# Hard HTTP client timeout in seconds
timeout_secs = 10

# Full request/response transcript (JSONL per case group)
# transcript = true
# transcript_dir = ".platecheck/transcripts"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No config file found (run `platecheck init`)")]
    NotFound,
}

// ── Config validation ──

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-api-key",
    "your_api_key",
    "YOUR_API_KEY",
    "TODO",
    "CHANGEME",
    "changeme",
    "placeholder",
    "xxx",
    "XXX",
    "replace-me",
    "REPLACE_ME",
    "example",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    // Base URL
    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation {
            check: "base_url".into(),
            status: ValidationStatus::Ok,
            message: format!("base_url: {}", config.base_url),
        });
    } else {
        checks.push(Validation {
            check: "base_url".into(),
            status: ValidationStatus::Error,
            message: format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        });
    }

    // API key — empty or placeholder keys make every authorized case fail
    if config.api_key.is_empty() {
        checks.push(Validation {
            check: "api_key".into(),
            status: ValidationStatus::Error,
            message: "api_key: empty".into(),
        });
    } else if config.api_key.contains('<') && config.api_key.contains('>') {
        checks.push(Validation {
            check: "api_key".into(),
            status: ValidationStatus::Warning,
            message: "api_key: contains '<...>' placeholder".into(),
        });
    } else {
        let placeholder = PLACEHOLDER_PATTERNS
            .iter()
            .find(|p| config.api_key.contains(*p));
        match placeholder {
            Some(pattern) => checks.push(Validation {
                check: "api_key".into(),
                status: ValidationStatus::Warning,
                message: format!("api_key: contains '{pattern}' — may be placeholder"),
            }),
            None => checks.push(Validation {
                check: "api_key".into(),
                status: ValidationStatus::Ok,
                message: "api_key: configured".into(),
            }),
        }
    }

    // Fixture root — golden-backed cases fail before sending anything without it
    if config.fixtures_dir.is_dir() {
        checks.push(Validation {
            check: "fixtures_dir".into(),
            status: ValidationStatus::Ok,
            message: format!("fixtures_dir: {} (exists)", config.fixtures_dir.display()),
        });
    } else {
        checks.push(Validation {
            check: "fixtures_dir".into(),
            status: ValidationStatus::Warning,
            message: format!(
                "fixtures_dir: {} (not found — golden-backed cases will fail)",
                config.fixtures_dir.display()
            ),
        });
    }

    // Meal-plan credentials
    if config.username.is_empty() || config.user_hash.is_empty() {
        checks.push(Validation {
            check: "meal_plan_user".into(),
            status: ValidationStatus::Warning,
            message: "username/user_hash: not configured — meal-plan cases will be rejected".into(),
        });
    } else {
        checks.push(Validation {
            check: "meal_plan_user".into(),
            status: ValidationStatus::Ok,
            message: format!("meal_plan_user: {}", config.username),
        });
    }

    checks
}
