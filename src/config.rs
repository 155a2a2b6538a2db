use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = ".pr-feedback.toml";
const DEFAULT_API_URL: &str = "https://api.github.com";
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-feedback.toml.
///
/// All fields are optional; the tool works with zero config as long as a
/// token can be found in the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API token. If None, falls back to GITHUB_TOKEN and then `gh auth token`.
    pub token: Option<String>,
    /// Base URL of the REST API (GitHub Enterprise installs differ).
    pub api_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Fixed pause before the single retry of a transient failure.
    pub retry_backoff_ms: u64,
    /// Page size for paginated endpoints, capped at 100.
    pub per_page: u32,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            retry_backoff_ms: 1000,
            per_page: MAX_PER_PAGE,
            user_agent: "pr-feedback".to_string(),
        }
    }
}

// Hand-written so the token can never reach a log line through `?config`.
impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("per_page", &self.per_page)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn page_size(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Comment bodies shorter than this are not considered actionable.
    pub min_body_len: usize,
    /// User rules, evaluated before the built-in ones.
    pub extra_rules: Vec<RuleConfig>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_body_len: 10,
            extra_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Category name as written in feedback output (e.g. "security", "type-hint").
    pub category: String,
    /// Case-insensitive regular expression matched against the comment body.
    pub pattern: String,
}

impl Config {
    /// Load configuration from `path`, or from .pr-feedback.toml in the
    /// current directory. Returns default config if the default file doesn't
    /// exist; an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        if config.github.token.is_none() {
            config.github.token = token_from_env();
        }

        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the API token: config file value takes precedence, then
    /// GITHUB_TOKEN, then the GitHub CLI's stored credentials.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(token_from_env)
            .or_else(token_from_gh_cli)
    }
}

fn token_from_env() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
}

fn token_from_gh_cli() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.timeout(), Duration::from_secs(30));
        assert_eq!(config.github.page_size(), 100);
        assert_eq!(config.feedback.min_body_len, 10);
        assert!(config.feedback.extra_rules.is_empty());
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
api_url = "https://ghe.example.com/api/v3"
timeout_secs = 5
per_page = 500

[feedback]
min_body_len = 3
extra_rules = [{ category = "security", pattern = "unsafe" }]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.timeout_secs, 5);
        assert_eq!(config.github.page_size(), 100);
        assert_eq!(config.github.retry_backoff_ms, 1000);
        assert_eq!(config.feedback.min_body_len, 3);
        assert_eq!(config.feedback.extra_rules.len(), 1);
        assert_eq!(config.feedback.extra_rules[0].category, "security");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[github]\ntoken = \"abc\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("abc"));
        assert_eq!(config.github_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::FileRead(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.github.token = Some("ghp_supersecret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("ghp_supersecret"));
        assert!(rendered.contains("<redacted>"));
    }
}
