//! Application configuration for NewsBrief.
//!
//! User config lives at `~/.newsbrief/newsbrief.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file; it only names the env vars holding them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NewsBriefError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsbrief.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsbrief";

// ---------------------------------------------------------------------------
// Config structs (matching newsbrief.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline sizing.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Candidate fetching.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Language-model endpoint.
    #[serde(default)]
    pub llm: LlmSection,

    /// Search provider.
    #[serde(default)]
    pub search: SearchSection,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Maximum number of search keywords derived from the seed.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    /// Maximum number of candidates kept after merging search results.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Character budget for article text fed to the summarizer.
    #[serde(default = "default_summary_input_budget")]
    pub summary_input_budget: usize,

    /// Character cap on the produced summary text.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Whole-run deadline in seconds (0 disables it).
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    /// Retry keyword extraction once with a stricter prompt on parse failure.
    #[serde(default)]
    pub keyword_fallback_prompt: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            max_candidates: default_max_candidates(),
            summary_input_budget: default_summary_input_budget(),
            summary_max_chars: default_summary_max_chars(),
            run_timeout_secs: default_run_timeout(),
            keyword_fallback_prompt: false,
        }
    }
}

fn default_max_keywords() -> usize {
    3
}
fn default_max_candidates() -> usize {
    10
}
fn default_summary_input_budget() -> usize {
    12_000
}
fn default_summary_max_chars() -> usize {
    4_000
}
fn default_run_timeout() -> u64 {
    600
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Maximum in-flight candidate fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Retries after the first failed attempt.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// First backoff delay; doubles each retry.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Ceiling for a single backoff delay.
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,

    /// Extracted bodies shorter than this count as empty.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    /// User-Agent sent with article requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry_count: default_retry_count(),
            timeout_secs: default_fetch_timeout(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
            min_content_chars: default_min_content_chars(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}
fn default_retry_count() -> u32 {
    2
}
fn default_fetch_timeout() -> u64 {
    15
}
fn default_backoff_base() -> u64 {
    500
}
fn default_backoff_max() -> u64 {
    8_000
}
fn default_min_content_chars() -> usize {
    100
}
fn default_user_agent() -> String {
    concat!("Mozilla/5.0 (compatible; NewsBrief/", env!("CARGO_PKG_VERSION"), ")").into()
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// Name of the env var holding the API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Base URL of an OpenAI-compatible chat-completions API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Output token cap for keyword extraction.
    #[serde(default = "default_keyword_max_tokens")]
    pub keyword_max_tokens: u32,

    /// Output token cap for the summary.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            base_url: default_llm_base_url(),
            model: default_model(),
            keyword_max_tokens: default_keyword_max_tokens(),
            summary_max_tokens: default_summary_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_keyword_max_tokens() -> u32 {
    64
}
fn default_summary_max_tokens() -> u32 {
    2_048
}
fn default_llm_timeout() -> u64 {
    120
}

/// How keywords are turned into search queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMode {
    /// One query per keyword, results interleaved by provider rank.
    #[default]
    PerKeyword,
    /// A single query with all keywords joined by spaces.
    Joined,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    /// Provider name (only "naver" is built in).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of the provider API.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Env var holding the client id.
    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,

    /// Env var holding the client secret.
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,

    /// Query construction mode.
    #[serde(default)]
    pub query_mode: QueryMode,

    /// Result ordering requested from the provider: "date" or "sim".
    #[serde(default = "default_sort")]
    pub sort: String,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_search_base_url(),
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
            query_mode: QueryMode::default(),
            sort: default_sort(),
        }
    }
}

fn default_provider() -> String {
    "naver".into()
}
fn default_search_base_url() -> String {
    "https://openapi.naver.com".into()
}
fn default_client_id_env() -> String {
    "NAVER_CLIENT_ID".into()
}
fn default_client_secret_env() -> String {
    "NAVER_CLIENT_SECRET".into()
}
fn default_sort() -> String {
    "date".into()
}

// ---------------------------------------------------------------------------
// Runtime pipeline config (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Inclusive publication-date window applied to search hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(NewsBriefError::validation(format!(
                "date window start {from} is after end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Scalar configuration surface consumed by the pipeline.
///
/// Constructed once at process start and passed by reference.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_keywords: usize,
    pub max_candidates: usize,
    pub fetch_concurrency: usize,
    pub fetch_retry_count: u32,
    pub fetch_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub min_content_chars: usize,
    pub summary_input_budget: usize,
    pub summary_max_chars: usize,
    pub keyword_max_tokens: u32,
    pub summary_max_tokens: u32,
    pub keyword_fallback_prompt: bool,
    pub query_mode: QueryMode,
    pub date_window: Option<DateWindow>,
    /// `None` disables the run deadline.
    pub run_timeout: Option<Duration>,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_keywords: config.pipeline.max_keywords,
            max_candidates: config.pipeline.max_candidates,
            fetch_concurrency: config.fetch.concurrency,
            fetch_retry_count: config.fetch.retry_count,
            fetch_timeout: Duration::from_secs(config.fetch.timeout_secs),
            backoff_base: Duration::from_millis(config.fetch.backoff_base_ms),
            backoff_max: Duration::from_millis(config.fetch.backoff_max_ms),
            min_content_chars: config.fetch.min_content_chars,
            summary_input_budget: config.pipeline.summary_input_budget,
            summary_max_chars: config.pipeline.summary_max_chars,
            keyword_max_tokens: config.llm.keyword_max_tokens,
            summary_max_tokens: config.llm.summary_max_tokens,
            keyword_fallback_prompt: config.pipeline.keyword_fallback_prompt,
            query_mode: config.search.query_mode,
            date_window: None,
            run_timeout: match config.pipeline.run_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsbrief/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsBriefError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newsbrief/newsbrief.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsBriefError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NewsBriefError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewsBriefError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsBriefError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsBriefError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values the pipeline cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.fetch.concurrency == 0 {
        return Err(NewsBriefError::config("fetch.concurrency must be at least 1"));
    }
    if config.fetch.timeout_secs == 0 {
        return Err(NewsBriefError::config("fetch.timeout_secs must be at least 1"));
    }
    if config.pipeline.summary_input_budget == 0 {
        return Err(NewsBriefError::config(
            "pipeline.summary_input_budget must be at least 1",
        ));
    }
    if config.pipeline.summary_max_chars == 0 {
        return Err(NewsBriefError::config(
            "pipeline.summary_max_chars must be at least 1",
        ));
    }
    Url::parse(&config.llm.base_url)
        .map_err(|e| NewsBriefError::config(format!("llm.base_url is not a URL: {e}")))?;
    Url::parse(&config.search.base_url)
        .map_err(|e| NewsBriefError::config(format!("search.base_url is not a URL: {e}")))?;
    Ok(())
}

/// Check that every credential env var named by the config is set and non-empty.
pub fn validate_credentials(config: &AppConfig) -> Result<()> {
    let required = [
        (&config.llm.api_key_env, "language-model API key"),
        (&config.search.client_id_env, "search client id"),
        (&config.search.client_secret_env, "search client secret"),
    ];

    for (var_name, what) in required {
        match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => {}
            _ => {
                return Err(NewsBriefError::config(format!(
                    "{what} not found. Set the {var_name} environment variable."
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_candidates"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("per-keyword"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.concurrency, 5);
        assert_eq!(parsed.search.client_id_env, "NAVER_CLIENT_ID");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[fetch]
concurrency = 8

[search]
query_mode = "joined"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.fetch.concurrency, 8);
        assert_eq!(config.fetch.retry_count, 2);
        assert_eq!(config.search.query_mode, QueryMode::Joined);
        assert_eq!(config.pipeline.max_keywords, 3);
    }

    #[test]
    fn pipeline_config_from_app_config() {
        let pipeline = PipelineConfig::from(&AppConfig::default());
        assert_eq!(pipeline.fetch_concurrency, 5);
        assert_eq!(pipeline.fetch_retry_count, 2);
        assert_eq!(pipeline.fetch_timeout, Duration::from_secs(15));
        assert_eq!(pipeline.run_timeout, Some(Duration::from_secs(600)));
        assert!(pipeline.date_window.is_none());
    }

    #[test]
    fn zero_run_timeout_disables_deadline() {
        let mut app = AppConfig::default();
        app.pipeline.run_timeout_secs = 0;
        assert!(PipelineConfig::from(&app).run_timeout.is_none());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.fetch.concurrency = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn validate_rejects_zero_summary_length() {
        let mut config = AppConfig::default();
        config.pipeline.summary_max_chars = 0;
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("summary_max_chars"));
    }

    #[test]
    fn date_window_bounds() {
        let from = NaiveDate::from_ymd_opt(2025, 7, 28).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 7, 30).unwrap();
        let window = DateWindow::new(from, to).expect("valid window");
        assert!(window.contains(from));
        assert!(window.contains(to));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()));
        assert!(DateWindow::new(to, from).is_err());
    }

    #[test]
    fn credential_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.llm.api_key_env = "NB_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_credentials(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("NB_TEST_NONEXISTENT_KEY_12345"));
    }
}
