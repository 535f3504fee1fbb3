use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level migration configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MigrationConfig {
    /// Webflow (source) API settings
    pub webflow: WebflowConfig,
    /// Sanity (destination) API settings
    pub sanity: SanityConfig,
    /// LLM enhancement settings
    #[serde(default)]
    pub enhancement: EnhancementConfig,
    /// Request pacing and batching
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Run report settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where and how the JSON run report is written
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub path: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}

/// Source site settings
#[derive(Debug, Deserialize, Clone)]
pub struct WebflowConfig {
    /// Bearer token for the Webflow Data API
    pub api_token: String,
    /// Site whose collections are migrated
    pub site_id: String,
    /// Base URL override (used by tests and proxies)
    #[serde(default = "default_webflow_base_url")]
    pub base_url: String,
    /// Items per page when listing collection items (API max is 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Destination dataset settings
#[derive(Debug, Deserialize, Clone)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    /// Token with write access to the dataset
    pub token: String,
    #[serde(default = "default_sanity_api_version")]
    pub api_version: String,
    /// Base URL override; defaults to the project API host
    pub base_url: Option<String>,
}

impl SanityConfig {
    /// Effective API root, e.g. `https://abc123.api.sanity.io`
    pub fn api_root(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.api.sanity.io", self.project_id))
    }
}

/// LLM enhancement settings (off unless enabled)
#[derive(Debug, Deserialize, Clone)]
pub struct EnhancementConfig {
    #[serde(default)]
    pub enabled: bool,
    /// API key (can also come from the OPENAI_API_KEY environment variable)
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Attempts per enhancement call before giving up
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Initial delay between retries in milliseconds (grows linearly)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: default_model(),
            base_url: default_openai_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Pacing between requests and batches
#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    /// Delay between individual API requests in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Items per batch within a collection
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

// Default value functions
fn default_webflow_base_url() -> String {
    "https://api.webflow.com".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_sanity_api_version() -> String {
    "2024-01-01".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    400
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_delay_ms() -> u64 {
    350
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    2000
}

fn default_report_path() -> String {
    "migration-report.json".to_string()
}

impl MigrationConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with MIGRATE prefix
    /// 2. migrate.toml file in the current directory
    /// 3. Default values
    ///
    /// Environment variable format: MIGRATE__WEBFLOW__API_TOKEN
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("migrate").required(false))
            // Use double underscore for nested: MIGRATE__SANITY__DATASET
            .add_source(
                Environment::with_prefix("MIGRATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
