//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.clickup-insights.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".clickup-insights.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// ClickUp API settings.
    #[serde(default)]
    pub clickup: ClickUpConfig,

    /// Language-model settings for delegated reports.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Maximum ClickUp requests in flight while walking a space.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

/// ClickUp API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickUpConfig {
    /// Base URL of the ClickUp v2 API.
    #[serde(default = "default_clickup_url")]
    pub api_url: String,

    /// Personal API token. Usually supplied via `CLICKUP_API_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_clickup_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ClickUpConfig {
    fn default() -> Self {
        Self {
            api_url: default_clickup_url(),
            api_token: None,
            timeout_seconds: default_clickup_timeout(),
        }
    }
}

fn default_clickup_url() -> String {
    crate::clickup::client::DEFAULT_API_URL.to_string()
}

fn default_clickup_timeout() -> u64 {
    30
}

/// Language-model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_llm_url")]
    pub api_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in the response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    /// API key. When absent, reports use the built-in template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_llm_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_llm_timeout(),
            api_key: None,
        }
    }
}

fn default_llm_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "mixtral-8x7b-32768".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_llm_timeout() -> u64 {
    120
}

/// Dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Time window applied when a request doesn't give `days_back`.
    #[serde(default = "default_days_back")]
    pub default_days_back: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_days_back: default_days_back(),
        }
    }
}

fn default_days_back() -> u32 {
    30
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory generated reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// List names shown per assignee in template reports.
    #[serde(default = "default_list_limit")]
    pub max_lists_per_assignee: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_lists_per_assignee: default_list_limit(),
        }
    }
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_list_limit() -> usize {
    5
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence over
    /// config file settings, but only when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref token) = args.token {
            self.clickup.api_token = Some(token.clone());
        }
        if let Some(ref url) = args.clickup_url {
            self.clickup.api_url = url.clone();
        }
        if let Some(ref key) = args.llm_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(ref model) = args.llm_model {
            self.llm.model = model.clone();
        }
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }

        // Blank credentials mean "not set"
        self.clickup.api_token = self.clickup.api_token.take().filter(|t| !t.trim().is_empty());
        self.llm.api_key = self.llm.api_key.take().filter(|k| !k.trim().is_empty());

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
