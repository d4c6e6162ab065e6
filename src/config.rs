use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Log file to classify, one entry per line
    #[arg(long, env = "LOGTAGGER_INPUT", default_value = "logs.txt")]
    pub input: PathBuf,

    /// Where to write the JSON results
    #[arg(long, env = "LOGTAGGER_OUTPUT", default_value = "output.json")]
    pub output: PathBuf,

    /// Maximum requests allowed per day
    #[arg(long, env = "MAX_DAILY_REQUESTS", default_value = "20")]
    pub max_daily_requests: usize,

    /// Maximum requests allowed per minute
    #[arg(long, env = "MAX_REQUESTS_PER_MINUTE", default_value = "5")]
    pub max_requests_per_minute: u32,

    /// Maximum log lines sent in a single request
    #[arg(long, env = "MAX_ITEMS_PER_BATCH", default_value = "7")]
    pub max_items_per_batch: usize,

    /// Pause between requests in seconds
    #[arg(long, env = "REQUEST_DELAY_SECS", default_value = "15")]
    pub request_delay_secs: u64,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini API base URL
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub base_url: String,

    /// Gemini API version path segment
    #[arg(long, env = "GEMINI_API_VERSION", default_value = "v1beta")]
    pub api_version: String,

    /// Timeout for a single model request in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_daily_requests == 0 {
            anyhow::bail!("--max-daily-requests must be at least 1");
        }
        if self.max_requests_per_minute == 0 {
            anyhow::bail!("--max-requests-per-minute must be at least 1");
        }
        if self.max_items_per_batch == 0 {
            anyhow::bail!("--max-items-per-batch must be at least 1");
        }
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            anyhow::bail!("--api-key or GEMINI_API_KEY must be provided");
        }
        Ok(())
    }
}

/// Settings the dispatch loop needs, independent of the model backend.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub max_daily_requests: usize,
    pub max_requests_per_minute: u32,
    pub max_items_per_batch: usize,
    pub request_delay: Duration,
}

impl DispatchConfig {
    /// The configured delay, stretched if needed so that requests never
    /// outpace the per-minute quota.
    pub fn effective_delay(&self) -> Duration {
        let per_minute_floor = Duration::from_secs(60) / self.max_requests_per_minute.max(1);
        self.request_delay.max(per_minute_floor)
    }
}

impl From<&Config> for DispatchConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_daily_requests: config.max_daily_requests,
            max_requests_per_minute: config.max_requests_per_minute,
            max_items_per_batch: config.max_items_per_batch,
            request_delay: Duration::from_secs(config.request_delay_secs),
        }
    }
}
