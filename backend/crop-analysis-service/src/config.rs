//! Configuration for the crop analysis service
use crate::providers::ai_gateway::{GatewayConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use serde::Deserialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "crop_analysis_service=debug,actix_web=info,info";

/// Log filter from `RUST_LOG`. Load `.env` before calling this so a filter
/// set there takes effect.
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Main configuration struct, loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Model provider credential. The service starts without it, but every
    /// analysis then fails with a configuration error.
    #[serde(default)]
    pub ai_gateway_api_key: Option<String>,

    /// Chat-completions endpoint of the model provider
    #[serde(default = "default_ai_gateway_url")]
    pub ai_gateway_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    /// Network timeout for the single provider attempt
    #[serde(default = "default_ai_request_timeout_secs")]
    pub ai_request_timeout_secs: u64,

    /// Database connection URL (empty selects the in-memory store)
    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Apply embedded migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// History size when the caller gives no limit
    #[serde(default = "default_history_limit")]
    pub history_default_limit: usize,

    /// Upper bound on caller-provided history limits
    #[serde(default = "default_history_max_limit")]
    pub history_max_limit: usize,

    /// Comma-separated CORS origins, `*` for any
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,
}

fn default_ai_gateway_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_ai_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_ai_request_timeout_secs() -> u64 {
    60
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_history_limit() -> usize {
    10
}

fn default_history_max_limit() -> usize {
    100
}

fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Settings handed to the analysis gateway
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            api_key: self.ai_gateway_api_key.clone(),
            endpoint: self.ai_gateway_url.clone(),
            model: self.ai_model.clone(),
            timeout: Duration::from_secs(self.ai_request_timeout_secs),
        }
    }

    pub fn history(&self) -> HistoryLimits {
        HistoryLimits {
            default_limit: self.history_default_limit,
            max_limit: self.history_max_limit,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Bounds applied to `listRecent` requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
            max_limit: default_history_max_limit(),
        }
    }
}

impl HistoryLimits {
    /// Missing limits use the default; everything is clamped to `1..=max_limit`
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        let max = self.max_limit.max(1);
        requested.unwrap_or(self.default_limit).clamp(1, max)
    }
}
