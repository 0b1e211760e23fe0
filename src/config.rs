//! Runtime configuration, built once at startup from the environment and
//! passed down explicitly — no process-wide mutable globals.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default unread page size per cycle.
pub const DEFAULT_MAX_MESSAGES: usize = 10;

/// Default wait between successful cycles (seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Default wait after a failed cycle (seconds).
pub const DEFAULT_BACKOFF_INTERVAL_SECS: u64 = 60;

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// API key for the generation service.
    pub gemini_api_key: SecretString,
    /// Generation model name.
    pub gemini_model: String,
    /// OAuth access token for the Gmail API, obtained out of band.
    pub gmail_token: SecretString,
    /// Address drafts are sent from (the triaged account's own address).
    pub from_address: String,
    /// Path of the JSON template store.
    pub template_path: PathBuf,
    /// Maximum unread messages fetched per cycle.
    pub max_messages: usize,
    /// Wait between successful cycles.
    pub poll_interval: Duration,
    /// Wait after a cycle-level error.
    pub backoff_interval: Duration,
}

impl TriageConfig {
    /// Build config from environment variables.
    ///
    /// `GEMINI_API_KEY`, `GMAIL_ACCESS_TOKEN` and `TRIAGE_FROM_ADDRESS` are
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gemini_api_key = require_env("GEMINI_API_KEY")?;
        let gmail_token = require_env("GMAIL_ACCESS_TOKEN")?;
        let from_address = require_env("TRIAGE_FROM_ADDRESS")?;

        let gemini_model =
            std::env::var("TRIAGE_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let template_path = std::env::var("TRIAGE_TEMPLATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("templates.json"));

        let max_messages = parse_env("TRIAGE_MAX_MESSAGES", DEFAULT_MAX_MESSAGES)?;
        let poll_secs = parse_env("TRIAGE_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let backoff_secs = parse_env("TRIAGE_BACKOFF_INTERVAL_SECS", DEFAULT_BACKOFF_INTERVAL_SECS)?;

        Ok(Self {
            gemini_api_key: SecretString::from(gemini_api_key),
            gemini_model,
            gmail_token: SecretString::from(gmail_token),
            from_address,
            template_path,
            max_messages,
            poll_interval: Duration::from_secs(poll_secs),
            backoff_interval: Duration::from_secs(backoff_secs),
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{raw}'"),
        }),
        Err(_) => Ok(default),
    }
}
