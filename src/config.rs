use anyhow::{Context, Result};
use std::env;

pub const GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8888";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20MB

/// Process configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub server_addr: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn new(gemini_api_key: impl Into<String>) -> Self {
        Self {
            gemini_api_key: gemini_api_key.into(),
            gemini_model: GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Build the config from environment variables (call `dotenv()` first).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("GEMINI_API_KEY must be set in .env file")?;

        let mut config = Self::new(api_key.trim());

        if let Some(base) = lookup("GEMINI_API_BASE").filter(|v| !v.trim().is_empty()) {
            config.gemini_api_base = base.trim().trim_end_matches('/').to_string();
        }

        if let Some(addr) = lookup("SERVER_ADDR").filter(|v| !v.trim().is_empty()) {
            config.server_addr = addr.trim().to_string();
        }

        if let Some(limit) = lookup("MAX_UPLOAD_BYTES").filter(|v| !v.trim().is_empty()) {
            config.max_upload_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("MAX_UPLOAD_BYTES is not a byte count: {}", limit))?;
        }

        Ok(config)
    }
}
