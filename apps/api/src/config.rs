use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub llm_timeout: Duration,
    pub scraper_python: PathBuf,
    pub scraper_script: PathBuf,
    pub daily_summary_script: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_model: or_default("OPENAI_MODEL", "gpt-4o"),
            openai_base_url: or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            llm_timeout: Duration::from_secs(
                or_default("LLM_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            scraper_python: PathBuf::from(or_default("SCRAPER_PYTHON", "./venv/bin/python")),
            scraper_script: PathBuf::from(or_default("SCRAPER_SCRIPT", "./scripts/scraper.py")),
            daily_summary_script: PathBuf::from(or_default(
                "DAILY_SUMMARY_SCRIPT",
                "./scripts/daily_summary_single.py",
            )),
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}
