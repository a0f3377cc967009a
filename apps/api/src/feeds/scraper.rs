//! Runs the external scraper scripts and returns their JSON output.
//!
//! Feeds: `<python> <script> <url> <feed type label>`.
//! Daily summary: `<python> <summary script> --id <country id>`.
//! Blocks for the caller, no retries, nothing persisted on failure.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::feed::FeedType;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Failed to launch scraper: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Scraper exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("Scraper produced invalid JSON: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ScraperRunner {
    python: PathBuf,
    script: PathBuf,
    summary_script: PathBuf,
}

impl ScraperRunner {
    pub fn new(
        python: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
        summary_script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            python: python.into(),
            script: script.into(),
            summary_script: summary_script.into(),
        }
    }

    /// Scrapes `url` and returns the raw JSON document printed on stdout.
    pub async fn scrape(&self, url: &str, feed_type: FeedType) -> Result<String, ScraperError> {
        info!("Running scraper for {url} ({})", feed_type.label());
        self.run(&self.script, [url, feed_type.label()], url).await
    }

    /// Builds today's summary feed for one country. Output has the same
    /// `{ "channel": ... }` shape as a scraped feed.
    pub async fn daily_summary(&self, country_id: Uuid) -> Result<String, ScraperError> {
        info!(%country_id, "Running daily summary");
        let id = country_id.to_string();
        self.run(&self.summary_script, ["--id", id.as_str()], &id).await
    }

    async fn run<I, S>(
        &self,
        script: &Path,
        args: I,
        target: &str,
    ) -> Result<String, ScraperError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.python)
            .arg(script)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("Scraper failed for {target}: {stderr}");
            return Err(ScraperError::Exit {
                status: output.status.to_string(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        serde_json::from_str::<serde_json::Value>(&stdout)?;
        Ok(stdout)
    }
}
