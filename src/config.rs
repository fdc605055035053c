use crate::error::{LeaderboardError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Everything the scan needs, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Account whose repositories are scanned.
    pub owner: String,
    /// Optional; only raises the request quota.
    pub token: Option<String>,
    pub api_url: String,
    pub request_timeout: Duration,
    /// Extra attempts per request after the first one.
    pub retries: u32,
    pub retry_delay: Duration,
    /// Upper bound on pages fetched per resource, `None` for unbounded.
    pub max_pages: Option<u32>,
    /// Repositories whose contributors are fetched at the same time.
    pub concurrency: usize,
}

impl Config {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_millis(500),
            max_pages: None,
            concurrency: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(LeaderboardError::Config("owner must not be empty".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(LeaderboardError::Config("timeout must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(LeaderboardError::Config("concurrency must be at least 1".into()));
        }
        if self.max_pages == Some(0) {
            return Err(LeaderboardError::Config("max pages must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => ".csv",
            OutputFormat::Json => ".json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Overwrite,
    /// Keep earlier rows; the header is written only into a new or empty file.
    Append,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub mode: WriteMode,
}

impl ReportOptions {
    pub fn new(path: &str, format: OutputFormat, mode: WriteMode) -> Self {
        let path = if path.ends_with(format.extension()) {
            path.to_string()
        } else {
            format!("{}{}", path, format.extension())
        };
        Self {
            path: PathBuf::from(path),
            format,
            mode,
        }
    }
}
