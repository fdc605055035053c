use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod error;
mod github_client;
mod models;
mod pagination;
mod report;
mod scanner;

use config::{Config, OutputFormat, ReportOptions, WriteMode, DEFAULT_API_URL};
use github_client::GithubClient;
use models::AggregatedContributor;
use report::Reporter;
use scanner::Scanner;

const SUMMARY_ROWS: usize = 10;

#[derive(Parser)]
#[command(author, version, about = "Rank the contributors of every public repository an account owns", long_about = None)]
struct Cli {
    /// Account whose repositories are scanned
    #[arg(short, long, env = "GITHUB_OWNER")]
    owner: String,

    /// Access token, raises the API request quota
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Output file (extension added from the format)
    #[arg(long, default_value = "contributors")]
    output: String,

    /// Output format (csv, json)
    #[arg(short, long, default_value = "csv")]
    format: String,

    /// Append rows to an existing CSV instead of replacing it
    #[arg(long)]
    append: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Extra attempts for requests that fail at the network or server level
    #[arg(long, default_value = "2")]
    retries: u32,

    /// Stop after this many pages per listing
    #[arg(long)]
    max_pages: Option<u32>,

    /// Repositories whose contributors are fetched at once
    #[arg(short, long, default_value = "1")]
    concurrency: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(self.owner.clone());
        config.token = self.token.clone().filter(|t| !t.is_empty());
        config.api_url = self.api_url.clone();
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config.retries = self.retries;
        config.max_pages = self.max_pages;
        config.concurrency = self.concurrency;
        config
    }

    fn report_options(&self) -> ReportOptions {
        let mode = if self.append {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        };
        ReportOptions::new(&self.output, OutputFormat::from(self.format.as_str()), mode)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = cli.config();
    config.validate()?;
    if config.token.is_none() {
        warn!("no token configured, requests are limited to the anonymous quota");
    }

    let client = GithubClient::new(&config).context("failed to build HTTP client")?;
    let report = Scanner::new(client, config.clone())
        .run()
        .await
        .with_context(|| format!("failed to build leaderboard for {}", config.owner))?;

    info!(
        repositories = report.repositories_scanned,
        skipped = report.skipped_repositories.len(),
        contributors = report.contributors.len(),
        "scan complete"
    );
    for repo in &report.skipped_repositories {
        warn!(repo = %repo, "contributors missing from leaderboard");
    }
    log_entries(report.contributors.iter().take(SUMMARY_ROWS));

    let reporter = Reporter::new(cli.report_options());
    if let Err(e) = reporter.write(&report.contributors) {
        error!(path = %reporter.path().display(), error = %e, "report not written, remaining entries follow");
        log_entries(report.contributors.iter().skip(SUMMARY_ROWS));
        return Err(e.into());
    }

    Ok(())
}

fn log_entries<'a>(entries: impl Iterator<Item = &'a AggregatedContributor>) {
    for c in entries {
        info!(
            login = %c.login,
            total = c.total_contributions,
            top = c.top_repository.as_deref().unwrap_or_default(),
            "leaderboard"
        );
    }
}
