use crate::config::{OutputFormat, ReportOptions, WriteMode};
use crate::error::{LeaderboardError, Result};
use crate::models::AggregatedContributor;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::info;

pub const CSV_HEADER: &str =
    "Github Username,Total Contributions,Profile,Avatar,Most Contribution To,Contributed To";

pub struct Reporter {
    options: ReportOptions,
}

impl Reporter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn path(&self) -> &Path {
        &self.options.path
    }

    /// Writes the ranked leaderboard. Callers check for an empty leaderboard first.
    pub fn write(&self, contributors: &[AggregatedContributor]) -> Result<()> {
        let path = &self.options.path;
        let persist = |source: std::io::Error| LeaderboardError::Persistence {
            path: path.clone(),
            source,
        };

        match self.options.format {
            OutputFormat::Json => {
                let content = serde_json::to_string_pretty(contributors)
                    .map_err(|e| persist(std::io::Error::other(e)))?;
                fs::write(path, content).map_err(persist)?;
            }
            OutputFormat::Csv => match self.options.mode {
                WriteMode::Overwrite => {
                    fs::write(path, render_csv(contributors, true)).map_err(persist)?;
                }
                WriteMode::Append => {
                    let existing = match fs::read(path) {
                        Ok(bytes) => bytes,
                        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
                        Err(e) => return Err(persist(e)),
                    };
                    let mut content = String::new();
                    if existing.last().is_some_and(|&b| b != b'\n') {
                        content.push('\n');
                    }
                    content.push_str(&render_csv(contributors, existing.is_empty()));

                    let mut file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(path)
                        .map_err(persist)?;
                    file.write_all(content.as_bytes()).map_err(persist)?;
                }
            },
        }

        info!(path = %path.display(), rows = contributors.len(), "report saved");
        Ok(())
    }
}

pub fn render_csv(contributors: &[AggregatedContributor], header: bool) -> String {
    let mut out = String::new();
    if header {
        out.push_str(CSV_HEADER);
        out.push('\n');
    }
    for c in contributors {
        let total = c.total_contributions.to_string();
        let fields = [
            format!("@{}", c.login),
            total,
            c.profile_url.clone(),
            c.avatar_url.clone(),
            c.top_repository.clone().unwrap_or_default(),
            c.all_repositories.clone(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
