//! Access to issue data through the `bd` command-line tool.
//!
//! Every call shells out to `bd <args> --json` in the working directory and
//! parses the JSON printed on stdout.

pub mod watcher;

use crate::data::{Issue, StatsSummary};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub use watcher::DbWatcher;

/// Read-only source of issue data.
pub trait IssueSource: Send + Sync + 'static {
    /// Every issue, closed ones included.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Issue>>> + Send;
    /// Issues with no open blockers.
    fn ready(&self) -> impl Future<Output = Result<Vec<Issue>>> + Send;
    /// One issue with dependencies, dependents and comments populated.
    fn show(&self, id: &str) -> impl Future<Output = Result<Issue>> + Send;
    fn stats(&self) -> impl Future<Output = Result<StatsSummary>> + Send;
    /// Startup check that the tool is installed and the directory initialized.
    fn check_available(&self) -> impl Future<Output = Result<()>> + Send;
}

/// `IssueSource` backed by the `bd` binary.
#[derive(Debug, Clone)]
pub struct BdClient {
    binary: String,
    work_dir: PathBuf,
}

impl BdClient {
    pub fn new(binary: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            work_dir: work_dir.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        tracing::debug!("running {} {} --json", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .arg("--json")
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {} {}", self.binary, args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} {} failed: {}",
                self.binary,
                args.join(" "),
                stderr.trim()
            );
        }
        Ok(output.stdout)
    }
}

impl IssueSource for BdClient {
    async fn list_all(&self) -> Result<Vec<Issue>> {
        let out = self.run(&["list", "--all", "--limit", "0"]).await?;
        parse_issue_list(&out)
    }

    async fn ready(&self) -> Result<Vec<Issue>> {
        let out = self.run(&["ready", "--limit", "0"]).await?;
        parse_issue_list(&out)
    }

    async fn show(&self, id: &str) -> Result<Issue> {
        let out = self.run(&["show", id]).await?;
        parse_show(&out, id)
    }

    async fn stats(&self) -> Result<StatsSummary> {
        let out = self.run(&["stats"]).await?;
        parse_stats(&out)
    }

    async fn check_available(&self) -> Result<()> {
        if !binary_on_path(&self.binary) {
            anyhow::bail!("bd CLI not found in PATH. Install with: brew install beads");
        }
        if let Err(e) = self.run(&["stats"]).await {
            tracing::debug!("availability probe failed: {:#}", e);
            anyhow::bail!("beads not initialized in this directory. Run: bd init");
        }
        Ok(())
    }
}

fn binary_on_path(binary: &str) -> bool {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file()))
        .unwrap_or(false)
}

/// Parse the array printed by `bd list` / `bd ready`. Empty output is no issues.
pub fn parse_issue_list(out: &[u8]) -> Result<Vec<Issue>> {
    if out.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let issues: Option<Vec<Issue>> =
        serde_json::from_slice(out).context("Failed to parse issue list")?;
    Ok(issues.unwrap_or_default())
}

/// Parse `bd show`, which prints a one-element array.
pub fn parse_show(out: &[u8], id: &str) -> Result<Issue> {
    parse_issue_list(out)?
        .into_iter()
        .next()
        .with_context(|| format!("issue {id} not found"))
}

pub fn parse_stats(out: &[u8]) -> Result<StatsSummary> {
    #[derive(Deserialize)]
    struct StatsEnvelope {
        #[serde(default)]
        summary: StatsSummary,
    }
    let stats: StatsEnvelope = serde_json::from_slice(out).context("Failed to parse stats")?;
    Ok(stats.summary)
}
