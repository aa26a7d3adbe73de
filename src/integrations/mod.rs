pub mod beads;
pub mod clipboard;

use crate::data::{Issue, StatsSummary};
use anyhow::Result;
use beads::IssueSource;
use std::collections::HashSet;

/// Everything the list view needs from one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub issues: Vec<Issue>,
    pub ready: HashSet<String>,
    pub stats: Option<StatsSummary>,
}

/// Load the full issue set plus the secondary ready-set and stats.
///
/// Only the issue list is fatal. A failing `ready` or `stats` call degrades
/// to an empty set / no stats.
pub async fn fetch_snapshot<S: IssueSource>(source: &S) -> Result<Snapshot> {
    let (issues, ready, stats) = tokio::join!(source.list_all(), source.ready(), source.stats());
    let issues = issues?;

    let ready = match ready {
        Ok(ready) => ready.into_iter().map(|i| i.id).collect(),
        Err(e) => {
            tracing::debug!("Failed to fetch ready set: {:#}", e);
            HashSet::new()
        }
    };

    let stats = match stats {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::debug!("Failed to fetch stats: {:#}", e);
            None
        }
    };

    Ok(Snapshot {
        issues,
        ready,
        stats,
    })
}
