//! Tests for running controller commands against a fake issue source.

use anyhow::Result;
use beady::data::{Issue, StatsSummary};
use beady::integrations::beads::IssueSource;
use beady::tui::{Command, DetailLoad, Executor, Message};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct FakeSource {
    issues: Vec<Issue>,
}

impl IssueSource for FakeSource {
    async fn list_all(&self) -> Result<Vec<Issue>> {
        Ok(self.issues.clone())
    }

    async fn ready(&self) -> Result<Vec<Issue>> {
        anyhow::bail!("ready unavailable")
    }

    async fn show(&self, id: &str) -> Result<Issue> {
        self.issues
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("issue {id} not found"))
    }

    async fn stats(&self) -> Result<StatsSummary> {
        Ok(StatsSummary {
            total_issues: self.issues.len(),
            ..Default::default()
        })
    }

    async fn check_available(&self) -> Result<()> {
        Ok(())
    }
}

fn make_executor() -> (Executor<FakeSource>, mpsc::UnboundedReceiver<Message>) {
    let source = FakeSource {
        issues: vec![Issue {
            id: "bd-1".to_string(),
            title: "Only issue".to_string(),
            ..Default::default()
        }],
    };
    let (tx, rx) = mpsc::unbounded_channel();
    (Executor::new(Arc::new(source), tx), rx)
}

#[tokio::test]
async fn fetch_data_posts_snapshot_with_degraded_ready_set() {
    let (executor, mut rx) = make_executor();
    assert!(executor.execute(Command::FetchData { quiet: true }, None));

    match rx.recv().await {
        Some(Message::DataLoaded { quiet, result }) => {
            assert!(quiet);
            let snapshot = result.unwrap();
            assert_eq!(snapshot.issues.len(), 1);
            assert!(snapshot.ready.is_empty());
            assert_eq!(snapshot.stats.map(|s| s.total_issues), Some(1));
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_detail_reports_errors_as_text() {
    let (executor, mut rx) = make_executor();
    executor.execute(
        Command::FetchDetail {
            id: "bd-404".to_string(),
            load: DetailLoad::Open,
        },
        None,
    );
    assert_eq!(
        rx.recv().await,
        Some(Message::DetailLoaded {
            id: "bd-404".to_string(),
            load: DetailLoad::Open,
            result: Err("issue bd-404 not found".to_string()),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn after_delivers_message_once_delay_elapses() {
    let (executor, mut rx) = make_executor();
    executor.execute(
        Command::After(Duration::from_secs(2), Message::FlashExpired),
        None,
    );

    tokio::time::sleep(Duration::from_millis(1900)).await;
    assert!(rx.try_recv().is_err());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(rx.recv().await, Some(Message::FlashExpired));
}

#[tokio::test]
async fn watch_without_watcher_is_a_no_op() {
    let (executor, mut rx) = make_executor();
    assert!(executor.execute(Command::WatchForChange, None));
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn quit_stops_execution() {
    let (executor, _rx) = make_executor();
    assert!(!executor.execute(Command::Quit, None));
}
