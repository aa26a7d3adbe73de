//! Change detection for the beads database.
//!
//! Two background tasks watch `<work_dir>/.beads`: one consumes filesystem
//! notifications and debounces them, the other polls modification times as a
//! fallback for missed events. Both feed a single-slot channel, so at most one
//! change is ever pending; the consumer re-arms by calling [`DbWatcher::changed`]
//! again after handling one.

use crate::config::WatchConfig;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Directory holding the database, relative to the working directory.
pub const DB_DIR: &str = ".beads";

/// Files whose modification means the data changed.
pub const DB_FILES: [&str; 2] = ["beads.db", "beads.db-wal"];

type FsEvent = notify::Result<Event>;

/// Handle to the running watcher. Cheap to clone; all clones share one
/// notification slot.
#[derive(Clone)]
pub struct DbWatcher {
    inner: Arc<Inner>,
}

struct Inner {
    changes: AsyncMutex<mpsc::Receiver<()>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for DbWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbWatcher")
            .field("closed", &*self.inner.shutdown.borrow())
            .finish()
    }
}

impl DbWatcher {
    /// Start watching `<work_dir>/.beads`.
    ///
    /// Returns `None` when watching is disabled, the directory is missing, or
    /// the OS notification mechanism cannot be set up. Callers fall back to
    /// manual refresh. Must be called inside a tokio runtime.
    pub fn new(work_dir: &Path, config: &WatchConfig) -> Option<Self> {
        if !config.enabled {
            tracing::debug!("live refresh disabled by config");
            return None;
        }

        let dir = work_dir.join(DB_DIR);
        if !dir.is_dir() {
            tracing::debug!("{} does not exist, live refresh unavailable", dir.display());
            return None;
        }

        let (fs_tx, fs_rx) = mpsc::unbounded_channel();
        let mut watcher = match RecommendedWatcher::new(
            move |res| {
                let _ = fs_tx.send(res);
            },
            notify::Config::default(),
        ) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!("Failed to create file watcher: {}", e);
                return None;
            }
        };

        if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
            tracing::warn!("Failed to watch {}: {}", dir.display(), e);
            return None;
        }
        for name in DB_FILES {
            let path = dir.join(name);
            if path.exists() {
                if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
                    tracing::debug!("Failed to watch {}: {}", path.display(), e);
                }
            }
        }

        tracing::info!("watching {} for changes", dir.display());
        Some(Self::spawn(
            dir,
            Some(watcher),
            fs_rx,
            config.debounce(),
            config.poll_interval(),
        ))
    }

    fn spawn(
        dir: PathBuf,
        watcher: Option<RecommendedWatcher>,
        fs_rx: mpsc::UnboundedReceiver<FsEvent>,
        debounce: Duration,
        poll_interval: Duration,
    ) -> Self {
        let (change_tx, change_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let push = tokio::spawn(push_loop(
            fs_rx,
            watcher,
            change_tx.clone(),
            shutdown_rx.clone(),
            debounce,
        ));
        let poll = tokio::spawn(poll_loop(dir, poll_interval, change_tx, shutdown_rx));

        Self {
            inner: Arc::new(Inner {
                changes: AsyncMutex::new(change_rx),
                shutdown: shutdown_tx,
                tasks: Mutex::new(vec![push, poll]),
            }),
        }
    }

    /// Wait for the next coalesced change.
    ///
    /// Returns `false` once the watcher has been closed.
    pub async fn changed(&self) -> bool {
        let mut shutdown = self.inner.shutdown.subscribe();
        let closed = *shutdown.borrow();
        if closed {
            return false;
        }
        let mut changes = self.inner.changes.lock().await;
        tokio::select! {
            change = changes.recv() => change.is_some(),
            _ = shutdown.changed() => false,
        }
    }

    /// Stop both loops and release the OS subscription.
    pub async fn close(&self) {
        self.inner.shutdown.send_replace(true);
        let tasks = match self.inner.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for task in tasks {
            if let Err(e) = task.await {
                tracing::debug!("watcher task ended abnormally: {}", e);
            }
        }
        tracing::debug!("watcher closed");
    }
}

/// Queue a change unless one is already pending.
fn signal(changes: &mpsc::Sender<()>) {
    match changes.try_send(()) {
        Ok(()) => tracing::debug!("beads database changed"),
        Err(TrySendError::Full(())) => {}
        Err(TrySendError::Closed(())) => {}
    }
}

/// Path of a database file touched by a write or create, if any.
fn relevant_path(event: &Event) -> Option<&PathBuf> {
    match event.kind {
        EventKind::Create(_) => {}
        EventKind::Modify(ModifyKind::Metadata(_)) => return None,
        EventKind::Modify(_) => {}
        _ => return None,
    }
    event.paths.iter().find(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| DB_FILES.contains(&name))
    })
}

async fn push_loop(
    mut events: mpsc::UnboundedReceiver<FsEvent>,
    mut watcher: Option<RecommendedWatcher>,
    changes: mpsc::Sender<()>,
    mut shutdown: watch::Receiver<bool>,
    debounce: Duration,
) {
    let mut deadline: Option<Instant> = None;
    let mut events_open = true;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = events.recv(), if events_open => match event {
                Some(Ok(event)) => {
                    let Some(path) = relevant_path(&event) else {
                        continue;
                    };
                    // Replaced files need a fresh subscription
                    if matches!(event.kind, EventKind::Create(_)) {
                        if let Some(w) = watcher.as_mut() {
                            if let Err(e) = w.watch(path, RecursiveMode::NonRecursive) {
                                tracing::debug!("Failed to re-watch {}: {}", path.display(), e);
                            }
                        }
                    }
                    deadline = Some(Instant::now() + debounce);
                }
                Some(Err(e)) => tracing::debug!("file watcher error: {}", e),
                None => events_open = false,
            },
            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                signal(&changes);
            }
        }
    }

    drop(watcher);
    tracing::debug!("push loop stopped");
}

async fn poll_loop(
    dir: PathBuf,
    period: Duration,
    changes: mpsc::Sender<()>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last = latest_mtime(&dir);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let current = latest_mtime(&dir);
                if current != last {
                    last = current;
                    signal(&changes);
                }
            }
        }
    }

    tracing::debug!("poll loop stopped");
}

/// Newest modification time across the database files.
fn latest_mtime(dir: &Path) -> Option<SystemTime> {
    DB_FILES
        .iter()
        .filter_map(|name| std::fs::metadata(dir.join(name)).and_then(|m| m.modified()).ok())
        .max()
}
