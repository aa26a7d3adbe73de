//! Message and Command enums for the Elm Architecture (TEA) loop.
//!
//! Everything that can happen to the application arrives as a [`Message`].
//! [`App::update`](super::App::update) applies it and answers with the
//! [`Command`]s the runtime should carry out: subprocess calls, timers,
//! clipboard writes. Command results come back as further messages, so the
//! state machine itself never blocks and can be driven directly in tests.

use crate::data::Issue;
use crate::integrations::Snapshot;
use crossterm::event::KeyEvent;
use std::time::Duration;

/// Why a detail fetch was started; decides what happens with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLoad {
    /// From the list: the result becomes the active detail view.
    Open,
    /// From a detail view: the current view is pushed onto the back stack.
    DrillDown,
    /// User asked to reload the open issue.
    Reload,
    /// File watcher noticed a change; failures are swallowed.
    Quiet,
}

impl DetailLoad {
    /// Quiet and reload fetches update the view in place.
    pub fn is_refresh(self) -> bool {
        matches!(self, DetailLoad::Reload | DetailLoad::Quiet)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────────────────────
    // Terminal
    // ─────────────────────────────────────────────────────────────────────────
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    /// Periodic redraw tick; advances the loading spinner.
    Tick,

    // ─────────────────────────────────────────────────────────────────────────
    // Command results
    // ─────────────────────────────────────────────────────────────────────────
    DataLoaded {
        quiet: bool,
        result: Result<Snapshot, String>,
    },
    DetailLoaded {
        id: String,
        load: DetailLoad,
        result: Result<Issue, String>,
    },
    /// The beads database changed on disk.
    FileChanged,
    FlashExpired,
    /// Carries the generation of the status message it should clear.
    StatusExpired(u64),

    // ─────────────────────────────────────────────────────────────────────────
    // View requests
    // ─────────────────────────────────────────────────────────────────────────
    /// Enter on a list row.
    OpenIssue(String),
    /// Enter on a parent or dependency link inside a detail view.
    NavigateToIssue(String),
}

/// Side effects requested by [`App::update`](super::App::update).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchData { quiet: bool },
    FetchDetail { id: String, load: DetailLoad },
    /// Wait for the next debounced database change.
    WatchForChange,
    /// Deliver `message` after `delay`.
    After(Duration, Message),
    CopyToClipboard(String),
    Quit,
}
