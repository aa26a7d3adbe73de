mod app;
mod detail;
mod list;
mod message;
pub mod ui;

use crate::config::Config;
use crate::integrations::beads::{BdClient, DbWatcher, IssueSource};
use crate::integrations::{clipboard, fetch_snapshot};
use crate::util::send_or_log;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub use app::{App, SPINNER_FRAMES};
pub use detail::{wrap_text, DetailView, SectionKind};
pub use list::{InputMode, ListView};
pub use message::{Command, DetailLoad, Message};

const TICK_RATE: Duration = Duration::from_millis(250);

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run(work_dir: &Path, config: Config) -> Result<()> {
    if !io::stdout().is_terminal() {
        anyhow::bail!("bdy requires an interactive terminal");
    }

    let client = Arc::new(BdClient::new(config.bd.binary.clone(), work_dir));
    let mut app = App::new(work_dir, &config);

    let mut terminal = setup_terminal()?;
    install_panic_hook();

    let result = run_app(&mut terminal, &mut app, client).await;

    app.shutdown().await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Leave the alternate screen before the default hook prints the panic.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        previous(info);
    }));
}

async fn run_app<S: IssueSource>(terminal: &mut Term, app: &mut App, source: Arc<S>) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = Executor::new(source, tx);

    let size = terminal.size()?;
    app.update(Message::Resize {
        width: size.width,
        height: size.height,
    });
    for command in app.init() {
        executor.execute(command, app.watcher());
    }

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK_RATE);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let msg = tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => Message::Key(key),
                Some(Ok(Event::Resize(width, height))) => Message::Resize { width, height },
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(msg) = rx.recv() => msg,
            _ = ticker.tick() => Message::Tick,
        };

        for command in app.update(msg) {
            if !executor.execute(command, app.watcher()) {
                return Ok(());
            }
        }
    }
}

/// Carries out [`Command`]s on background tasks. Results are posted back to
/// the event loop as [`Message`]s.
pub struct Executor<S> {
    source: Arc<S>,
    tx: mpsc::UnboundedSender<Message>,
}

impl<S: IssueSource> Executor<S> {
    pub fn new(source: Arc<S>, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { source, tx }
    }

    /// Start `command`. Returns false when the command asks to quit.
    pub fn execute(&self, command: Command, watcher: Option<&DbWatcher>) -> bool {
        match command {
            Command::FetchData { quiet } => {
                let source = Arc::clone(&self.source);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = fetch_snapshot(source.as_ref())
                        .await
                        .map_err(|e| format!("{e:#}"));
                    send_or_log(&tx, Message::DataLoaded { quiet, result }, "data load");
                });
            }
            Command::FetchDetail { id, load } => {
                let source = Arc::clone(&self.source);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = source.show(&id).await.map_err(|e| format!("{e:#}"));
                    send_or_log(&tx, Message::DetailLoaded { id, load, result }, "detail load");
                });
            }
            Command::WatchForChange => {
                let Some(watcher) = watcher.cloned() else {
                    return true;
                };
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    if watcher.changed().await {
                        send_or_log(&tx, Message::FileChanged, "file change");
                    }
                });
            }
            Command::After(delay, message) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    send_or_log(&tx, message, "timer");
                });
            }
            Command::CopyToClipboard(text) => {
                tokio::task::spawn_blocking(move || {
                    if let Err(e) = clipboard::copy(&text) {
                        tracing::warn!("Failed to copy to clipboard: {:#}", e);
                    }
                });
            }
            Command::Quit => return false,
        }
        true
    }
}
