use super::detail::DetailView;
use super::list::ListView;
use super::message::{Command, DetailLoad, Message};
use super::ui::theme::Theme;
use crate::config::{Config, UiConfig};
use crate::data::Issue;
use crate::integrations::beads::DbWatcher;
use crate::integrations::Snapshot;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::Path;
use std::sync::Arc;

/// Braille spinner frames for loading animation
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Application controller: owns both views, the detail back stack and the
/// load/error/help state, and turns messages into commands.
pub struct App {
    ui: UiConfig,
    theme: Arc<Theme>,
    list: ListView,
    /// Active detail view; `None` while the list is shown.
    detail: Option<DetailView>,
    /// Detail views below the active one, most recent last.
    stack: Vec<DetailView>,
    watcher: Option<DbWatcher>,
    loading: bool,
    error: Option<String>,
    /// Command to re-issue when the user retries from the error view.
    last_failed: Option<Command>,
    show_help: bool,
    spinner: usize,
    /// Bumped per status message so stale expiry timers are ignored.
    status_generation: u64,
    width: u16,
    height: u16,
}

impl App {
    /// Build the controller for `work_dir`. The database watcher is started
    /// here when enabled and available; live refresh is simply off otherwise.
    pub fn new(work_dir: &Path, config: &Config) -> Self {
        let watcher = DbWatcher::new(work_dir, &config.watch);
        if watcher.is_none() {
            tracing::info!("live refresh unavailable for {}", work_dir.display());
        }
        Self::with_watcher(config, watcher)
    }

    pub fn with_watcher(config: &Config, watcher: Option<DbWatcher>) -> Self {
        let theme = Arc::new(Theme::default());
        Self {
            ui: config.ui.clone(),
            list: ListView::new(Arc::clone(&theme), &config.ui),
            theme,
            detail: None,
            stack: Vec::new(),
            watcher,
            loading: true,
            error: None,
            last_failed: None,
            show_help: false,
            spinner: 0,
            status_generation: 0,
            width: 80,
            height: 24,
        }
    }

    /// Commands to schedule at startup.
    pub fn init(&mut self) -> Vec<Command> {
        self.loading = true;
        let mut commands = vec![Command::FetchData { quiet: false }];
        if self.watcher.is_some() {
            commands.push(Command::WatchForChange);
        }
        commands
    }

    /// Stop the watcher. Must run before the process exits.
    pub async fn shutdown(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.close().await;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn watcher(&self) -> Option<&DbWatcher> {
        self.watcher.as_ref()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn list(&self) -> &ListView {
        &self.list
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    /// Ids on the back stack, bottom first.
    pub fn stack_ids(&self) -> Vec<&str> {
        self.stack.iter().map(|d| d.id()).collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    pub fn spinner_frame(&self) -> char {
        SPINNER_FRAMES[self.spinner % SPINNER_FRAMES.len()]
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Update
    // ─────────────────────────────────────────────────────────────────────────

    pub fn update(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Key(key) => self.handle_key(key),
            Message::Resize { width, height } => {
                self.resize(width, height);
                Vec::new()
            }
            Message::Tick => {
                if self.loading {
                    self.spinner = self.spinner.wrapping_add(1);
                }
                Vec::new()
            }
            Message::DataLoaded { quiet, result } => self.on_data_loaded(quiet, result),
            Message::DetailLoaded { id, load, result } => self.on_detail_loaded(id, load, result),
            Message::FileChanged => self.on_file_changed(),
            Message::FlashExpired => {
                self.list.clear_flashes();
                Vec::new()
            }
            Message::StatusExpired(generation) => {
                if generation == self.status_generation {
                    self.set_status(None);
                }
                Vec::new()
            }
            Message::OpenIssue(id) => self.start_detail_load(id, DetailLoad::Open),
            Message::NavigateToIssue(id) => self.start_detail_load(id, DetailLoad::DrillDown),
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.list.set_size(width, height);
        if let Some(detail) = &mut self.detail {
            detail.set_size(width, height);
        }
        for view in &mut self.stack {
            view.set_size(width, height);
        }
    }

    fn on_data_loaded(&mut self, quiet: bool, result: Result<Snapshot, String>) -> Vec<Command> {
        if !quiet {
            self.loading = false;
        }
        match result {
            Ok(snapshot) => {
                tracing::debug!(quiet, issues = snapshot.issues.len(), "data loaded");
                if !quiet {
                    self.clear_error();
                }
                if self.list.set_data(snapshot) {
                    vec![Command::After(self.ui.flash_duration(), Message::FlashExpired)]
                } else {
                    Vec::new()
                }
            }
            Err(e) if quiet => {
                tracing::debug!("quiet reload failed, keeping stale data: {}", e);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("load failed: {}", e);
                self.error = Some(e);
                self.last_failed = Some(Command::FetchData { quiet: false });
                Vec::new()
            }
        }
    }

    fn on_detail_loaded(
        &mut self,
        id: String,
        load: DetailLoad,
        result: Result<Issue, String>,
    ) -> Vec<Command> {
        if load != DetailLoad::Quiet {
            self.loading = false;
        }
        let issue = match result {
            Ok(issue) => issue,
            Err(e) if load == DetailLoad::Quiet => {
                tracing::debug!("quiet detail reload of {} failed: {}", id, e);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("loading {} failed: {}", id, e);
                self.error = Some(e);
                self.last_failed = Some(Command::FetchDetail { id, load });
                return Vec::new();
            }
        };
        if load != DetailLoad::Quiet {
            self.clear_error();
        }

        if load.is_refresh() {
            match &mut self.detail {
                Some(detail) if detail.id() == id => detail.update_issue(issue),
                _ => tracing::debug!("dropping stale refresh of {}", id),
            }
            return Vec::new();
        }

        match load {
            DetailLoad::Open | DetailLoad::Reload | DetailLoad::Quiet => {
                self.stack.clear();
                self.detail = Some(self.new_detail(issue, Vec::new()));
            }
            DetailLoad::DrillDown => {
                let view = match self.detail.take() {
                    Some(current) => {
                        let mut crumbs = current.breadcrumbs().to_vec();
                        crumbs.push(current.id().to_string());
                        self.stack.push(current);
                        self.new_detail(issue, crumbs)
                    }
                    None => self.new_detail(issue, Vec::new()),
                };
                self.detail = Some(view);
            }
        }
        Vec::new()
    }

    fn on_file_changed(&mut self) -> Vec<Command> {
        let mut commands = vec![Command::WatchForChange];
        match &self.detail {
            Some(detail) => commands.push(Command::FetchDetail {
                id: detail.id().to_string(),
                load: DetailLoad::Quiet,
            }),
            None => commands.push(Command::FetchData { quiet: true }),
        }
        commands
    }

    fn new_detail(&self, issue: Issue, breadcrumbs: Vec<String>) -> DetailView {
        DetailView::new(
            Arc::clone(&self.theme),
            issue,
            breadcrumbs,
            self.width,
            self.height,
        )
    }

    fn start_detail_load(&mut self, id: String, load: DetailLoad) -> Vec<Command> {
        if self.loading {
            return Vec::new();
        }
        self.loading = true;
        vec![Command::FetchDetail { id, load }]
    }

    fn clear_error(&mut self) {
        self.error = None;
        self.last_failed = None;
    }

    fn set_status(&mut self, message: Option<String>) {
        self.list.set_status(message.clone());
        if let Some(detail) = &mut self.detail {
            detail.set_status(message);
        }
    }

    fn pop_detail(&mut self) {
        self.detail = self.stack.pop();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return vec![Command::Quit];
        }

        if self.show_help {
            self.show_help = false;
            return Vec::new();
        }

        if self.error.is_some() {
            return match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('q') => vec![Command::Quit],
                KeyCode::Esc => {
                    self.clear_error();
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        let typing = self.detail.is_none() && self.list.is_filtering();
        if !typing && key.code == KeyCode::Char('?') {
            self.show_help = true;
            return Vec::new();
        }

        if self.detail.is_some() {
            self.handle_detail_key(key)
        } else {
            self.handle_list_key(key)
        }
    }

    fn retry(&mut self) -> Vec<Command> {
        let command = self
            .last_failed
            .take()
            .unwrap_or(Command::FetchData { quiet: false });
        self.error = None;
        self.loading = true;
        vec![command]
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if !self.list.is_filtering() {
            match key.code {
                KeyCode::Char('q') => return vec![Command::Quit],
                KeyCode::Char('r') => {
                    if self.loading {
                        return Vec::new();
                    }
                    self.loading = true;
                    return vec![Command::FetchData { quiet: false }];
                }
                KeyCode::Char('y') => {
                    return match self.list.selected().map(|i| i.id.clone()) {
                        Some(id) => self.copy_id(id),
                        None => Vec::new(),
                    };
                }
                _ => {}
            }
        }
        match self.list.handle_key(key) {
            Some(msg) => self.update(msg),
            None => Vec::new(),
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let Some(detail) = &mut self.detail else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.pop_detail();
                Vec::new()
            }
            KeyCode::Char('r') => {
                let id = detail.id().to_string();
                self.start_detail_load(id, DetailLoad::Reload)
            }
            KeyCode::Char('y') => {
                let id = detail.id().to_string();
                self.copy_id(id)
            }
            _ => match detail.handle_key(key) {
                Some(msg) => self.update(msg),
                None => Vec::new(),
            },
        }
    }

    fn copy_id(&mut self, id: String) -> Vec<Command> {
        self.status_generation = self.status_generation.wrapping_add(1);
        self.set_status(Some(format!("Copied {id}")));
        vec![
            Command::CopyToClipboard(id),
            Command::After(
                self.ui.status_duration(),
                Message::StatusExpired(self.status_generation),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        })
    }

    fn make_issue(id: &str) -> Issue {
        Issue {
            id: id.to_string(),
            title: format!("Title {id}"),
            ..Default::default()
        }
    }

    fn loaded_app() -> App {
        let mut app = App::with_watcher(&Config::default(), None);
        app.init();
        app.update(Message::DataLoaded {
            quiet: false,
            result: Ok(Snapshot {
                issues: vec![make_issue("bd-1")],
                ..Default::default()
            }),
        });
        app
    }

    #[test]
    fn test_init_without_watcher_only_fetches() {
        let mut app = App::with_watcher(&Config::default(), None);
        assert_eq!(app.init(), vec![Command::FetchData { quiet: false }]);
        assert!(app.is_loading());
    }

    #[test]
    fn test_tick_advances_spinner_only_while_loading() {
        let mut app = App::with_watcher(&Config::default(), None);
        let first = app.spinner_frame();
        app.update(Message::Tick);
        assert_ne!(app.spinner_frame(), first);

        let mut app = loaded_app();
        let first = app.spinner_frame();
        app.update(Message::Tick);
        assert_eq!(app.spinner_frame(), first);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut app = loaded_app();
        let release = Message::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Release,
            state: KeyEventState::empty(),
        });
        assert!(app.update(release).is_empty());
    }

    #[test]
    fn test_stale_status_expiry_is_ignored() {
        let mut app = loaded_app();
        app.update(key(KeyCode::Char('y')));
        let second = app.update(key(KeyCode::Char('y')));
        assert!(second.contains(&Command::After(
            Config::default().ui.status_duration(),
            Message::StatusExpired(2)
        )));

        app.update(Message::StatusExpired(1));
        assert!(app.list().status_line().spans[0].content.starts_with("Copied"));
        app.update(Message::StatusExpired(2));
        assert!(!app.list().status_line().spans[0].content.starts_with("Copied"));
    }
}
