//! Issue list: filter, sort, change-flash tracking and the table itself.

use super::message::Message;
use super::ui::layout::{display_width, line_text, pad_line_to_width, split_line, wrapped_height};
use super::ui::table::{Column, Table};
use super::ui::theme::Theme;
use crate::config::UiConfig;
use crate::data::sorting::compare_issues;
use crate::data::{relative_age, Issue, IssueFilter, SortField, StatsSummary, StatusFilter};
use crate::integrations::Snapshot;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const CURSOR: &str = "> ";
const NO_CURSOR: &str = "  ";
const CURSOR_WIDTH: usize = 2;
/// Rows taken by the column header and the separator below it.
const TABLE_CHROME: usize = 2;
const MAX_FILTER_LEN: usize = 100;

const COL_ID: usize = 0;
const COL_PRI: usize = 1;
const COL_STATUS: usize = 2;
const COL_TYPE: usize = 3;
const COL_TITLE: usize = 5;
const COL_DUE: usize = 7;
const COL_AGE: usize = 8;

/// Browsing takes single-key commands; Filtering edits the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Browsing,
    Filtering,
}

pub struct ListView {
    theme: Arc<Theme>,
    issues: Vec<Issue>,
    ready: HashSet<String>,
    stats: Option<StatsSummary>,
    /// Indices into `issues` after filtering and sorting.
    visible: Vec<usize>,
    closed_children: HashMap<String, usize>,
    /// `updated_at` per id from the previous load; `None` before the first one.
    prev_updated: Option<HashMap<String, Option<DateTime<Utc>>>>,
    flashing: HashSet<String>,
    filter: IssueFilter,
    filter_before: String,
    sort: SortField,
    reverse: bool,
    mode: InputMode,
    cursor: usize,
    offset: usize,
    width: usize,
    height: usize,
    status_message: Option<String>,
}

fn columns() -> Vec<Column> {
    vec![
        Column::fit("ID", 4, 20),
        Column::fixed("PRI", 3),
        Column::fit("STATUS", 6, 12),
        Column::fit("TYPE", 4, 10),
        Column::fit("DONE", 4, 7).right(),
        Column::flex("TITLE", 10, 0),
        Column::fit("ASSIGNEE", 1, 14).right(),
        Column::fit("DUE", 1, 6).right(),
        Column::fit("AGE", 3, 5).right(),
        Column::fit("CMT", 1, 4).right(),
        Column::fit("DEPS", 4, 7).right(),
    ]
}

impl ListView {
    pub fn new(theme: Arc<Theme>, config: &UiConfig) -> Self {
        Self {
            theme,
            issues: Vec::new(),
            ready: HashSet::new(),
            stats: None,
            visible: Vec::new(),
            closed_children: HashMap::new(),
            prev_updated: None,
            flashing: HashSet::new(),
            filter: IssueFilter {
                hide_closed: config.hide_closed,
                ..Default::default()
            },
            filter_before: String::new(),
            sort: config.default_sort,
            reverse: false,
            mode: InputMode::Browsing,
            cursor: 0,
            offset: 0,
            width: 80,
            height: 24,
            status_message: None,
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width as usize;
        self.height = height as usize;
        self.ensure_visible();
    }

    /// Replace the issue collection.
    ///
    /// Returns true when at least one issue changed since the previous load
    /// and is now flashing. The first load never flashes.
    pub fn set_data(&mut self, snapshot: Snapshot) -> bool {
        let Snapshot {
            issues,
            ready,
            stats,
        } = snapshot;

        let selected = self.selected().map(|i| i.id.clone());
        let mut has_flashes = false;
        if let Some(prev) = &self.prev_updated {
            for issue in &issues {
                let unchanged = prev
                    .get(&issue.id)
                    .is_some_and(|updated| *updated == issue.updated_at);
                if !unchanged {
                    self.flashing.insert(issue.id.clone());
                    has_flashes = true;
                }
            }
        }
        self.prev_updated = Some(
            issues
                .iter()
                .map(|i| (i.id.clone(), i.updated_at))
                .collect(),
        );

        self.closed_children = count_closed_children(&issues);
        self.issues = issues;
        self.ready = ready;
        self.stats = stats;
        self.apply_keeping(selected);
        has_flashes
    }

    pub fn clear_flashes(&mut self) {
        self.flashing.clear();
    }

    pub fn is_flashing(&self, id: &str) -> bool {
        self.flashing.contains(id)
    }

    pub fn flashing(&self) -> &HashSet<String> {
        &self.flashing
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status_message = message;
    }

    pub fn selected(&self) -> Option<&Issue> {
        self.visible.get(self.cursor).map(|&i| &self.issues[i])
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Issues in display order.
    pub fn visible_issues(&self) -> impl Iterator<Item = &Issue> {
        self.visible.iter().map(|&i| &self.issues[i])
    }

    pub fn visible_ids(&self) -> Vec<&str> {
        self.visible_issues().map(|i| i.id.as_str()).collect()
    }

    pub fn filter(&self) -> &IssueFilter {
        &self.filter
    }

    pub fn sort_field(&self) -> SortField {
        self.sort
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_filtering(&self) -> bool {
        self.mode == InputMode::Filtering
    }

    /// Closed children of `id` found among the loaded issues.
    pub fn closed_children(&self, id: &str) -> usize {
        self.closed_children.get(id).copied().unwrap_or(0)
    }

    /// Re-run filter and sort, keeping the selected issue where possible.
    fn apply(&mut self) {
        let selected = self.selected().map(|i| i.id.clone());
        self.apply_keeping(selected);
    }

    fn apply_keeping(&mut self, selected: Option<String>) {
        let mut visible: Vec<usize> = self
            .issues
            .iter()
            .enumerate()
            .filter(|(_, issue)| self.filter.matches(issue, &self.ready))
            .map(|(i, _)| i)
            .collect();
        let issues = &self.issues;
        visible.sort_by(|&a, &b| compare_issues(&issues[a], &issues[b], self.sort, self.reverse));
        self.visible = visible;

        if let Some(id) = selected {
            if let Some(pos) = self.visible.iter().position(|&i| self.issues[i].id == id) {
                self.cursor = pos;
            }
        }
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        if self.visible.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len() - 1;
        }
        self.ensure_visible();
    }

    fn ensure_visible(&mut self) {
        let rows = self.visible_rows();
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + rows {
            self.offset = self.cursor + 1 - rows;
        }
        let max_offset = self.visible.len().saturating_sub(rows);
        self.offset = self.offset.min(max_offset);
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.ensure_visible();
    }

    /// Table rows that fit between the chrome.
    pub fn visible_rows(&self) -> usize {
        let mut chrome = wrapped_height(&self.header_line(), self.width)
            + TABLE_CHROME
            + wrapped_height(&self.status_line(), self.width);
        if self.is_filtering() {
            chrome += 1;
        }
        self.height.saturating_sub(chrome).max(1)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Message> {
        match self.mode {
            InputMode::Browsing => self.handle_browsing(key),
            InputMode::Filtering => {
                self.handle_filtering(key);
                None
            }
        }
    }

    fn handle_browsing(&mut self, key: KeyEvent) -> Option<Message> {
        let half_page = (self.visible_rows() / 2).max(1) as isize;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('d') if ctrl => self.move_cursor(half_page),
            KeyCode::Char('u') if ctrl => self.move_cursor(-half_page),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.move_cursor(isize::MIN / 2),
            KeyCode::Char('G') | KeyCode::End => self.move_cursor(isize::MAX / 2),
            KeyCode::PageDown => self.move_cursor(self.visible_rows() as isize),
            KeyCode::PageUp => self.move_cursor(-(self.visible_rows() as isize)),
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.apply();
            }
            KeyCode::Char('S') => {
                self.reverse = !self.reverse;
                self.apply();
            }
            KeyCode::Char('c') => {
                self.filter.hide_closed = !self.filter.hide_closed;
                self.apply();
            }
            KeyCode::Char(digit @ '0'..='7') => {
                if let Some(selected) = StatusFilter::from_digit(digit) {
                    self.filter.status = self.filter.status.toggle(selected);
                    self.apply();
                }
            }
            KeyCode::Char('/') => {
                self.filter_before = self.filter.text.clone();
                self.mode = InputMode::Filtering;
                self.ensure_visible();
            }
            KeyCode::Esc => {
                if !self.filter.text.is_empty() || self.filter.status != StatusFilter::All {
                    self.filter.text.clear();
                    self.filter.status = StatusFilter::All;
                    self.apply();
                }
            }
            KeyCode::Enter => {
                return self.selected().map(|i| Message::OpenIssue(i.id.clone()));
            }
            _ => {}
        }
        None
    }

    fn handle_filtering(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.mode = InputMode::Browsing;
                self.ensure_visible();
            }
            KeyCode::Esc => {
                self.filter.text = std::mem::take(&mut self.filter_before);
                self.mode = InputMode::Browsing;
                self.apply();
            }
            KeyCode::Backspace => {
                self.filter.text.pop();
                self.apply();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter.text.clear();
                self.apply();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.filter.text.chars().count() < MAX_FILTER_LEN {
                    self.filter.text.push(c);
                    self.apply();
                }
            }
            _ => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    pub fn header_line(&self) -> Line<'static> {
        let theme = &self.theme;
        let mut left = vec![
            Span::styled("bdy", theme.title),
            Span::styled(format!("  {} issues", self.visible.len()), theme.header),
        ];
        if let Some(stats) = &self.stats {
            for (count, label) in [
                (stats.open_issues, "open"),
                (stats.in_progress_issues, "in progress"),
                (stats.blocked_issues, "blocked"),
                (stats.ready_issues, "ready"),
                (stats.closed_issues, "closed"),
            ] {
                left.push(Span::styled(format!("  {count} {label}"), theme.header));
            }
        }

        let mut right = Vec::new();
        let arrow = if self.reverse { "↓" } else { "" };
        right.push(Span::styled(
            format!("sort: {}{}", self.sort.label(), arrow),
            theme.header,
        ));
        if self.filter.status != StatusFilter::All {
            right.push(Span::styled(
                format!("  filter: {}", self.filter.status.label()),
                theme.header,
            ));
        }
        if !self.filter.text.is_empty() {
            right.push(Span::styled(
                format!("  search: {}", self.filter.text),
                theme.header,
            ));
        }
        if !self.filter.hide_closed {
            right.push(Span::styled("  +closed", theme.header));
        }

        let mut line = split_line(left, right, self.width);
        for span in &mut line.spans {
            span.style = theme.header.patch(span.style);
        }
        line
    }

    pub fn status_line(&self) -> Line<'static> {
        if let Some(msg) = &self.status_message {
            return Line::from(Span::styled(msg.clone(), self.theme.status_message));
        }
        let hints: &[(&str, &str)] = if self.is_filtering() {
            &[("enter", "apply"), ("esc", "cancel")]
        } else {
            &[
                ("j/k", "move"),
                ("enter", "open"),
                ("/", "search"),
                ("s/S", "sort"),
                ("0-7", "filter"),
                ("c", "closed"),
                ("r", "reload"),
                ("?", "help"),
                ("q", "quit"),
            ]
        };
        hint_line(hints, &self.theme)
    }

    fn filter_input_line(&self) -> Line<'static> {
        Line::from(vec![
            Span::styled("/", self.theme.key),
            Span::styled(self.filter.text.clone(), self.theme.text),
            Span::styled("_", self.theme.dim),
        ])
    }

    fn cells(&self, issue: &Issue, now: DateTime<Utc>) -> Vec<String> {
        let id = if issue.pinned {
            format!("* {}", issue.id)
        } else {
            issue.id.clone()
        };
        let done = if issue.dependent_count > 0 {
            format!("{}/{}", self.closed_children(&issue.id), issue.dependent_count)
        } else {
            String::new()
        };
        let assignee = if issue.assignee.is_empty() {
            "-".to_string()
        } else {
            issue.assignee.clone()
        };
        let due = issue
            .due_at
            .map(|due| relative_age(due, now))
            .unwrap_or_default();
        let comments = if issue.comment_count > 0 {
            issue.comment_count.to_string()
        } else {
            String::new()
        };
        let deps = if issue.dependency_count > 0 || issue.dependent_count > 0 {
            format!("{}/{}", issue.dependency_count, issue.dependent_count)
        } else {
            String::new()
        };
        vec![
            id,
            issue.priority_label(),
            issue.status.to_string(),
            issue.issue_type.clone(),
            done,
            issue.title.clone(),
            assignee,
            due,
            relative_age(issue.created_at, now),
            comments,
            deps,
        ]
    }

    fn cell_style(&self, issue: &Issue, col: usize, now: DateTime<Utc>) -> Style {
        let theme = &self.theme;
        match col {
            COL_ID => theme.link,
            COL_PRI => theme.priority(issue.priority),
            COL_STATUS => theme.status(&issue.status),
            COL_TYPE => theme.issue_type(&issue.issue_type),
            COL_TITLE => theme.text,
            COL_DUE if issue.is_overdue(now) => theme.error,
            COL_DUE | COL_AGE => theme.dim,
            _ => theme.text,
        }
    }

    fn resolved_table(&self, rows: &[Vec<String>]) -> Table {
        let mut table = Table::new(columns());
        let mut data_widths = vec![0; table.columns.len()];
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                data_widths[i] = data_widths[i].max(display_width(cell));
            }
        }
        table.resolve(self.width.saturating_sub(CURSOR_WIDTH), &data_widths);
        table
    }

    /// Column header, separator and the visible rows, each `width` wide.
    pub fn body_lines(&self, now: DateTime<Utc>) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let rows_available = self.visible_rows();

        let all_cells: Vec<Vec<String>> = self
            .visible_issues()
            .map(|issue| self.cells(issue, now))
            .collect();
        let table = self.resolved_table(&all_cells);

        let mut lines = Vec::with_capacity(rows_available + TABLE_CHROME);
        let mut header = vec![Span::raw(NO_CURSOR)];
        header.extend(table.render_spans(&table.headers(), |_, _| theme.column_header));
        lines.push(Line::from(header));
        lines.push(Line::from(Span::styled(
            "─".repeat(self.width),
            theme.divider,
        )));

        if self.visible.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("  No issues found.", theme.dim)));
            lines.push(Line::from(Span::styled(
                "  Try clearing filters (press 0 or Esc)",
                theme.dim,
            )));
            return lines;
        }

        let end = (self.offset + rows_available).min(self.visible.len());
        for pos in self.offset..end {
            let issue = &self.issues[self.visible[pos]];
            let selected = pos == self.cursor;
            let row_style = if selected {
                theme.selected
            } else if self.is_flashing(&issue.id) {
                theme.flash
            } else {
                Style::default()
            };

            let marker = if selected { CURSOR } else { NO_CURSOR };
            let mut spans = vec![Span::styled(marker, theme.key)];
            spans.extend(
                table.render_spans(&all_cells[pos], |col, _| self.cell_style(issue, col, now)),
            );
            let mut line = pad_line_to_width(Line::from(spans), self.width);
            for span in &mut line.spans {
                span.style = span.style.patch(row_style);
            }
            lines.push(line);
        }
        lines
    }

    /// Plain-text rows as rendered, without chrome. Useful for inspection.
    pub fn row_texts(&self, now: DateTime<Utc>) -> Vec<String> {
        self.body_lines(now)
            .iter()
            .skip(TABLE_CHROME)
            .map(line_text)
            .collect()
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let width = area.width as usize;
        let header = self.header_line();
        let status = self.status_line();

        let mut constraints = vec![
            Constraint::Length(wrapped_height(&header, width) as u16),
            Constraint::Min(0),
        ];
        if self.is_filtering() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(wrapped_height(&status, width) as u16));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        f.render_widget(
            Paragraph::new(header)
                .style(self.theme.header)
                .wrap(Wrap { trim: false }),
            chunks[0],
        );
        f.render_widget(Paragraph::new(self.body_lines(Utc::now())), chunks[1]);
        if self.is_filtering() {
            f.render_widget(Paragraph::new(self.filter_input_line()), chunks[2]);
        }
        f.render_widget(
            Paragraph::new(status)
                .style(self.theme.status_bar)
                .wrap(Wrap { trim: false }),
            chunks[chunks.len() - 1],
        );
    }
}

/// `key desc  key desc ...` for status bars.
pub(crate) fn hint_line(hints: &[(&str, &str)], theme: &Theme) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (i, (key, desc)) in hints.iter().enumerate() {
        let sep = if i == 0 { "" } else { "  " };
        spans.push(Span::styled(format!("{sep}{key}"), theme.status_bar.patch(theme.key)));
        spans.push(Span::styled(format!(" {desc}"), theme.status_bar));
    }
    Line::from(spans)
}

/// Closed issues per parent id, from parent-child links of closed issues.
fn count_closed_children(issues: &[Issue]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for issue in issues.iter().filter(|i| i.is_closed()) {
        for dep in issue.dependencies.iter().filter(|d| d.is_parent_child()) {
            *counts.entry(dep.target_id().to_string()).or_insert(0) += 1;
        }
    }
    counts
}
