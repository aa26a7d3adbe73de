//! Single-issue view: a scrollable document with collapsible sections and
//! navigable links to the parent, dependencies and dependents.
//!
//! The issue is linearized into display lines on every rebuild. Two index
//! tables ride along with the lines: the link targets (for Tab/Enter) and
//! the section headers (for `[`/`]`/`x`). Collapse flags are kept per
//! section kind, so they survive rebuilds caused by resizes or reloads.

use super::list::hint_line;
use super::message::Message;
use super::ui::layout::{display_width, fit_line_to_width, pad_right, split_line, wrapped_height};
use super::ui::theme::Theme;
use crate::data::{format_duration, priority_label, relative_age, DependencyLink, Issue};
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use std::sync::Arc;

const MARGIN: &str = "  ";
const LABEL_WIDTH: usize = 14;
const COMMENT_INDENT: usize = 4;
const MIN_CONTENT_WIDTH: usize = 20;
const BREADCRUMB_SEP: &str = " > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Description,
    Design,
    AcceptanceCriteria,
    Notes,
    Dependencies,
    Dependents,
    Comments,
}

impl SectionKind {
    pub const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }

    fn title(self) -> &'static str {
        match self {
            Self::Description => "DESCRIPTION",
            Self::Design => "DESIGN",
            Self::AcceptanceCriteria => "ACCEPTANCE CRITERIA",
            Self::Notes => "NOTES",
            Self::Dependencies => "DEPENDENCIES",
            Self::Dependents => "DEPENDENTS",
            Self::Comments => "COMMENTS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NavItem {
    line: usize,
    target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Section {
    kind: SectionKind,
    line: usize,
}

/// Greedy word wrap measured in display columns.
///
/// Existing line breaks are kept. Words longer than `width` get a line of
/// their own and are not split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_width = 0;
        for word in paragraph.split_whitespace() {
            let word_width = display_width(word);
            if line.is_empty() {
                line.push_str(word);
                line_width = word_width;
            } else if line_width + 1 + word_width <= width {
                line.push(' ');
                line.push_str(word);
                line_width += 1 + word_width;
            } else {
                out.push(std::mem::take(&mut line));
                line.push_str(word);
                line_width = word_width;
            }
        }
        out.push(line);
    }
    out
}

#[derive(Clone)]
pub struct DetailView {
    theme: Arc<Theme>,
    issue: Issue,
    breadcrumbs: Vec<String>,
    lines: Vec<Line<'static>>,
    nav: Vec<NavItem>,
    sections: Vec<Section>,
    collapsed: [bool; SectionKind::COUNT],
    nav_cursor: Option<usize>,
    section_cursor: Option<usize>,
    scroll: usize,
    width: usize,
    height: usize,
    status_message: Option<String>,
}

impl std::fmt::Debug for DetailView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailView")
            .field("id", &self.issue.id)
            .field("breadcrumbs", &self.breadcrumbs)
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}

impl DetailView {
    pub fn new(
        theme: Arc<Theme>,
        issue: Issue,
        breadcrumbs: Vec<String>,
        width: u16,
        height: u16,
    ) -> Self {
        let mut view = Self {
            theme,
            issue,
            breadcrumbs,
            lines: Vec::new(),
            nav: Vec::new(),
            sections: Vec::new(),
            collapsed: [false; SectionKind::COUNT],
            nav_cursor: None,
            section_cursor: None,
            scroll: 0,
            width: width as usize,
            height: height as usize,
            status_message: None,
        };
        view.rebuild();
        view
    }

    pub fn id(&self) -> &str {
        &self.issue.id
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn breadcrumbs(&self) -> &[String] {
        &self.breadcrumbs
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Link targets in document order.
    pub fn link_targets(&self) -> Vec<&str> {
        self.nav.iter().map(|n| n.target.as_str()).collect()
    }

    pub fn selected_link(&self) -> Option<&str> {
        self.nav_cursor
            .and_then(|i| self.nav.get(i))
            .map(|n| n.target.as_str())
    }

    pub fn selected_section(&self) -> Option<SectionKind> {
        self.section_cursor
            .and_then(|i| self.sections.get(i))
            .map(|s| s.kind)
    }

    pub fn is_collapsed(&self, kind: SectionKind) -> bool {
        self.collapsed[kind.index()]
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status_message = message;
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width as usize;
        self.height = height as usize;
        self.rebuild();
    }

    /// Swap in a fresh copy of the same issue, keeping scroll, cursors and
    /// collapse state.
    pub fn update_issue(&mut self, issue: Issue) {
        self.issue = issue;
        self.rebuild();
    }

    fn content_width(&self) -> usize {
        self.width.saturating_sub(4).max(MIN_CONTENT_WIDTH)
    }

    /// Content lines that fit between header and status bar.
    pub fn visible_lines(&self) -> usize {
        // Sized for the widest scroll indicator
        let chrome = wrapped_height(&self.header_with_percent(100), self.width)
            + wrapped_height(&self.status_line(), self.width);
        self.height.saturating_sub(chrome).max(1)
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.visible_lines())
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.max_scroll() as isize;
        self.scroll = (self.scroll as isize + delta).clamp(0, max) as usize;
    }

    fn ensure_line_visible(&mut self, line: usize) {
        let visible = self.visible_lines();
        if line < self.scroll {
            self.scroll = line;
        } else if line >= self.scroll + visible {
            self.scroll = line + 1 - visible;
        }
        self.clamp_scroll();
    }

    fn rebuild(&mut self) {
        let selected_kind = self.selected_section();
        self.build_content();

        self.nav_cursor = match self.nav_cursor {
            Some(_) if self.nav.is_empty() => None,
            Some(i) => Some(i.min(self.nav.len() - 1)),
            None => None,
        };
        // The section cursor always rests on a section when there is one
        self.section_cursor = selected_kind
            .and_then(|kind| self.sections.iter().position(|s| s.kind == kind))
            .or_else(|| (!self.sections.is_empty()).then_some(0));
        self.clamp_scroll();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────

    fn build_content(&mut self) {
        let theme = Arc::clone(&self.theme);
        let width = self.content_width();
        let now = Utc::now();
        let mut b = ContentBuilder {
            theme: &theme,
            width,
            lines: Vec::new(),
            nav: Vec::new(),
            sections: Vec::new(),
        };
        let issue = &self.issue;

        for line in wrap_text(&issue.title, width) {
            b.push(Line::from(vec![
                Span::raw(MARGIN),
                Span::styled(line, theme.title),
            ]));
        }
        b.blank();

        b.field("ID", issue.id.clone(), theme.link);
        b.field("Priority", issue.priority_label(), theme.priority(issue.priority));
        b.field("Status", issue.status.to_string(), theme.status(&issue.status));
        if !issue.issue_type.is_empty() {
            b.field("Type", issue.issue_type.clone(), theme.issue_type(&issue.issue_type));
        }
        for (label, value) in [
            ("Assignee", &issue.assignee),
            ("Owner", &issue.owner),
            ("Created By", &issue.created_by),
        ] {
            if !value.is_empty() {
                b.field(label, value.clone(), theme.text);
            }
        }
        b.field("Created", timestamp(issue.created_at, now), theme.text);
        if let Some(updated) = issue.updated_at {
            b.field("Updated", timestamp(updated, now), theme.text);
        }
        if let Some(closed) = issue.closed_at {
            b.field("Closed", timestamp(closed, now), theme.text);
        }
        if !issue.close_reason.is_empty() {
            b.field("Close Reason", issue.close_reason.clone(), theme.text);
        }
        if let Some(due) = issue.due_at {
            let style = if issue.is_overdue(now) {
                theme.error
            } else {
                theme.text
            };
            b.field("Due", timestamp(due, now), style);
        }
        if let Some(defer) = issue.defer_until {
            b.field("Defer Until", timestamp(defer, now), theme.text);
        }
        if issue.is_closed() {
            if let Some(lead) = issue.lead_time() {
                b.field("Lead Time", format_duration(lead), theme.text);
            }
        }

        if let Some(parent) = issue.parent.as_deref().filter(|p| !p.is_empty()) {
            b.link(
                Line::from(vec![
                    Span::raw(MARGIN),
                    Span::styled(pad_right("Parent:", LABEL_WIDTH), theme.label),
                    Span::styled(parent.to_string(), theme.link),
                    Span::styled("  (enter to view)", theme.dim),
                ]),
                parent,
            );
        }
        if !issue.labels.is_empty() {
            b.field("Labels", issue.labels.join(", "), theme.text);
        }

        for (kind, text) in [
            (SectionKind::Description, &issue.description),
            (SectionKind::Design, &issue.design),
            (SectionKind::AcceptanceCriteria, &issue.acceptance_criteria),
            (SectionKind::Notes, &issue.notes),
        ] {
            if text.trim().is_empty() {
                continue;
            }
            let collapsed = self.collapsed[kind.index()];
            b.section(kind, kind.title().to_string(), collapsed);
            if !collapsed {
                for line in wrap_text(text, width) {
                    b.push(Line::from(vec![
                        Span::raw(MARGIN),
                        Span::styled(line, theme.text),
                    ]));
                }
            }
        }

        let dependencies: Vec<&DependencyLink> = issue.non_parent_dependencies().collect();
        let dependents: Vec<&DependencyLink> = issue.dependents.iter().collect();
        for (kind, links) in [
            (SectionKind::Dependencies, dependencies),
            (SectionKind::Dependents, dependents),
        ] {
            if links.is_empty() {
                continue;
            }
            let collapsed = self.collapsed[kind.index()];
            b.section(kind, format!("{} ({})", kind.title(), links.len()), collapsed);
            if collapsed {
                continue;
            }
            let last = links.len() - 1;
            for (i, link) in links.into_iter().enumerate() {
                let glyph = if i == last { "└─ " } else { "├─ " };
                b.link(dependency_line(&theme, glyph, link, width), link.target_id());
            }
        }

        if !issue.comments.is_empty() {
            let kind = SectionKind::Comments;
            let collapsed = self.collapsed[kind.index()];
            b.section(
                kind,
                format!("{} ({})", kind.title(), issue.comments.len()),
                collapsed,
            );
            if !collapsed {
                let indent = " ".repeat(COMMENT_INDENT);
                for comment in &issue.comments {
                    b.push(Line::from(vec![
                        Span::raw(MARGIN),
                        Span::styled(comment.author.clone(), theme.label),
                        Span::styled(
                            format!(" ({}):", ago(comment.created_at, now)),
                            theme.dim,
                        ),
                    ]));
                    for line in wrap_text(&comment.text, width.saturating_sub(COMMENT_INDENT)) {
                        b.push(Line::from(vec![
                            Span::raw(MARGIN),
                            Span::raw(indent.clone()),
                            Span::styled(line, theme.text),
                        ]));
                    }
                    b.blank();
                }
            }
        }

        self.lines = b.lines;
        self.nav = b.nav;
        self.sections = b.sections;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Message> {
        let half_page = (self.visible_lines() / 2).max(1) as isize;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('d') if ctrl => self.scroll_by(half_page),
            KeyCode::Char('u') if ctrl => self.scroll_by(-half_page),
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(self.visible_lines() as isize),
            KeyCode::PageUp => self.scroll_by(-(self.visible_lines() as isize)),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = self.max_scroll(),
            KeyCode::Tab => self.cycle_link(true),
            KeyCode::BackTab => self.cycle_link(false),
            KeyCode::Char(']') => self.cycle_section(true),
            KeyCode::Char('[') => self.cycle_section(false),
            KeyCode::Char('x') => self.toggle_section(),
            KeyCode::Enter => {
                return self
                    .selected_link()
                    .map(|target| Message::NavigateToIssue(target.to_string()));
            }
            _ => {}
        }
        None
    }

    fn cycle_link(&mut self, forward: bool) {
        let Some(next) = cycle(self.nav_cursor, self.nav.len(), forward) else {
            return;
        };
        self.nav_cursor = Some(next);
        self.ensure_line_visible(self.nav[next].line);
    }

    fn cycle_section(&mut self, forward: bool) {
        let Some(next) = cycle(self.section_cursor, self.sections.len(), forward) else {
            return;
        };
        self.section_cursor = Some(next);
        self.ensure_line_visible(self.sections[next].line);
    }

    fn toggle_section(&mut self) {
        let Some(kind) = self
            .selected_section()
            .or_else(|| self.sections.first().map(|s| s.kind))
        else {
            return;
        };
        let flag = &mut self.collapsed[kind.index()];
        *flag = !*flag;
        self.rebuild();
        if let Some(section) = self.sections.iter().find(|s| s.kind == kind) {
            self.ensure_line_visible(section.line);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    pub fn header_line(&self) -> Line<'static> {
        let max = self.max_scroll();
        let percent = if max == 0 { 100 } else { self.scroll * 100 / max };
        self.header_with_percent(percent)
    }

    fn header_with_percent(&self, percent: usize) -> Line<'static> {
        let theme = &self.theme;
        let mut left = vec![Span::raw(" ")];
        for crumb in &self.breadcrumbs {
            left.push(Span::styled(crumb.clone(), theme.header.patch(theme.dim)));
            left.push(Span::styled(BREADCRUMB_SEP, theme.header.patch(theme.dim)));
        }
        left.push(Span::styled(
            self.issue.id.clone(),
            theme.header.patch(theme.title),
        ));
        left.push(Span::styled(
            format!("  {}", self.issue.priority_label()),
            theme.header.patch(theme.priority(self.issue.priority)),
        ));
        left.push(Span::styled(
            format!("  {}", self.issue.status),
            theme.header.patch(theme.status(&self.issue.status)),
        ));
        if !self.issue.issue_type.is_empty() {
            left.push(Span::styled(
                format!("  {}", self.issue.issue_type),
                theme.header.patch(theme.issue_type(&self.issue.issue_type)),
            ));
        }

        let right = vec![Span::styled(format!("{percent}% "), theme.header)];
        split_line(left, right, self.width)
    }

    pub fn status_line(&self) -> Line<'static> {
        if let Some(msg) = &self.status_message {
            return Line::from(Span::styled(msg.clone(), self.theme.status_message));
        }
        hint_line(
            &[
                ("j/k", "scroll"),
                ("tab", "link"),
                ("enter", "open"),
                ("[/]", "section"),
                ("x", "fold"),
                ("y", "copy id"),
                ("r", "reload"),
                ("esc", "back"),
                ("?", "help"),
            ],
            &self.theme,
        )
    }

    /// Lines currently in the viewport, with link and section highlights.
    pub fn visible_content(&self) -> Vec<Line<'static>> {
        let selected_link = self.nav_cursor.and_then(|i| self.nav.get(i)).map(|n| n.line);
        let selected_section = self
            .section_cursor
            .and_then(|i| self.sections.get(i))
            .map(|s| s.line);

        self.lines
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(self.visible_lines())
            .map(|(i, line)| {
                let highlight = if Some(i) == selected_link {
                    Some(self.theme.selected)
                } else if Some(i) == selected_section {
                    Some(self.theme.section_selected)
                } else {
                    None
                };
                match highlight {
                    Some(style) => highlight_line(line.clone(), style),
                    None => line.clone(),
                }
            })
            .collect()
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let width = area.width as usize;
        let header = self.header_line();
        let status = self.status_line();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(wrapped_height(&header, width) as u16),
                Constraint::Min(0),
                Constraint::Length(wrapped_height(&status, width) as u16),
            ])
            .split(area);

        f.render_widget(
            Paragraph::new(header)
                .style(self.theme.header)
                .wrap(Wrap { trim: false }),
            chunks[0],
        );
        f.render_widget(Paragraph::new(self.visible_content()), chunks[1]);
        f.render_widget(
            Paragraph::new(status)
                .style(self.theme.status_bar)
                .wrap(Wrap { trim: false }),
            chunks[2],
        );
    }
}

struct ContentBuilder<'a> {
    theme: &'a Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    nav: Vec<NavItem>,
    sections: Vec<Section>,
}

impl ContentBuilder<'_> {
    fn push(&mut self, line: Line<'static>) {
        self.lines.push(line);
    }

    fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    fn field(&mut self, label: &str, value: String, style: Style) {
        self.lines.push(Line::from(vec![
            Span::raw(MARGIN),
            Span::styled(pad_right(&format!("{label}:"), LABEL_WIDTH), self.theme.label),
            Span::styled(value, style),
        ]));
    }

    fn link(&mut self, line: Line<'static>, target: &str) {
        self.nav.push(NavItem {
            line: self.lines.len(),
            target: target.to_string(),
        });
        self.lines.push(line);
    }

    fn section(&mut self, kind: SectionKind, title: String, collapsed: bool) {
        self.blank();
        let marker = if collapsed { "▶ " } else { "▼ " };
        self.sections.push(Section {
            kind,
            line: self.lines.len(),
        });
        self.lines.push(Line::from(vec![
            Span::raw(MARGIN),
            Span::styled(format!("{marker}{title}"), self.theme.section),
        ]));
        self.lines.push(Line::from(vec![
            Span::raw(MARGIN),
            Span::styled("─".repeat(self.width), self.theme.divider),
        ]));
    }
}

fn dependency_line(
    theme: &Theme,
    glyph: &'static str,
    link: &DependencyLink,
    width: usize,
) -> Line<'static> {
    let line = Line::from(vec![
        Span::raw(MARGIN),
        Span::styled(glyph, theme.divider),
        Span::styled(link.target_id().to_string(), theme.link),
        Span::raw("  "),
        Span::styled(link.status.to_string(), theme.status(&link.status)),
        Span::raw("  "),
        Span::styled(priority_label(link.priority), theme.priority(link.priority)),
        Span::raw("  "),
        Span::styled(link.title.clone(), theme.text),
    ]);
    fit_line_to_width(line, width + MARGIN.len())
}

fn ago(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match relative_age(t, now).as_str() {
        "now" => "just now".to_string(),
        age => format!("{age} ago"),
    }
}

fn timestamp(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format!("{} ({})", t.format("%Y-%m-%d %H:%M"), ago(t, now))
}

fn highlight_line(mut line: Line<'static>, style: Style) -> Line<'static> {
    for span in &mut line.spans {
        span.style = span.style.patch(style);
    }
    line
}

/// Next index in a wrapping cycle over `len` items; `None` when empty.
fn cycle(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (current, forward) {
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    })
}
