//! TUI rendering module.
//!
//! - `layout` - display-width text utilities and small layout helpers
//! - `table` - column layout engine used by the issue list
//! - `theme` - the style object handed to every renderer
//!
//! The views render themselves; this module picks which one is on screen
//! and draws the app-level overlays (help, loading, error).

pub mod layout;
pub mod table;
pub mod theme;

use self::layout::{pad_right, popup_rect};
use self::theme::Theme;
use crate::tui::App;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEY_COLUMN: usize = 14;

/// Key groups shown in the help overlay.
pub const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j / k", "Move down / up"),
            ("g / G", "Jump to top / bottom"),
            ("ctrl+d / u", "Half page down / up"),
            ("enter", "Open issue"),
            ("esc / q", "Back"),
        ],
    ),
    (
        "Sorting",
        &[("s", "Cycle sort field"), ("S", "Reverse sort order")],
    ),
    (
        "Filtering",
        &[
            ("/", "Search id, title, type, assignee, labels"),
            ("0", "All statuses"),
            ("1-7", "Open, in progress, blocked, closed, ready, deferred, pinned"),
            ("c", "Show / hide closed"),
            ("esc", "Clear filters"),
        ],
    ),
    (
        "Detail View",
        &[
            ("tab / S-tab", "Next / previous link"),
            ("enter", "Open selected link"),
            ("] / [", "Next / previous section"),
            ("x", "Collapse / expand section"),
        ],
    ),
    (
        "Actions",
        &[
            ("r", "Reload"),
            ("y", "Copy issue id"),
            ("?", "Toggle help"),
            ("ctrl+c", "Quit"),
        ],
    ),
];

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    if let Some(error) = app.error() {
        draw_error(f, area, error, app.theme());
    } else if app.is_loading() {
        draw_loading(f, area, app.spinner_frame(), app.theme());
    } else if let Some(detail) = app.detail() {
        detail.render(f, area);
    } else {
        app.list().render(f, area);
    }

    if app.is_help_visible() {
        draw_help(f, area, app.theme());
    }
}

fn draw_loading(f: &mut Frame, area: Rect, spinner: char, theme: &Theme) {
    let mut lines = vec![Line::default(); (area.height / 2) as usize];
    lines.push(Line::from(vec![
        Span::styled(format!("{spinner} "), theme.key),
        Span::styled("Loading beads...", theme.text),
    ]));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_error(f: &mut Frame, area: Rect, error: &str, theme: &Theme) {
    let lines = vec![
        Line::default(),
        Line::default(),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("Error: {error}"), theme.error),
        ]),
        Line::default(),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Press 'r' to retry or 'q' to quit.", theme.dim),
        ]),
    ];
    f.render_widget(
        Paragraph::new(lines).wrap(ratatui::widgets::Wrap { trim: false }),
        area,
    );
}

pub fn help_lines(theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, (title, keys)) in HELP_SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(*title, theme.section)));
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}", pad_right(key, KEY_COLUMN)), theme.key),
                Span::styled(*desc, theme.text),
            ]));
        }
    }
    lines
}

fn draw_help(f: &mut Frame, area: Rect, theme: &Theme) {
    let lines = help_lines(theme);
    let popup = popup_rect(60, 80, 50, lines.len() as u16 + 2, area);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(theme.border),
        ),
        popup,
    );
}
