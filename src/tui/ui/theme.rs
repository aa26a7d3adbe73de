//! Colors and text styles, handed to every renderer.

use crate::data::Status;
use ratatui::style::{Color, Modifier, Style};

const BLUE: Color = Color::Rgb(0x4F, 0xC3, 0xF7);
const GREEN: Color = Color::Rgb(0x66, 0xBB, 0x6A);
const YELLOW: Color = Color::Rgb(0xFF, 0xD5, 0x4F);
const RED: Color = Color::Rgb(0xEF, 0x53, 0x50);
const MAGENTA: Color = Color::Rgb(0xCE, 0x93, 0xD8);
const CYAN: Color = Color::Rgb(0x4D, 0xD0, 0xE1);
const GRAY: Color = Color::Rgb(0x75, 0x75, 0x75);
const DIM_GRAY: Color = Color::Rgb(0x42, 0x42, 0x42);
const WHITE: Color = Color::Rgb(0xEE, 0xEE, 0xEE);
const HEADER_BG: Color = Color::Rgb(0x16, 0x21, 0x3E);
const SELECT_BG: Color = Color::Rgb(0x0F, 0x34, 0x60);
const FLASH_BG: Color = Color::Rgb(0x3E, 0x35, 0x16);

/// Immutable style configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub header: Style,
    pub title: Style,
    pub column_header: Style,
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub key: Style,
    pub selected: Style,
    pub flash: Style,
    pub error: Style,
    pub section: Style,
    pub section_selected: Style,
    pub divider: Style,
    pub link: Style,
    pub status_bar: Style,
    pub status_message: Style,
    pub border: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header: Style::default().fg(WHITE).bg(HEADER_BG),
            title: Style::default().fg(BLUE).add_modifier(Modifier::BOLD),
            column_header: Style::default().fg(CYAN).add_modifier(Modifier::BOLD),
            text: Style::default().fg(WHITE),
            dim: Style::default().fg(GRAY),
            label: Style::default().fg(CYAN),
            key: Style::default().fg(YELLOW).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(SELECT_BG).add_modifier(Modifier::BOLD),
            flash: Style::default().bg(FLASH_BG),
            error: Style::default().fg(RED).add_modifier(Modifier::BOLD),
            section: Style::default().fg(MAGENTA).add_modifier(Modifier::BOLD),
            section_selected: Style::default()
                .fg(MAGENTA)
                .bg(SELECT_BG)
                .add_modifier(Modifier::BOLD),
            divider: Style::default().fg(DIM_GRAY),
            link: Style::default().fg(BLUE),
            status_bar: Style::default().fg(GRAY).bg(HEADER_BG),
            status_message: Style::default().fg(GREEN).bg(HEADER_BG),
            border: Style::default().fg(BLUE),
        }
    }
}

impl Theme {
    pub fn priority(&self, priority: i32) -> Style {
        match priority {
            0 => Style::default().fg(RED).add_modifier(Modifier::BOLD),
            1 => Style::default().fg(YELLOW),
            2 => Style::default().fg(BLUE),
            _ => Style::default().fg(GRAY),
        }
    }

    pub fn status(&self, status: &Status) -> Style {
        match status {
            Status::Open => Style::default().fg(GREEN),
            Status::InProgress => Style::default().fg(YELLOW),
            Status::Blocked => Style::default().fg(RED),
            Status::Deferred => Style::default().fg(MAGENTA),
            Status::Closed => Style::default().fg(GRAY),
            Status::Pinned => Style::default().fg(CYAN),
            Status::Other(_) => Style::default().fg(WHITE),
        }
    }

    pub fn issue_type(&self, issue_type: &str) -> Style {
        match issue_type {
            "epic" => Style::default().fg(MAGENTA),
            "bug" => Style::default().fg(RED),
            "feature" => Style::default().fg(GREEN),
            "task" => Style::default().fg(BLUE),
            "chore" => Style::default().fg(GRAY),
            _ => Style::default().fg(WHITE),
        }
    }
}
