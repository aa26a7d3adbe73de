//! Filter predicate for the list view.

use super::{Issue, Status};
use std::collections::HashSet;

/// Status class the list is narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    InProgress,
    Blocked,
    Closed,
    /// Unblocked issues, as reported by `bd ready`
    Ready,
    Deferred,
    Pinned,
}

impl StatusFilter {
    /// Filter bound to a digit key (`0` = all).
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '0' => Some(Self::All),
            '1' => Some(Self::Open),
            '2' => Some(Self::InProgress),
            '3' => Some(Self::Blocked),
            '4' => Some(Self::Closed),
            '5' => Some(Self::Ready),
            '6' => Some(Self::Deferred),
            '7' => Some(Self::Pinned),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
            Self::Ready => "ready",
            Self::Deferred => "deferred",
            Self::Pinned => "pinned",
        }
    }

    /// Selecting the active class again resets to `All`.
    pub fn toggle(self, selected: Self) -> Self {
        if self == selected {
            Self::All
        } else {
            selected
        }
    }
}

/// The combined list filter: closed-hiding, status class and search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub hide_closed: bool,
    pub status: StatusFilter,
    pub text: String,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            hide_closed: true,
            status: StatusFilter::All,
            text: String::new(),
        }
    }
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue, ready: &HashSet<String>) -> bool {
        if self.hide_closed && self.status != StatusFilter::Closed && issue.is_closed() {
            return false;
        }
        if !self.matches_status(issue, ready) {
            return false;
        }
        self.matches_text(issue)
    }

    fn matches_status(&self, issue: &Issue, ready: &HashSet<String>) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Open => issue.status == Status::Open,
            StatusFilter::InProgress => issue.status == Status::InProgress,
            StatusFilter::Blocked => issue.status == Status::Blocked,
            StatusFilter::Closed => issue.status == Status::Closed,
            StatusFilter::Deferred => issue.status == Status::Deferred,
            StatusFilter::Ready => ready.contains(&issue.id),
            StatusFilter::Pinned => issue.pinned || issue.status == Status::Pinned,
        }
    }

    fn matches_text(&self, issue: &Issue) -> bool {
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        hit(&issue.id)
            || hit(&issue.title)
            || hit(&issue.issue_type)
            || hit(&issue.assignee)
            || issue.labels.iter().any(|l| hit(l))
    }
}
