//! Ordering of issues in the list view.
//!
//! Pinned issues always come first. The active field decides the rest, and
//! the reverse flag flips only the field comparison.

use super::Issue;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Priority,
    Created,
    Updated,
    Status,
    Type,
    Id,
}

impl SortField {
    pub fn next(&self) -> Self {
        match self {
            Self::Priority => Self::Created,
            Self::Created => Self::Updated,
            Self::Updated => Self::Status,
            Self::Status => Self::Type,
            Self::Type => Self::Id,
            Self::Id => Self::Priority,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Status => "status",
            Self::Type => "type",
            Self::Id => "id",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Priority,
            Self::Created,
            Self::Updated,
            Self::Status,
            Self::Type,
            Self::Id,
        ]
        .into_iter()
    }
}

/// Compare two issues for display order.
///
/// Pinned issues come first in both directions; `reverse` flips only the
/// field comparison and its tiebreaks.
pub fn compare_issues(a: &Issue, b: &Issue, field: SortField, reverse: bool) -> Ordering {
    let pinned = b.pinned.cmp(&a.pinned);
    if pinned != Ordering::Equal {
        return pinned;
    }
    let ord = compare_field(a, b, field);
    if reverse {
        ord.reverse()
    } else {
        ord
    }
}

fn compare_field(a: &Issue, b: &Issue, field: SortField) -> Ordering {
    match field {
        // Equal priority: newest first
        SortField::Priority => a
            .priority
            .cmp(&b.priority)
            .then_with(|| b.created_at.cmp(&a.created_at)),
        SortField::Created => b.created_at.cmp(&a.created_at),
        SortField::Updated => b.updated_at.cmp(&a.updated_at),
        SortField::Status => a.status.sort_order().cmp(&b.status.sort_order()),
        SortField::Type => a.issue_type.cmp(&b.issue_type),
        SortField::Id => a.id.cmp(&b.id),
    }
}

/// Stable sort; ties keep their incoming relative order.
pub fn sort_issues<T: Borrow<Issue>>(items: &mut [T], field: SortField, reverse: bool) {
    items.sort_by(|a, b| compare_issues(a.borrow(), b.borrow(), field, reverse));
}
