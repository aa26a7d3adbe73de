use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub mod filter;
pub mod sorting;

pub use filter::{IssueFilter, StatusFilter};
pub use sorting::{sort_issues, SortField};

/// Relationship kind that links a child issue to its parent.
pub const PARENT_CHILD: &str = "parent-child";

/// An issue as reported by the `bd` CLI.
///
/// Snapshots are replaced wholesale on every reload; views never mutate them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub design: String,
    #[serde(default)]
    pub acceptance_criteria: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close_reason: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub defer_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub dependency_count: usize,
    #[serde(default)]
    pub dependent_count: usize,
    #[serde(default)]
    pub comment_count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<DependencyLink>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependents: Vec<DependencyLink>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub parent: Option<String>,
}

impl Issue {
    pub fn is_closed(&self) -> bool {
        self.status == Status::Closed
    }

    /// Due date is in the past and the issue is still open work.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due) => !self.is_closed() && now > due,
            None => false,
        }
    }

    pub fn lead_time(&self) -> Option<Duration> {
        self.closed_at.map(|closed| closed - self.created_at)
    }

    pub fn priority_label(&self) -> String {
        priority_label(self.priority)
    }

    /// Dependencies minus the parent-child entry that duplicates `parent`.
    ///
    /// Only the entry matching the parent id is dropped; any other
    /// parent-child entries are kept for display.
    pub fn non_parent_dependencies(&self) -> impl Iterator<Item = &DependencyLink> {
        let parent = self.parent.as_deref();
        self.dependencies.iter().filter(move |dep| {
            !(dep.is_parent_child() && Some(dep.target_id()) == parent)
        })
    }
}

/// A reference from one issue to another, with enough of the target's
/// attributes to render it inline.
///
/// `bd list` emits the compact form (`depends_on_id` + `type`), while
/// `bd show` embeds the full target issue plus `dependency_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyLink {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub depends_on_id: String,
    #[serde(default, rename = "type")]
    pub link_type: String,
    #[serde(default)]
    pub dependency_type: String,
}

impl DependencyLink {
    /// Identifier of the issue this link points at.
    pub fn target_id(&self) -> &str {
        if self.depends_on_id.is_empty() {
            &self.id
        } else {
            &self.depends_on_id
        }
    }

    pub fn kind(&self) -> &str {
        if self.link_type.is_empty() {
            &self.dependency_type
        } else {
            &self.link_type
        }
    }

    pub fn is_parent_child(&self) -> bool {
        self.kind() == PARENT_CHILD
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts computed by `bd stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSummary {
    pub total_issues: usize,
    pub open_issues: usize,
    pub in_progress_issues: usize,
    pub closed_issues: usize,
    pub blocked_issues: usize,
    pub deferred_issues: usize,
    pub ready_issues: usize,
    pub tombstone_issues: usize,
    pub pinned_issues: usize,
    pub average_lead_time_hours: f64,
}

/// Workflow status of an issue. Unknown strings are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Blocked,
    Deferred,
    Closed,
    Pinned,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Deferred => "deferred",
            Self::Closed => "closed",
            Self::Pinned => "pinned",
            Self::Other(s) => s,
        }
    }

    /// Precedence used by the status sort.
    pub fn sort_order(&self) -> u8 {
        match self {
            Self::InProgress => 0,
            Self::Open => 1,
            Self::Blocked => 2,
            Self::Deferred => 3,
            Self::Pinned => 4,
            Self::Closed => 5,
            Self::Other(_) => 6,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "open" => Self::Open,
            "in_progress" => Self::InProgress,
            "blocked" => Self::Blocked,
            "deferred" => Self::Deferred,
            "closed" => Self::Closed,
            "pinned" => Self::Pinned,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn priority_label(priority: i32) -> String {
    format!("P{priority}")
}

/// Compact age such as `5m`, `3h`, `2d`, `4mo`, `1y`.
///
/// Times in the future are formatted by their distance from `now`.
pub fn relative_age(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let d = if now >= t { now - t } else { t - now };
    let minutes = d.num_minutes();
    let hours = d.num_hours();
    let days = d.num_days();
    if minutes < 1 {
        "now".to_string()
    } else if hours < 1 {
        format!("{minutes}m")
    } else if days < 1 {
        format!("{hours}h")
    } else if days < 30 {
        format!("{days}d")
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

/// Duration as `Xm`, `Xh` or `Xd Yh`.
pub fn format_duration(d: Duration) -> String {
    let hours = d.num_hours();
    if hours < 1 {
        format!("{}m", d.num_minutes().max(0))
    } else if hours < 24 {
        format!("{hours}h")
    } else {
        format!("{}d {}h", hours / 24, hours % 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn relative_age_buckets() {
        let now = at(12, 0);
        assert_eq!(relative_age(now, now), "now");
        assert_eq!(relative_age(at(11, 55), now), "5m");
        assert_eq!(relative_age(at(9, 0), now), "3h");
        assert_eq!(relative_age(now - Duration::days(2), now), "2d");
        assert_eq!(relative_age(now - Duration::days(65), now), "2mo");
        assert_eq!(relative_age(now - Duration::days(800), now), "2y");
    }

    #[test]
    fn relative_age_of_future_time_uses_distance() {
        let now = at(12, 0);
        assert_eq!(relative_age(now + Duration::days(3), now), "3d");
    }

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(Duration::minutes(42)), "42m");
        assert_eq!(format_duration(Duration::hours(5)), "5h");
        assert_eq!(format_duration(Duration::hours(50)), "2d 2h");
    }

    #[test]
    fn status_roundtrips_unknown_values() {
        let status: Status = serde_json::from_str("\"tombstone\"").unwrap();
        assert_eq!(status, Status::Other("tombstone".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"tombstone\"");
        assert_eq!(Status::from("in_progress"), Status::InProgress);
    }

    #[test]
    fn dependency_link_accepts_list_and_show_shapes() {
        let list: DependencyLink = serde_json::from_str(
            r#"{"issue_id":"bd-2","depends_on_id":"bd-1","type":"parent-child"}"#,
        )
        .unwrap();
        assert_eq!(list.target_id(), "bd-1");
        assert!(list.is_parent_child());

        let show: DependencyLink = serde_json::from_str(
            r#"{"id":"bd-9","title":"Blocker","status":"open","priority":1,"dependency_type":"blocks"}"#,
        )
        .unwrap();
        assert_eq!(show.target_id(), "bd-9");
        assert_eq!(show.kind(), "blocks");
        assert!(!show.is_parent_child());
    }

    #[test]
    fn issue_tolerates_null_collections() {
        let issue: Issue = serde_json::from_str(
            r#"{"id":"bd-1","title":"t","status":"open","priority":2,"labels":null,"dependencies":null}"#,
        )
        .unwrap();
        assert!(issue.labels.is_empty());
        assert!(issue.dependencies.is_empty());
        assert_eq!(issue.updated_at, None);
    }

    #[test]
    fn non_parent_dependencies_drops_only_matching_parent_entry() {
        let issue = Issue {
            id: "bd-3".to_string(),
            parent: Some("bd-1".to_string()),
            dependencies: vec![
                DependencyLink {
                    id: "bd-1".to_string(),
                    dependency_type: PARENT_CHILD.to_string(),
                    ..Default::default()
                },
                DependencyLink {
                    id: "bd-7".to_string(),
                    dependency_type: PARENT_CHILD.to_string(),
                    ..Default::default()
                },
                DependencyLink {
                    id: "bd-2".to_string(),
                    dependency_type: "blocks".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let ids: Vec<&str> = issue.non_parent_dependencies().map(|d| d.target_id()).collect();
        assert_eq!(ids, vec!["bd-7", "bd-2"]);
    }

    #[test]
    fn overdue_requires_open_and_past_due() {
        let now = at(12, 0);
        let mut issue = Issue {
            due_at: Some(at(11, 0)),
            ..Default::default()
        };
        assert!(issue.is_overdue(now));
        issue.status = Status::Closed;
        assert!(!issue.is_overdue(now));
        issue.status = Status::Open;
        issue.due_at = Some(at(13, 0));
        assert!(!issue.is_overdue(now));
    }
}
