//! Data models for ClickUp workspaces.
//!
//! This module contains the read-only snapshots fetched from the ClickUp
//! API: teams, spaces, folders, lists, tasks and assignees. Records are
//! immutable once deserialized; aggregates live in [`crate::analysis`].

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Status labels (compared lowercase) that count a task as completed.
pub const COMPLETED_STATUSES: [&str; 3] = ["complete", "completed", "done"];

/// Returns true if the status label is one of the completed statuses.
pub fn is_completed_status(status: &str) -> bool {
    let lowered = status.to_lowercase();
    COMPLETED_STATUSES.contains(&lowered.as_str())
}

/// Priority bucket of a task.
///
/// ClickUp only knows four priorities; tasks without one land in
/// [`Priority::NoPriority`], so every task maps to exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
    NoPriority,
}

impl Priority {
    /// All buckets in display order.
    pub const ALL: [Priority; 5] = [
        Priority::Urgent,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::NoPriority,
    ];

    /// Parse an upstream priority label, ignoring case.
    ///
    /// Returns `None` for labels outside the four ClickUp priorities.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "urgent" => Some(Priority::Urgent),
            "high" => Some(Priority::High),
            "normal" => Some(Priority::Normal),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// The bucket key with a leading capital, as the template report lists it.
impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Urgent => write!(f, "Urgent"),
            Priority::High => write!(f, "High"),
            Priority::Normal => write!(f, "Normal"),
            Priority::Low => write!(f, "Low"),
            Priority::NoPriority => write!(f, "No_priority"),
        }
    }
}

/// A team (ClickUp calls these workspaces).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A space: the root of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A folder grouping lists within a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Reference to the folder a list belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A list: the container that directly holds tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub folder: Option<FolderRef>,
}

/// A user to whom tasks are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// The `status` object of a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskStatus {
    pub status: String,
}

/// The `priority` object of a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriorityRef {
    pub priority: String,
}

/// Reference to the list owning a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListRef {
    pub id: String,
}

/// A task snapshot as returned by the tasks endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Option<PriorityRef>,
    #[serde(default, deserialize_with = "deserialize_epoch_millis")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_epoch_millis")]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(default)]
    pub list: Option<ListRef>,
}

impl Task {
    /// The free-text status label, exactly as ClickUp reports it.
    pub fn status_label(&self) -> &str {
        &self.status.status
    }

    /// Whether the status counts as completed (case-insensitive).
    pub fn is_completed(&self) -> bool {
        is_completed_status(&self.status.status)
    }

    /// The raw priority label, if the task has one.
    pub fn priority_label(&self) -> Option<&str> {
        self.priority.as_ref().map(|p| p.priority.as_str())
    }
}

/// ClickUp encodes timestamps as epoch milliseconds, usually inside a string.
fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(i64),
        Text(String),
    }

    let millis = match Option::<Millis>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Millis::Number(n)) => n,
        Some(Millis::Text(s)) if s.trim().is_empty() => return Ok(None),
        Some(Millis::Text(s)) => s.trim().parse::<i64>().map_err(serde::de::Error::custom)?,
    };

    Utc.timestamp_millis_opt(millis)
        .single()
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", millis)))
}
