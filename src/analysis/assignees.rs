//! Per-assignee workload rollup.

use crate::analysis::walker::SpaceSnapshot;
use crate::models::{is_completed_status, Assignee, ListNode, Task};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Label used when an assigned task has no priority.
pub const NO_PRIORITY_LABEL: &str = "No priority";

/// One task, as seen from an assignee's rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub task_name: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub list_name: String,
    /// Raw upstream label, or [`NO_PRIORITY_LABEL`].
    pub priority: String,
}

/// Accumulated workload of one assignee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssigneeRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub task_count: usize,
    /// Names of the lists this assignee has tasks in, sorted.
    pub lists: BTreeSet<String>,
    pub tasks: Vec<TaskSummary>,
}

impl AssigneeRecord {
    fn new(id: u64) -> Self {
        Self {
            id,
            name: String::new(),
            email: String::new(),
            task_count: 0,
            lists: BTreeSet::new(),
            tasks: Vec::new(),
        }
    }

    /// Task count per status label.
    pub fn status_distribution(&self) -> BTreeMap<String, usize> {
        let mut dist = BTreeMap::new();
        for task in &self.tasks {
            *dist.entry(task.status.clone()).or_insert(0) += 1;
        }
        dist
    }

    /// Task count per priority label.
    pub fn priority_distribution(&self) -> BTreeMap<String, usize> {
        let mut dist = BTreeMap::new();
        for task in &self.tasks {
            *dist.entry(task.priority.clone()).or_insert(0) += 1;
        }
        dist
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| is_completed_status(&t.status))
            .count()
    }
}

/// All assignees of a space, keyed by ClickUp user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AssigneeRollup {
    records: BTreeMap<u64, AssigneeRecord>,
}

impl AssigneeRollup {
    pub fn from_snapshot(snapshot: &SpaceSnapshot) -> Self {
        let mut rollup = Self::default();
        for (list, task) in snapshot.tasks() {
            rollup.record(list, task);
        }
        rollup
    }

    /// Credit `task` (found in `list`) to each of its assignees.
    pub fn record(&mut self, list: &ListNode, task: &Task) {
        for assignee in &task.assignees {
            let record = self
                .records
                .entry(assignee.id)
                .or_insert_with(|| AssigneeRecord::new(assignee.id));

            update_identity(record, assignee);
            record.task_count += 1;
            record.lists.insert(list.name.clone());
            record.tasks.push(TaskSummary {
                task_id: task.id.clone(),
                task_name: task.name.clone(),
                status: task.status_label().to_string(),
                due_date: task.due_date,
                list_name: list.name.clone(),
                priority: task
                    .priority_label()
                    .unwrap_or(NO_PRIORITY_LABEL)
                    .to_string(),
            });
        }
    }

    #[cfg(test)]
    pub fn get(&self, id: u64) -> Option<&AssigneeRecord> {
        self.records.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssigneeRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of task counts; a task with two assignees counts twice.
    pub fn total_assigned_tasks(&self) -> usize {
        self.records.values().map(|r| r.task_count).sum()
    }
}

// Latest-seen identity wins.
fn update_identity(record: &mut AssigneeRecord, assignee: &Assignee) {
    record.name = assignee
        .username
        .clone()
        .unwrap_or_else(|| "No username".to_string());
    record.email = assignee
        .email
        .clone()
        .unwrap_or_else(|| "No email".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriorityRef, TaskStatus};

    fn list(name: &str) -> ListNode {
        ListNode {
            id: format!("id-{}", name),
            name: name.to_string(),
            folder: None,
        }
    }

    fn person(id: u64, username: &str) -> Assignee {
        Assignee {
            id,
            username: Some(username.to_string()),
            email: Some(format!("{}@example.com", username)),
        }
    }

    fn task(id: &str, status: &str, assignees: Vec<Assignee>) -> Task {
        Task {
            id: id.to_string(),
            name: format!("Task {}", id),
            status: TaskStatus {
                status: status.to_string(),
            },
            priority: None,
            due_date: None,
            date_created: None,
            assignees,
            list: None,
        }
    }

    #[test]
    fn test_shared_task_credits_both_assignees() {
        let backlog = list("Backlog");
        let mut rollup = AssigneeRollup::default();
        rollup.record(&backlog, &task("1", "open", vec![person(1, "ann"), person(2, "bob")]));

        assert_eq!(rollup.len(), 2);
        for id in [1, 2] {
            let record = rollup.get(id).unwrap();
            assert_eq!(record.task_count, 1);
            assert_eq!(record.lists.len(), 1);
            assert!(record.lists.contains("Backlog"));
        }
    }

    #[test]
    fn test_list_membership_is_a_set() {
        let backlog = list("Backlog");
        let sprint = list("Sprint");
        let mut rollup = AssigneeRollup::default();
        rollup.record(&backlog, &task("1", "open", vec![person(1, "ann")]));
        rollup.record(&backlog, &task("2", "open", vec![person(1, "ann")]));
        rollup.record(&sprint, &task("3", "done", vec![person(1, "ann")]));

        let record = rollup.get(1).unwrap();
        assert_eq!(record.task_count, 3);
        assert_eq!(record.tasks.len(), 3);
        let lists: Vec<&str> = record.lists.iter().map(String::as_str).collect();
        assert_eq!(lists, vec!["Backlog", "Sprint"]);
        assert_eq!(record.completed_count(), 1);
    }

    #[test]
    fn test_identity_is_latest_seen() {
        let backlog = list("Backlog");
        let mut rollup = AssigneeRollup::default();
        rollup.record(&backlog, &task("1", "open", vec![person(7, "old-name")]));
        rollup.record(
            &backlog,
            &task(
                "2",
                "open",
                vec![Assignee {
                    id: 7,
                    username: Some("new-name".to_string()),
                    email: None,
                }],
            ),
        );

        let record = rollup.get(7).unwrap();
        assert_eq!(record.name, "new-name");
        assert_eq!(record.email, "No email");
    }

    #[test]
    fn test_task_summary_priority_label() {
        let backlog = list("Backlog");
        let mut urgent = task("1", "open", vec![person(1, "ann")]);
        urgent.priority = Some(PriorityRef {
            priority: "urgent".to_string(),
        });

        let mut rollup = AssigneeRollup::default();
        rollup.record(&backlog, &urgent);
        rollup.record(&backlog, &task("2", "open", vec![person(1, "ann")]));

        let dist = rollup.get(1).unwrap().priority_distribution();
        assert_eq!(dist.get("urgent"), Some(&1));
        assert_eq!(dist.get(NO_PRIORITY_LABEL), Some(&1));
    }

    #[test]
    fn test_unassigned_tasks_are_ignored() {
        let mut rollup = AssigneeRollup::default();
        rollup.record(&list("Backlog"), &task("1", "open", vec![]));
        assert!(rollup.is_empty());
        assert_eq!(rollup.total_assigned_tasks(), 0);
    }

    #[test]
    fn test_rollup_serializes_lists_as_sorted_array() {
        let mut rollup = AssigneeRollup::default();
        rollup.record(&list("Zeta"), &task("1", "open", vec![person(3, "cy")]));
        rollup.record(&list("Alpha"), &task("2", "open", vec![person(3, "cy")]));

        let json = serde_json::to_value(&rollup).unwrap();
        assert_eq!(json["3"]["lists"], serde_json::json!(["Alpha", "Zeta"]));
        assert_eq!(json["3"]["task_count"], 2);
    }
}
