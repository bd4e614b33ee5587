//! Task counting and statistics.

use crate::analysis::walker::SpaceSnapshot;
use crate::models::{Priority, Task};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Task counts for the five fixed priority buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub urgent: usize,
    pub high: usize,
    pub normal: usize,
    pub low: usize,
    pub no_priority: usize,
}

impl PriorityBreakdown {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Urgent => self.urgent,
            Priority::High => self.high,
            Priority::Normal => self.normal,
            Priority::Low => self.low,
            Priority::NoPriority => self.no_priority,
        }
    }

    fn increment(&mut self, priority: Priority) {
        let slot = match priority {
            Priority::Urgent => &mut self.urgent,
            Priority::High => &mut self.high,
            Priority::Normal => &mut self.normal,
            Priority::Low => &mut self.low,
            Priority::NoPriority => &mut self.no_priority,
        };
        *slot += 1;
    }

    /// Buckets in display order (urgent first, no_priority last).
    pub fn iter(&self) -> impl Iterator<Item = (Priority, usize)> + '_ {
        Priority::ALL.iter().map(move |p| (*p, self.get(*p)))
    }

    pub fn total(&self) -> usize {
        self.iter().map(|(_, count)| count).sum()
    }
}

/// Count-based statistics for one space.
///
/// `total_tasks` always equals `completed_tasks + open_tasks`, the sum of
/// `tasks_by_status` and the sum of `tasks_by_priority`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub open_tasks: usize,
    /// Keyed by the exact status label; the set of keys is whatever ClickUp reports.
    pub tasks_by_status: BTreeMap<String, usize>,
    pub tasks_by_priority: PriorityBreakdown,
    pub lists_count: usize,
    pub folders_count: usize,
}

impl TaskStatistics {
    /// Fold every task of a snapshot into fresh statistics.
    pub fn from_snapshot(snapshot: &SpaceSnapshot) -> Self {
        let mut stats = Self {
            lists_count: snapshot.lists_count(),
            folders_count: snapshot.folders_count,
            ..Self::default()
        };

        for (_, task) in snapshot.tasks() {
            stats.record(task);
        }
        debug_assert_eq!(stats.tasks_by_priority.total(), stats.total_tasks);

        stats
    }

    /// Count a single task.
    pub fn record(&mut self, task: &Task) {
        self.total_tasks += 1;

        *self
            .tasks_by_status
            .entry(task.status_label().to_string())
            .or_insert(0) += 1;

        if task.is_completed() {
            self.completed_tasks += 1;
        } else {
            self.open_tasks += 1;
        }

        self.tasks_by_priority.increment(priority_bucket(task));
    }

    /// Share of completed tasks, in percent.
    pub fn completion_percentage(&self) -> f64 {
        percentage(self.completed_tasks, self.total_tasks)
    }
}

/// Map a task to its priority bucket.
///
/// Labels outside the four ClickUp priorities are counted as `no_priority`.
pub fn priority_bucket(task: &Task) -> Priority {
    match task.priority_label() {
        None => Priority::NoPriority,
        Some(label) => Priority::from_label(label).unwrap_or_else(|| {
            warn!(task_id = %task.id, label, "Unrecognised priority label");
            Priority::NoPriority
        }),
    }
}

/// `count / total * 100`, or 0 when `total` is 0.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriorityRef, TaskStatus};

    fn make_task(status: &str, priority: Option<&str>) -> Task {
        Task {
            id: format!("t-{}", status),
            name: "Task".to_string(),
            status: TaskStatus {
                status: status.to_string(),
            },
            priority: priority.map(|p| PriorityRef {
                priority: p.to_string(),
            }),
            due_date: None,
            date_created: None,
            assignees: vec![],
            list: None,
        }
    }

    fn stats_for(tasks: &[Task]) -> TaskStatistics {
        let mut stats = TaskStatistics::default();
        for task in tasks {
            stats.record(task);
        }
        stats
    }

    #[test]
    fn test_completed_status_case_insensitive() {
        let tasks = vec![
            make_task("complete", None),
            make_task("open", None),
            make_task("Done", None),
            make_task("IN PROGRESS", None),
        ];

        let stats = stats_for(&tasks);
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.open_tasks, 2);
    }

    #[test]
    fn test_status_keys_are_exact() {
        let tasks = vec![
            make_task("Done", None),
            make_task("done", None),
            make_task("done", None),
        ];

        let stats = stats_for(&tasks);
        assert_eq!(stats.tasks_by_status.get("Done"), Some(&1));
        assert_eq!(stats.tasks_by_status.get("done"), Some(&2));
        assert_eq!(stats.tasks_by_status.len(), 2);
    }

    #[test]
    fn test_priority_buckets() {
        let tasks = vec![
            make_task("open", None),
            make_task("open", Some("Urgent")),
            make_task("open", Some("urgent")),
            make_task("open", Some("HIGH")),
            make_task("open", Some("low")),
            make_task("open", Some("normal")),
        ];

        let stats = stats_for(&tasks);
        assert_eq!(stats.tasks_by_priority.no_priority, 1);
        assert_eq!(stats.tasks_by_priority.urgent, 2);
        assert_eq!(stats.tasks_by_priority.high, 1);
        assert_eq!(stats.tasks_by_priority.low, 1);
        assert_eq!(stats.tasks_by_priority.normal, 1);
    }

    #[test]
    fn test_unknown_priority_preserves_sum() {
        let tasks = vec![make_task("open", Some("blocker")), make_task("open", Some("low"))];

        let stats = stats_for(&tasks);
        assert_eq!(stats.tasks_by_priority.no_priority, 1);
        assert_eq!(stats.tasks_by_priority.total(), stats.total_tasks);
    }

    #[test]
    fn test_invariants_hold() {
        let tasks = vec![
            make_task("complete", Some("high")),
            make_task("review", None),
            make_task("Closed", Some("normal")),
            make_task("done", Some("urgent")),
            make_task("to do", Some("low")),
        ];

        let stats = stats_for(&tasks);
        assert_eq!(stats.total_tasks, stats.completed_tasks + stats.open_tasks);
        assert_eq!(stats.tasks_by_priority.total(), stats.total_tasks);
        assert_eq!(stats.tasks_by_status.values().sum::<usize>(), stats.total_tasks);
    }

    #[test]
    fn test_percentage_guards_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(TaskStatistics::default().completion_percentage(), 0.0);
    }

    #[test]
    fn test_statistics_json_shape() {
        let stats = stats_for(&[make_task("open", None)]);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["total_tasks"], 1);
        assert_eq!(json["tasks_by_status"]["open"], 1);
        assert_eq!(json["tasks_by_priority"]["no_priority"], 1);
        assert_eq!(json["tasks_by_priority"]["urgent"], 0);
        assert!(json.get("lists_count").is_some());
        assert!(json.get("folders_count").is_some());
    }
}
