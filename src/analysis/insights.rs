//! Team workload insights derived from an assignee rollup.
//!
//! These feed both the dashboard JSON and the report generators: workload
//! spread across the team, completion rate per person, and due-date pressure.

use crate::analysis::assignees::{AssigneeRecord, AssigneeRollup};
use crate::analysis::tasks::percentage;
use crate::models::is_completed_status;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Assignees above this multiple of the average load are flagged.
pub const BOTTLENECK_FACTOR: f64 = 1.5;

/// Tasks due within this many days count as upcoming.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// How an assignee's load compares to the team average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadLevel {
    BelowAverage,
    Average,
    AboveAverage,
}

impl fmt::Display for WorkloadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadLevel::BelowAverage => write!(f, "Below Average"),
            WorkloadLevel::Average => write!(f, "Average"),
            WorkloadLevel::AboveAverage => write!(f, "Above Average"),
        }
    }
}

/// Spread of task counts across the team.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkloadProfile {
    pub max_tasks: usize,
    pub min_tasks: usize,
    pub avg_tasks: f64,
    /// Human-readable bottleneck notes, e.g. "High workload for ann".
    pub bottlenecks: Vec<String>,
}

impl WorkloadProfile {
    pub fn from_rollup(rollup: &AssigneeRollup) -> Self {
        let counts: Vec<usize> = rollup.iter().map(|r| r.task_count).collect();
        if counts.is_empty() {
            return Self::default();
        }

        let avg_tasks = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let bottlenecks = rollup
            .iter()
            .filter(|r| r.task_count as f64 > avg_tasks * BOTTLENECK_FACTOR)
            .map(|r| format!("High workload for {}", r.name))
            .collect();

        Self {
            max_tasks: counts.iter().copied().max().unwrap_or(0),
            min_tasks: counts.iter().copied().min().unwrap_or(0),
            avg_tasks,
            bottlenecks,
        }
    }

    /// Classify a task count against the average (±20%).
    pub fn level_for(&self, task_count: usize) -> WorkloadLevel {
        if self.avg_tasks <= 0.0 {
            return WorkloadLevel::Average;
        }
        let ratio = task_count as f64 / self.avg_tasks;
        if ratio > 1.2 {
            WorkloadLevel::AboveAverage
        } else if ratio < 0.8 {
            WorkloadLevel::BelowAverage
        } else {
            WorkloadLevel::Average
        }
    }
}

/// Due-date pressure on one assignee's open tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DueDateMetrics {
    pub overdue_tasks: usize,
    pub upcoming_tasks: usize,
}

impl DueDateMetrics {
    pub fn for_record(record: &AssigneeRecord, now: DateTime<Utc>) -> Self {
        let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
        let mut metrics = Self::default();

        for task in &record.tasks {
            if is_completed_status(&task.status) {
                continue;
            }
            match task.due_date {
                Some(due) if due < now => metrics.overdue_tasks += 1,
                Some(due) if due <= horizon => metrics.upcoming_tasks += 1,
                _ => {}
            }
        }

        metrics
    }
}

/// Derived view of one assignee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssigneeInsight {
    pub id: u64,
    pub name: String,
    pub task_count: usize,
    pub completion_rate: f64,
    pub workload: WorkloadLevel,
    pub due: DueDateMetrics,
}

/// Team-level insights.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamInsights {
    pub workload: WorkloadProfile,
    pub assignees: Vec<AssigneeInsight>,
}

impl TeamInsights {
    pub fn from_rollup(rollup: &AssigneeRollup, now: DateTime<Utc>) -> Self {
        let workload = WorkloadProfile::from_rollup(rollup);
        let assignees = rollup
            .iter()
            .map(|record| AssigneeInsight {
                id: record.id,
                name: record.name.clone(),
                task_count: record.task_count,
                completion_rate: percentage(record.completed_count(), record.task_count),
                workload: workload.level_for(record.task_count),
                due: DueDateMetrics::for_record(record, now),
            })
            .collect();

        Self {
            workload,
            assignees,
        }
    }

    pub fn for_assignee(&self, id: u64) -> Option<&AssigneeInsight> {
        self.assignees.iter().find(|a| a.id == id)
    }
}
