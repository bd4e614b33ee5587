//! Markdown report generation.
//!
//! This module renders the built-in template report from the aggregates of
//! one space. The same renderer backs the fallback path of the composer.

use crate::analysis::insights::WorkloadProfile;
use crate::analysis::{percentage, AssigneeRollup, TaskStatistics, TeamInsights};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Everything a report is rendered from.
#[derive(Debug, Clone, Serialize)]
pub struct ReportInput {
    pub space_name: String,
    pub stats: TaskStatistics,
    pub assignees: AssigneeRollup,
    /// Local wall-clock time printed in the report header.
    pub generated_at: DateTime<Local>,
}

impl ReportInput {
    pub fn new(space_name: impl Into<String>, stats: TaskStatistics, assignees: AssigneeRollup) -> Self {
        Self {
            space_name: space_name.into(),
            stats,
            assignees,
            generated_at: Local::now(),
        }
    }

    pub fn insights(&self) -> TeamInsights {
        TeamInsights::from_rollup(&self.assignees, self.generated_at.with_timezone(&Utc))
    }
}

/// Render the template report.
///
/// At most `list_limit` list names are shown per assignee, followed by
/// `...` when there are more.
pub fn generate_markdown_report(input: &ReportInput, list_limit: usize) -> String {
    let insights = input.insights();
    let mut output = String::new();

    // Title
    output.push_str("# ClickUp Workspace Analysis Report\n\n");

    output.push_str(&generate_header_section(input));
    output.push_str(&generate_statistics_section(&input.stats));
    output.push_str(&generate_status_section(&input.stats));
    output.push_str(&generate_priority_section(&input.stats));
    output.push_str(&generate_assignee_section(
        &input.assignees,
        &insights,
        list_limit,
    ));
    output.push_str(&generate_recommendations_section());

    output
}

fn generate_header_section(input: &ReportInput) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Workspace: {}\n", input.space_name));
    section.push_str(&format!(
        "Generated on: {}\n\n",
        input.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    section.push_str("## Executive Summary\n");
    section.push_str(&format!(
        "This report provides an analysis of your ClickUp workspace \"{}\".\n\n",
        input.space_name
    ));

    section
}

fn generate_statistics_section(stats: &TaskStatistics) -> String {
    let mut section = String::new();

    section.push_str("## Task Statistics\n");
    section.push_str(&format!("- **Total Tasks**: {}\n", stats.total_tasks));
    section.push_str(&format!(
        "- **Completed Tasks**: {} ({:.1}%)\n",
        stats.completed_tasks,
        stats.completion_percentage()
    ));
    section.push_str(&format!("- **Open Tasks**: {}\n", stats.open_tasks));
    section.push_str(&format!("- **Number of Lists**: {}\n", stats.lists_count));
    section.push_str(&format!("- **Number of Folders**: {}\n\n", stats.folders_count));

    section
}

fn generate_status_section(stats: &TaskStatistics) -> String {
    let mut section = String::new();

    section.push_str("## Task Status Distribution\n");
    if stats.tasks_by_status.is_empty() {
        section.push_str("_No tasks found._\n");
    }
    for (status, count) in &stats.tasks_by_status {
        section.push_str(&format!(
            "- **{}**: {} ({:.1}%)\n",
            status,
            count,
            percentage(*count, stats.total_tasks)
        ));
    }
    section.push('\n');

    section
}

fn generate_priority_section(stats: &TaskStatistics) -> String {
    let mut section = String::new();

    section.push_str("## Task Priority Distribution\n");
    for (priority, count) in stats.tasks_by_priority.iter() {
        section.push_str(&format!(
            "- **{}**: {} ({:.1}%)\n",
            priority,
            count,
            percentage(count, stats.total_tasks)
        ));
    }
    section.push('\n');

    section
}

fn generate_assignee_section(
    assignees: &AssigneeRollup,
    insights: &TeamInsights,
    list_limit: usize,
) -> String {
    let mut section = String::new();

    section.push_str("## Assignee Workload\n");

    if assignees.is_empty() {
        section.push_str("\n_No assigned tasks found._\n\n");
        return section;
    }

    for record in assignees.iter() {
        section.push_str(&format!("\n### {}\n", record.name));
        section.push_str(&format!("- **Email**: {}\n", record.email));

        match insights.for_assignee(record.id) {
            Some(insight) => {
                section.push_str(&format!(
                    "- **Total Tasks**: {} ({})\n",
                    record.task_count, insight.workload
                ));
                section.push_str(&format!(
                    "- **Completion Rate**: {:.1}%\n",
                    insight.completion_rate
                ));
            }
            None => {
                section.push_str(&format!("- **Total Tasks**: {}\n", record.task_count));
            }
        }

        let shown: Vec<&str> = record
            .lists
            .iter()
            .take(list_limit)
            .map(String::as_str)
            .collect();
        let more = if record.lists.len() > list_limit {
            "..."
        } else {
            ""
        };
        section.push_str(&format!(
            "- **Active in Lists**: {}{}\n",
            shown.join(", "),
            more
        ));
    }

    section.push_str(&generate_bottleneck_note(&insights.workload));
    section.push('\n');

    section
}

fn generate_bottleneck_note(workload: &WorkloadProfile) -> String {
    if workload.bottlenecks.is_empty() {
        return String::new();
    }

    let mut note = String::from("\n**Potential bottlenecks:**\n");
    for bottleneck in &workload.bottlenecks {
        note.push_str(&format!("- {}\n", bottleneck));
    }
    note
}

fn generate_recommendations_section() -> String {
    let mut section = String::new();

    section.push_str("## Recommendations\n");
    section.push_str(
        "1. Review workload distribution among team members to ensure balanced assignments\n",
    );
    section.push_str("2. Address any tasks with high priority that remain unresolved\n");
    section.push_str(
        "3. Consider consolidating or archiving unused lists to streamline workspace\n",
    );

    section
}
