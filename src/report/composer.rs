//! Report composition.
//!
//! With an LLM key the composer delegates the write-up to the chat service;
//! without one, or when the service fails, it renders the template report.

use crate::analysis::insights::WorkloadProfile;
use crate::config::LlmConfig;
use crate::llm::{ChatClient, LlmError};
use crate::report::generator::{generate_markdown_report, ReportInput};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// System prompt sent with every delegated report.
pub const SYSTEM_PROMPT: &str = "You are a professional project management analyst creating a report based on ClickUp workspace data.";

/// How a report was actually produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// No LLM key; built-in template.
    Template,
    /// Written by the LLM service.
    Delegated,
    /// The LLM call failed; built-in template.
    Fallback,
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::Template => write!(f, "template"),
            ReportMode::Delegated => write!(f, "delegated"),
            ReportMode::Fallback => write!(f, "fallback"),
        }
    }
}

/// Report content together with the mode that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedReport {
    pub content: String,
    pub mode: ReportMode,
}

/// Per-assignee part of the data summary sent to the LLM.
#[derive(Debug, Serialize)]
struct AssigneeSummary<'a> {
    name: &'a str,
    email: &'a str,
    task_count: usize,
    lists: Vec<&'a str>,
    status_distribution: BTreeMap<String, usize>,
    priority_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
struct DataSummary<'a> {
    total_assignees: usize,
    total_tasks: usize,
    assignee_summaries: Vec<AssigneeSummary<'a>>,
    workload: WorkloadProfile,
}

impl<'a> DataSummary<'a> {
    fn from_input(input: &'a ReportInput) -> Self {
        let assignee_summaries = input
            .assignees
            .iter()
            .map(|record| AssigneeSummary {
                name: &record.name,
                email: &record.email,
                task_count: record.task_count,
                lists: record.lists.iter().map(String::as_str).collect(),
                status_distribution: record.status_distribution(),
                priority_distribution: record.priority_distribution(),
            })
            .collect();

        Self {
            total_assignees: input.assignees.len(),
            total_tasks: input.assignees.total_assigned_tasks(),
            assignee_summaries,
            workload: WorkloadProfile::from_rollup(&input.assignees),
        }
    }
}

/// Build the user prompt for a delegated report.
pub fn build_prompt(input: &ReportInput) -> String {
    let summary = DataSummary::from_input(input);
    let stats = &input.stats;

    let by_status = serde_json::to_string(&stats.tasks_by_status).unwrap_or_default();
    let by_priority = serde_json::to_string(&stats.tasks_by_priority).unwrap_or_default();
    let assignees =
        serde_json::to_string_pretty(&summary.assignee_summaries).unwrap_or_default();
    let workload = serde_json::to_string_pretty(&summary.workload).unwrap_or_default();

    format!(
        r#"Please analyze this ClickUp workspace data and create a comprehensive report.

Workspace: {space}

Task Statistics:
Total Tasks: {total}
Completed Tasks: {completed}
Open Tasks: {open}
Number of Lists: {lists}
Number of Folders: {folders}

Tasks by Status: {by_status}
Tasks by Priority: {by_priority}

Assignee Information:
Total Assignees: {total_assignees}
Total Assigned Tasks: {total_assigned}

Workload Profile:
{workload}

Detailed Assignee Information:
{assignees}

Please create a professional report that includes:
1. Executive Summary
2. Workload Distribution Analysis
3. Task Status Overview
4. Priority Distribution Analysis
5. Team Member Performance Insights
6. Recommendations for Workload Balancing
7. Potential Bottlenecks or Areas of Concern

Make the report data-driven but easy to understand. Include specific numbers and percentages where relevant.
Format the report in Markdown.
"#,
        space = input.space_name,
        total = stats.total_tasks,
        completed = stats.completed_tasks,
        open = stats.open_tasks,
        lists = stats.lists_count,
        folders = stats.folders_count,
        total_assignees = summary.total_assignees,
        total_assigned = summary.total_tasks,
    )
}

/// Chooses between delegated and template reports.
pub struct ReportComposer {
    llm: Option<ChatClient>,
    list_limit: usize,
}

impl ReportComposer {
    /// Composer that delegates when `api_key` is present and non-blank.
    ///
    /// A client that cannot be built degrades to template mode.
    pub fn new(config: &LlmConfig, api_key: Option<&str>, list_limit: usize) -> Self {
        let llm = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .and_then(|key| match ChatClient::new(config, key) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("LLM client unavailable, using template reports: {}", e);
                    None
                }
            });

        Self { llm, list_limit }
    }

    pub fn is_delegating(&self) -> bool {
        self.llm.is_some()
    }

    /// Produce a report. Never fails: LLM errors fall back to the template.
    pub async fn compose(&self, input: &ReportInput) -> ComposedReport {
        let Some(llm) = &self.llm else {
            return ComposedReport {
                content: generate_markdown_report(input, self.list_limit),
                mode: ReportMode::Template,
            };
        };

        match self.delegate(llm, input).await {
            Ok(content) => {
                info!("Report written by LLM service");
                ComposedReport {
                    content,
                    mode: ReportMode::Delegated,
                }
            }
            Err(e) => {
                warn!("LLM report failed, falling back to template: {}", e);
                ComposedReport {
                    content: generate_markdown_report(input, self.list_limit),
                    mode: ReportMode::Fallback,
                }
            }
        }
    }

    async fn delegate(&self, llm: &ChatClient, input: &ReportInput) -> Result<String, LlmError> {
        let prompt = build_prompt(input);
        llm.complete(SYSTEM_PROMPT, &prompt).await
    }
}
