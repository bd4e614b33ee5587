//! Space analysis.
//!
//! A space is walked ([`walker`]) and the resulting snapshot is folded into
//! task statistics ([`tasks`]) and an assignee rollup ([`assignees`]).

pub mod assignees;
pub mod insights;
pub mod tasks;
pub mod walker;

pub use assignees::AssigneeRollup;
pub use insights::TeamInsights;
pub use tasks::{percentage, TaskStatistics};
pub use walker::{Incomplete, SpaceSnapshot, SpaceWalker};

use crate::clickup::{ClickUpClient, TaskQuery};
use tracing::debug;

/// Aggregates computed for a space.
#[derive(Debug, Clone, Default)]
pub struct SpaceAnalysis {
    pub stats: TaskStatistics,
    pub assignees: AssigneeRollup,
}

impl SpaceAnalysis {
    pub fn from_snapshot(snapshot: &SpaceSnapshot) -> Self {
        Self {
            stats: TaskStatistics::from_snapshot(snapshot),
            assignees: AssigneeRollup::from_snapshot(snapshot),
        }
    }
}

/// Walk a space and compute both aggregates.
///
/// `window` applies to the task statistics only. With a window set, a second
/// unfiltered walk feeds the assignee rollup. On failure the error carries
/// the aggregates of whatever was fetched.
pub async fn analyze_space(
    client: &ClickUpClient,
    space_id: &str,
    window: &TaskQuery,
    concurrency: usize,
) -> Result<SpaceAnalysis, Incomplete<SpaceAnalysis>> {
    let walker = SpaceWalker::new(client, concurrency);

    let windowed = walker
        .walk(space_id, window)
        .await
        .map_err(|incomplete| incomplete.map(|snapshot| SpaceAnalysis::from_snapshot(&snapshot)))?;
    if window.created_after.is_none() {
        return Ok(SpaceAnalysis::from_snapshot(&windowed));
    }

    let stats = TaskStatistics::from_snapshot(&windowed);
    debug!(space_id, "Walking again without a time window for the assignee rollup");
    match walker.walk(space_id, &TaskQuery::default()).await {
        Ok(all) => Ok(SpaceAnalysis {
            stats,
            assignees: AssigneeRollup::from_snapshot(&all),
        }),
        Err(incomplete) => Err(incomplete.map(|all| SpaceAnalysis {
            stats,
            assignees: AssigneeRollup::from_snapshot(&all),
        })),
    }
}

/// Walk a space and compute task statistics only.
pub async fn count_tasks_in_space(
    client: &ClickUpClient,
    space_id: &str,
    query: &TaskQuery,
    concurrency: usize,
) -> Result<TaskStatistics, Incomplete<TaskStatistics>> {
    SpaceWalker::new(client, concurrency)
        .walk(space_id, query)
        .await
        .map(|snapshot| TaskStatistics::from_snapshot(&snapshot))
        .map_err(|incomplete| incomplete.map(|snapshot| TaskStatistics::from_snapshot(&snapshot)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    fn task(id: &str, status: &str, priority: Option<&str>, assignees: Value) -> Value {
        json!({
            "id": id,
            "name": format!("Task {}", id),
            "status": {"status": status},
            "priority": priority.map(|p| json!({"priority": p})),
            "assignees": assignees,
        })
    }

    /// Two folders with one list each plus one folderless list, five tasks.
    async fn seeded_space() -> MockServer {
        let server = MockServer::start().await;
        let ann = json!({"id": 1, "username": "ann", "email": "ann@example.com"});
        let bob = json!({"id": 2, "username": "bob", "email": "bob@example.com"});

        mount(
            &server,
            "/space/S1/folder",
            200,
            json!({"folders": [{"id": "F1", "name": "Product"}, {"id": "F2", "name": "Ops"}]}),
        )
        .await;
        mount(&server, "/space/S1/list", 200, json!({"lists": [{"id": "L0", "name": "Inbox"}]})).await;
        mount(&server, "/folder/F1/list", 200, json!({"lists": [{"id": "L1", "name": "Roadmap"}]})).await;
        mount(&server, "/folder/F2/list", 200, json!({"lists": [{"id": "L2", "name": "Oncall"}]})).await;
        mount(
            &server,
            "/list/L0/task",
            200,
            json!({"tasks": [task("a", "open", None, json!([ann.clone()]))]}),
        )
        .await;
        mount(
            &server,
            "/list/L1/task",
            200,
            json!({"tasks": [
                task("b", "complete", Some("high"), json!([ann.clone(), bob.clone()])),
                task("c", "Done", Some("Urgent"), json!([bob.clone()])),
            ]}),
        )
        .await;
        mount(
            &server,
            "/list/L2/task",
            200,
            json!({"tasks": [
                task("d", "in progress", Some("low"), json!([bob.clone()])),
                task("e", "review", None, json!([])),
            ]}),
        )
        .await;

        server
    }

    #[tokio::test]
    async fn test_end_to_end_counts() {
        let server = seeded_space().await;
        let client = ClickUpClient::new(&server.uri(), "pk", Duration::from_secs(5)).unwrap();

        let analysis = analyze_space(&client, "S1", &TaskQuery::default(), 2)
            .await
            .unwrap();

        let stats = &analysis.stats;
        assert_eq!(stats.lists_count, 3);
        assert_eq!(stats.folders_count, 2);
        assert_eq!(stats.total_tasks, 5);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.open_tasks, 3);
        assert_eq!(stats.tasks_by_priority.urgent, 1);
        assert_eq!(stats.tasks_by_priority.no_priority, 2);
    }

    #[tokio::test]
    async fn test_assignee_rollup_includes_folder_lists() {
        let server = seeded_space().await;
        let client = ClickUpClient::new(&server.uri(), "pk", Duration::from_secs(5)).unwrap();

        let analysis = analyze_space(&client, "S1", &TaskQuery::default(), 1)
            .await
            .unwrap();

        let ann = analysis.assignees.get(1).unwrap();
        assert_eq!(ann.task_count, 2);
        assert_eq!(ann.lists.iter().collect::<Vec<_>>(), vec!["Inbox", "Roadmap"]);

        let bob = analysis.assignees.get(2).unwrap();
        assert_eq!(bob.task_count, 3);
        assert_eq!(bob.lists.len(), 2);
    }

    #[tokio::test]
    async fn test_window_narrows_stats_not_rollup() {
        let ann = json!({"id": 1, "username": "ann"});
        let recent = task("new", "open", None, json!([ann.clone()]));
        let old = task("old", "complete", None, json!([ann.clone()]));

        let server = MockServer::start().await;
        mount(&server, "/space/S3/folder", 200, json!({"folders": []})).await;
        mount(&server, "/space/S3/list", 200, json!({"lists": [{"id": "L0", "name": "Inbox"}]})).await;
        Mock::given(method("GET"))
            .and(path("/list/L0/task"))
            .and(query_param_is_missing("date_created_gt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"tasks": [recent.clone(), old]})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/list/L0/task"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": [recent]})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClickUpClient::new(&server.uri(), "pk", Duration::from_secs(5)).unwrap();
        let window = TaskQuery::days_back(Some(30), Utc::now());
        let analysis = analyze_space(&client, "S3", &window, 2).await.unwrap();

        assert_eq!(analysis.stats.total_tasks, 1);
        assert_eq!(analysis.stats.completed_tasks, 0);
        assert_eq!(analysis.assignees.get(1).unwrap().task_count, 2);
    }

    #[tokio::test]
    async fn test_count_tasks_reports_partial_on_failure() {
        let server = MockServer::start().await;
        mount(&server, "/space/S2/folder", 200, json!({"folders": [{"id": "F1", "name": "A"}]})).await;
        mount(&server, "/space/S2/list", 200, json!({"lists": [{"id": "L0", "name": "Inbox"}]})).await;
        mount(&server, "/folder/F1/list", 200, json!({"lists": [{"id": "L1", "name": "Deep"}]})).await;
        mount(
            &server,
            "/list/L0/task",
            200,
            json!({"tasks": [task("a", "open", None, json!([]))]}),
        )
        .await;
        mount(&server, "/list/L1/task", 502, json!({"err": "upstream"})).await;

        let client = ClickUpClient::new(&server.uri(), "pk", Duration::from_secs(5)).unwrap();
        let err = count_tasks_in_space(&client, "S2", &TaskQuery::default(), 1)
            .await
            .unwrap_err();

        assert_eq!(err.partial.total_tasks, 1);
        assert_eq!(err.partial.lists_count, 2);
        assert_eq!(err.partial.folders_count, 1);
    }
}
