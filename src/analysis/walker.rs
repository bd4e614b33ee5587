//! Space tree walk.
//!
//! Collects every list reachable from a space (folderless lists first, then
//! the lists of each folder) and the tasks of each list. Both aggregators
//! fold over the resulting [`SpaceSnapshot`], so a space is fetched once per
//! request.

use crate::clickup::{ClickUpClient, ClientError, TaskQuery};
use crate::models::{ListNode, Task};
use futures::stream::{self, StreamExt};
use std::fmt;
use tracing::{debug, info, warn};

/// The tasks fetched from one list.
#[derive(Debug, Clone)]
pub struct ListTasks {
    pub list: ListNode,
    pub tasks: Vec<Task>,
}

/// Everything fetched while walking a space.
#[derive(Debug, Clone, Default)]
pub struct SpaceSnapshot {
    /// Number of folders in the space.
    pub folders_count: usize,
    /// All lists discovered, folderless and foldered.
    pub lists: Vec<ListNode>,
    /// Lists whose tasks were fetched, in list order.
    pub fetched: Vec<ListTasks>,
}

impl SpaceSnapshot {
    pub fn lists_count(&self) -> usize {
        self.lists.len()
    }

    /// Iterate over every fetched task together with its list.
    pub fn tasks(&self) -> impl Iterator<Item = (&ListNode, &Task)> {
        self.fetched
            .iter()
            .flat_map(|lt| lt.tasks.iter().map(move |task| (&lt.list, task)))
    }

    pub fn task_count(&self) -> usize {
        self.fetched.iter().map(|lt| lt.tasks.len()).sum()
    }
}

/// An aggregation that stopped early.
///
/// Carries whatever was accumulated before the failure alongside the cause,
/// so callers can show partial data with a warning or reject it.
#[derive(Debug)]
pub struct Incomplete<T> {
    pub partial: T,
    pub source: ClientError,
}

impl<T> Incomplete<T> {
    /// Transform the partial data, keeping the cause.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Incomplete<U> {
        Incomplete {
            partial: f(self.partial),
            source: self.source,
        }
    }
}

impl<T> fmt::Display for Incomplete<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aggregation incomplete: {}", self.source)
    }
}

impl<T: fmt::Debug> std::error::Error for Incomplete<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Walks a space with a bounded number of requests in flight.
pub struct SpaceWalker<'a> {
    client: &'a ClickUpClient,
    concurrency: usize,
}

impl<'a> SpaceWalker<'a> {
    /// `concurrency` of 1 fetches strictly one list at a time.
    pub fn new(client: &'a ClickUpClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Walk `space_id`, fetching tasks with `query`.
    ///
    /// The first failed request ends the walk; the error carries the
    /// snapshot built so far. Results are kept in list order regardless of
    /// how many requests run at once.
    pub async fn walk(
        &self,
        space_id: &str,
        query: &TaskQuery,
    ) -> Result<SpaceSnapshot, Incomplete<SpaceSnapshot>> {
        let client = self.client;
        let mut snapshot = SpaceSnapshot::default();

        let folders = match client.get_folders(space_id).await {
            Ok(folders) => folders,
            Err(e) => return Err(stop(space_id, snapshot, e)),
        };
        snapshot.folders_count = folders.len();

        match client.get_space_lists(space_id).await {
            Ok(lists) => snapshot.lists.extend(lists),
            Err(e) => return Err(stop(space_id, snapshot, e)),
        }

        let folder_ids: Vec<String> = folders.into_iter().map(|folder| folder.id).collect();
        let mut folder_lists = stream::iter(folder_ids)
            .map(move |folder_id| async move { client.get_folder_lists(&folder_id).await })
            .buffered(self.concurrency);

        while let Some(result) = folder_lists.next().await {
            match result {
                Ok(lists) => snapshot.lists.extend(lists),
                Err(e) => return Err(stop(space_id, snapshot, e)),
            }
        }

        info!(
            space_id,
            folders = snapshot.folders_count,
            lists = snapshot.lists_count(),
            "Fetching tasks"
        );

        let lists = snapshot.lists.clone();
        let mut task_pages = stream::iter(lists)
            .map(move |list| async move {
                let result = client.get_tasks(&list.id, query).await;
                (list, result)
            })
            .buffered(self.concurrency);

        while let Some((list, result)) = task_pages.next().await {
            match result {
                Ok(tasks) => {
                    debug!(list_id = %list.id, tasks = tasks.len(), "Fetched list");
                    snapshot.fetched.push(ListTasks { list, tasks });
                }
                Err(e) => return Err(stop(space_id, snapshot, e)),
            }
        }

        info!(
            space_id,
            tasks = snapshot.task_count(),
            "Space walk complete"
        );
        Ok(snapshot)
    }
}

fn stop(space_id: &str, snapshot: SpaceSnapshot, source: ClientError) -> Incomplete<SpaceSnapshot> {
    warn!(
        space_id,
        lists_fetched = snapshot.fetched.len(),
        retryable = source.is_retryable(),
        "Space walk stopped early: {}",
        source
    );
    Incomplete {
        partial: snapshot,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    fn task(id: &str) -> serde_json::Value {
        json!({"id": id, "name": id, "status": {"status": "open"}})
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_walk_future_is_send() {
        // Axum handlers await walks, so the future has to cross threads.
        let client =
            ClickUpClient::new("http://127.0.0.1:9", "pk", Duration::from_secs(1)).unwrap();
        let query = TaskQuery::default();
        assert_send(SpaceWalker::new(&client, 2).walk("S", &query));
    }

    #[tokio::test]
    async fn test_walk_keeps_list_order() {
        let server = MockServer::start().await;
        mount(&server, "/space/S/folder", 200, json!({"folders": [{"id": "F1", "name": "One"}]})).await;
        mount(&server, "/space/S/list", 200, json!({"lists": [{"id": "L0", "name": "Loose"}]})).await;
        mount(&server, "/folder/F1/list", 200, json!({"lists": [{"id": "L1", "name": "Inside"}]})).await;
        mount(&server, "/list/L0/task", 200, json!({"tasks": [task("a")]})).await;
        mount(&server, "/list/L1/task", 200, json!({"tasks": [task("b"), task("c")]})).await;

        let client = ClickUpClient::new(&server.uri(), "pk", Duration::from_secs(5)).unwrap();
        let snapshot = SpaceWalker::new(&client, 4)
            .walk("S", &TaskQuery::default())
            .await
            .unwrap();

        let order: Vec<&str> = snapshot.fetched.iter().map(|lt| lt.list.id.as_str()).collect();
        assert_eq!(order, vec!["L0", "L1"]);
        assert_eq!(snapshot.task_count(), 3);
        assert_eq!(snapshot.folders_count, 1);
    }

    #[tokio::test]
    async fn test_walk_failure_keeps_partial() {
        let server = MockServer::start().await;
        mount(&server, "/space/S/folder", 200, json!({"folders": []})).await;
        mount(
            &server,
            "/space/S/list",
            200,
            json!({"lists": [{"id": "L0", "name": "Good"}, {"id": "L9", "name": "Broken"}]}),
        )
        .await;
        mount(&server, "/list/L0/task", 200, json!({"tasks": [task("a")]})).await;
        mount(&server, "/list/L9/task", 500, json!({"err": "boom"})).await;

        let client = ClickUpClient::new(&server.uri(), "pk", Duration::from_secs(5)).unwrap();
        let err = SpaceWalker::new(&client, 1)
            .walk("S", &TaskQuery::default())
            .await
            .unwrap_err();

        assert_eq!(err.partial.lists_count(), 2);
        assert_eq!(err.partial.task_count(), 1);
        assert!(err.source.is_retryable());
    }

    #[tokio::test]
    async fn test_walk_folder_failure_is_empty_partial() {
        let server = MockServer::start().await;
        mount(&server, "/space/S/folder", 404, json!({"err": "not found"})).await;

        let client = ClickUpClient::new(&server.uri(), "pk", Duration::from_secs(5)).unwrap();
        let err = SpaceWalker::new(&client, 2)
            .walk("S", &TaskQuery::default())
            .await
            .unwrap_err();

        assert_eq!(err.partial.lists_count(), 0);
        assert_eq!(err.partial.folders_count, 0);
        assert!(err.to_string().contains("404"));
    }
}
