//! HTTP client for the ClickUp REST API (v2).
//!
//! Every call is a single read-only GET. Non-2xx responses fail the call;
//! there are no retries and no pagination beyond the first page.

use crate::models::{Folder, ListNode, Space, Task, Team};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Public ClickUp API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.clickup.com/api/v2";

/// Errors returned by [`ClickUpClient`].
///
/// The variants separate a transport problem (worth retrying later) from a
/// rejected request and from a response that broke the expected contract.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API token: {0}")]
    InvalidToken(String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("ClickUp API unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("ClickUp API returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("unexpected response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl ClientError {
    /// Transport failures and upstream 5xx responses may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Unreachable { .. } => true,
            ClientError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// True when ClickUp rejected the token.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ClientError::InvalidToken(_) => true,
            ClientError::Status { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }
}

/// Optional filters for the tasks endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Only return tasks created strictly after this instant.
    pub created_after: Option<DateTime<Utc>>,
}

impl TaskQuery {
    /// Build a query that keeps the last `days_back` days, relative to `now`.
    ///
    /// `None` and `Some(0)` both mean "no time window", and so does a window
    /// reaching past the earliest representable date.
    pub fn days_back(days_back: Option<u32>, now: DateTime<Utc>) -> Self {
        let Some(days) = days_back.filter(|days| *days > 0) else {
            return Self::default();
        };

        match now.checked_sub_signed(ChronoDuration::days(i64::from(days))) {
            Some(after) => Self {
                created_after: Some(after),
            },
            None => {
                warn!(days, "Time window is out of range, not filtering by creation date");
                Self::default()
            }
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        self.created_after
            .map(|after| ("date_created_gt", after.timestamp_millis().to_string()))
            .into_iter()
            .collect()
    }
}

#[derive(Deserialize)]
struct TeamsEnvelope {
    teams: Vec<Team>,
}

#[derive(Deserialize)]
struct SpacesEnvelope {
    spaces: Vec<Space>,
}

#[derive(Deserialize)]
struct FoldersEnvelope {
    folders: Vec<Folder>,
}

#[derive(Deserialize)]
struct ListsEnvelope {
    lists: Vec<ListNode>,
}

#[derive(Deserialize)]
struct TasksEnvelope {
    tasks: Vec<Task>,
    #[serde(default)]
    last_page: Option<bool>,
}

/// ClickUp API client bound to one token.
#[derive(Debug, Clone)]
pub struct ClickUpClient {
    http: reqwest::Client,
    base_url: String,
}

impl ClickUpClient {
    /// Create a client for `base_url`, sending `token` verbatim as the
    /// `Authorization` header (ClickUp personal tokens carry no scheme).
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(token.trim())
            .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// List all teams (workspaces) the token can see.
    #[instrument(skip(self))]
    pub async fn get_teams(&self) -> Result<Vec<Team>, ClientError> {
        let envelope: TeamsEnvelope = self.get("/team", &[]).await?;
        Ok(envelope.teams)
    }

    /// List the spaces of a team.
    #[instrument(skip(self))]
    pub async fn get_spaces(&self, team_id: &str) -> Result<Vec<Space>, ClientError> {
        let envelope: SpacesEnvelope = self.get(&format!("/team/{}/space", team_id), &[]).await?;
        Ok(envelope.spaces)
    }

    /// Fetch details of a single space.
    #[instrument(skip(self))]
    pub async fn get_space(&self, space_id: &str) -> Result<Space, ClientError> {
        self.get(&format!("/space/{}", space_id), &[]).await
    }

    /// List the folders of a space.
    #[instrument(skip(self))]
    pub async fn get_folders(&self, space_id: &str) -> Result<Vec<Folder>, ClientError> {
        let envelope: FoldersEnvelope =
            self.get(&format!("/space/{}/folder", space_id), &[]).await?;
        Ok(envelope.folders)
    }

    /// List the folderless lists of a space.
    #[instrument(skip(self))]
    pub async fn get_space_lists(&self, space_id: &str) -> Result<Vec<ListNode>, ClientError> {
        let envelope: ListsEnvelope = self.get(&format!("/space/{}/list", space_id), &[]).await?;
        Ok(envelope.lists)
    }

    /// List the lists inside a folder.
    #[instrument(skip(self))]
    pub async fn get_folder_lists(&self, folder_id: &str) -> Result<Vec<ListNode>, ClientError> {
        let envelope: ListsEnvelope =
            self.get(&format!("/folder/{}/list", folder_id), &[]).await?;
        Ok(envelope.lists)
    }

    /// List the tasks of a list, applying the optional creation filter.
    #[instrument(skip(self))]
    pub async fn get_tasks(&self, list_id: &str, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let envelope: TasksEnvelope = self
            .get(&format!("/list/{}/task", list_id), &query.params())
            .await?;

        if envelope.last_page == Some(false) {
            warn!(
                list_id,
                returned = envelope.tasks.len(),
                "ClickUp paginated this list; only the first page is counted"
            );
        }

        Ok(envelope.tasks)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ClientError::Unreachable {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { url, status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::Unreachable {
                url: url.clone(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed {
            url,
            reason: e.to_string(),
        })
    }
}
