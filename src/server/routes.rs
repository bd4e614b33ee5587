//! Dashboard route handlers.
//!
//! Every ClickUp-backed route reads the caller's token from the
//! `Authorization` header and builds a client for that request only.

use crate::analysis::{self, AssigneeRollup, SpaceAnalysis, TaskStatistics, TeamInsights};
use crate::clickup::{ClickUpClient, TaskQuery};
use crate::models::{Space, Team};
use crate::report::{
    ReportComposer, ReportInput, ReportMode, ReportStore, StoreError, StoredReport,
};
use crate::server::error::ApiError;
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

const MARKDOWN: &str = "text/markdown; charset=utf-8";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub api_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub days_back: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateReportRequest {
    #[serde(default)]
    pub llm_api_key: Option<String>,
    /// Restrict the report to recently created tasks. All tasks when absent.
    #[serde(default)]
    pub days_back: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub space: Space,
    pub days_back: u32,
    pub stats: TaskStatistics,
    pub assignees: AssigneeRollup,
    pub insights: TeamInsights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedReport {
    pub filename: String,
    pub mode: ReportMode,
    pub content: String,
}

/// Token from `Authorization`, with or without a `Bearer` prefix.
fn request_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl AppState {
    fn client_for_token(&self, token: &str) -> Result<ClickUpClient, ApiError> {
        let clickup = &self.config.clickup;
        Ok(ClickUpClient::new(
            &clickup.api_url,
            token,
            Duration::from_secs(clickup.timeout_seconds),
        )?)
    }

    fn client(&self, headers: &HeaderMap) -> Result<ClickUpClient, ApiError> {
        let token = request_token(headers).ok_or(ApiError::MissingToken)?;
        self.client_for_token(&token)
    }
}

/// Run a report store operation on the blocking pool.
async fn with_store<T, F>(store: &ReportStore, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&ReportStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    Ok(tokio::task::spawn_blocking(move || op(&store)).await??)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Verify a token by listing its teams.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = request.api_token.trim();
    if token.is_empty() {
        return Err(ApiError::LoginFailed("token is empty".to_string()));
    }

    let client = state.client_for_token(token)?;
    let teams = client
        .get_teams()
        .await
        .map_err(|e| ApiError::LoginFailed(e.to_string()))?;

    info!("Login verified, {} teams visible", teams.len());
    Ok(Json(json!({ "status": "ok", "teams": teams.len() })))
}

pub async fn list_teams(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Team>>, ApiError> {
    let client = state.client(&headers)?;
    Ok(Json(client.get_teams().await?))
}

pub async fn list_spaces(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Space>>, ApiError> {
    let client = state.client(&headers)?;
    Ok(Json(client.get_spaces(&team_id).await?))
}

/// Space dashboard. A partial walk still renders, with a warning.
pub async fn space_dashboard(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    Query(params): Query<WindowParams>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, ApiError> {
    let client = state.client(&headers)?;
    let days_back = params
        .days_back
        .unwrap_or(state.config.dashboard.default_days_back);

    let space = client.get_space(&space_id).await?;
    let now = Utc::now();
    let query = TaskQuery::days_back(Some(days_back), now);

    let (analysis, warning) = match analysis::analyze_space(
        &client,
        &space_id,
        &query,
        state.config.general.concurrency,
    )
    .await
    {
        Ok(analysis) => (analysis, None),
        Err(incomplete) => {
            warn!(space_id = %space_id, "Dashboard built from partial data: {}", incomplete.source);
            let warning = format!("Some data could not be loaded: {}", incomplete.source);
            (incomplete.partial, Some(warning))
        }
    };

    let SpaceAnalysis { stats, assignees } = analysis;
    let insights = TeamInsights::from_rollup(&assignees, now);

    Ok(Json(DashboardResponse {
        space,
        days_back,
        stats,
        assignees,
        insights,
        warning,
    }))
}

/// Compose a report for a space and store it.
pub async fn create_report(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<CreatedReport>), ApiError> {
    let client = state.client(&headers)?;
    let space = client.get_space(&space_id).await?;
    let query = TaskQuery::days_back(request.days_back, Utc::now());

    let analysis = analysis::analyze_space(
        &client,
        &space_id,
        &query,
        state.config.general.concurrency,
    )
    .await
    .map_err(|incomplete| ApiError::Upstream(incomplete.source))?;

    let api_key = request
        .llm_api_key
        .as_deref()
        .or(state.config.llm.api_key.as_deref());
    let composer = ReportComposer::new(
        &state.config.llm,
        api_key,
        state.config.report.max_lists_per_assignee,
    );

    let input = ReportInput::new(space.name, analysis.stats, analysis.assignees);
    let report = composer.compose(&input).await;
    let filename = {
        let space_id = space_id.clone();
        let content = report.content.clone();
        let at = input.generated_at;
        with_store(&state.store, move |store| store.save(&space_id, &content, at)).await?
    };

    info!(space_id = %space_id, mode = %report.mode, "Report generated: {}", filename);
    Ok((
        StatusCode::CREATED,
        Json(CreatedReport {
            filename,
            mode: report.mode,
            content: report.content,
        }),
    ))
}

pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredReport>>, ApiError> {
    Ok(Json(with_store(&state.store, |store| store.list()).await?))
}

pub async fn view_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let content = with_store(&state.store, move |store| store.load(&filename)).await?;
    Ok(([(CONTENT_TYPE, HeaderValue::from_static(MARKDOWN))], content).into_response())
}

pub async fn download_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let content = {
        let filename = filename.clone();
        with_store(&state.store, move |store| store.load(&filename)).await?
    };
    let disposition = format!("attachment; filename=\"{}\"", filename);
    let mut response =
        ([(CONTENT_TYPE, HeaderValue::from_static(MARKDOWN))], content).into_response();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response.headers_mut().insert(CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// Task statistics as JSON. A partial walk answers 502 with what was counted.
pub async fn api_task_stats(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    Query(params): Query<WindowParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let client = state.client(&headers)?;
    let days_back = params
        .days_back
        .unwrap_or(state.config.dashboard.default_days_back);
    let query = TaskQuery::days_back(Some(days_back), Utc::now());

    match analysis::count_tasks_in_space(
        &client,
        &space_id,
        &query,
        state.config.general.concurrency,
    )
    .await
    {
        Ok(stats) => Ok(Json(stats).into_response()),
        Err(incomplete) if incomplete.source.is_auth_failure() => {
            Err(ApiError::Upstream(incomplete.source))
        }
        Err(incomplete) => {
            warn!(space_id = %space_id, "Task statistics incomplete: {}", incomplete.source);
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": incomplete.source.to_string(),
                    "partial": incomplete.partial,
                })),
            )
                .into_response())
        }
    }
}
