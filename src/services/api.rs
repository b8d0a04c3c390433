//! REST API routes.
//!
//! Thin request layer over the registry and the pull request lifecycle:
//! validates input, calls the core, and maps `AppError` kinds to status codes
//! and `{"error": {"code", "message"}}` bodies.

use crate::db::pool::DbPool;
use crate::error::{AppError, ConflictReason};
use crate::models::{NewPullRequest, PullRequest, PullRequestShort, Team, TeamMember, User};
use crate::services::pull_requests::PullRequestService;
use crate::services::teams;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub pull_requests: Arc<PullRequestService>,
}

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(AppError);

impl ApiErr {
    /// Status code and error code for an application error.
    fn classify(err: &AppError) -> (StatusCode, &'static str) {
        if let Some(reason) = err.conflict_reason() {
            return match reason {
                ConflictReason::TeamExists => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
                ConflictReason::UserExists => (StatusCode::BAD_REQUEST, "USER_EXISTS"),
                ConflictReason::PullRequestExists => (StatusCode::CONFLICT, "PR_EXISTS"),
                ConflictReason::PullRequestMerged => (StatusCode::CONFLICT, "PR_MERGED"),
                ConflictReason::NoCandidate => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            };
        }

        match err {
            AppError::NotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = Self::classify(&self.0);
        if status.is_server_error() {
            log::error!("[api] {}", self.0);
        } else {
            log::warn!("[api] Rejected request ({}): {}", code, self.0);
        }

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code,
                    message: self.0.to_string(),
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

/// Reject missing or blank string fields.
fn require(value: Option<&str>, field: &str) -> Result<String, ApiErr> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::invalid_input_field(format!("{} is required", field), field).into()),
    }
}

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct TeamQuery {
    team_name: Option<String>,
}

#[derive(Deserialize)]
struct ReviewerQuery {
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct AddUserRequest {
    team_name: Option<String>,
    user: TeamMember,
}

#[derive(Deserialize)]
struct RemoveUserRequest {
    team_name: Option<String>,
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct SetActiveRequest {
    user_id: Option<String>,
    is_active: bool,
}

#[derive(Deserialize)]
struct CreatePullRequestRequest {
    pull_request_id: Option<String>,
    pull_request_name: Option<String>,
    author_id: Option<String>,
}

#[derive(Deserialize)]
struct MergeRequest {
    pull_request_id: Option<String>,
}

#[derive(Deserialize)]
struct ReassignRequest {
    pull_request_id: Option<String>,
    old_user_id: Option<String>,
}

#[derive(Serialize)]
struct TeamEnvelope {
    team: Team,
}

#[derive(Serialize)]
struct UserEnvelope {
    user: User,
}

/// Pull request as rendered over HTTP, with RFC 3339 timestamps.
#[derive(Debug, Serialize, Deserialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "mergedAt")]
    pub merged_at: Option<String>,
}

fn format_millis(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
            status: pr.status.to_string(),
            assigned_reviewers: pr.assigned_reviewers,
            created_at: format_millis(pr.created_at),
            merged_at: pr.merged_at.and_then(format_millis),
        }
    }
}

#[derive(Serialize)]
struct PullRequestEnvelope {
    pr: PullRequestResponse,
}

#[derive(Serialize)]
struct ReassignResponse {
    pr: PullRequestResponse,
    replaced_by: String,
}

#[derive(Serialize)]
struct ReviewListResponse {
    user_id: String,
    pull_requests: Vec<PullRequestShort>,
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Build the full API router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/team/addUser", post(add_user_to_team))
        .route("/team/removeUser", post(remove_user_from_team))
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/health", get(health))
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /team/add
async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<Team>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamEnvelope>), ApiErr> {
    let Json(mut team) = payload?;
    team.team_name = require(Some(team.team_name.as_str()), "team_name")?;
    for member in &mut team.members {
        member.user_id = require(Some(member.user_id.as_str()), "user_id")?;
    }

    let team = teams::create_team(&state.db, &team).await?;
    Ok((StatusCode::CREATED, Json(TeamEnvelope { team })))
}

/// GET /team/get?team_name=
async fn get_team(
    State(state): State<AppState>,
    Query(params): Query<TeamQuery>,
) -> Result<Json<Team>, ApiErr> {
    let team_name = require(params.team_name.as_deref(), "team_name")?;
    Ok(Json(teams::get_team(&state.db, &team_name).await?))
}

/// POST /team/addUser
async fn add_user_to_team(
    State(state): State<AppState>,
    payload: Result<Json<AddUserRequest>, JsonRejection>,
) -> Result<Json<TeamEnvelope>, ApiErr> {
    let Json(mut req) = payload?;
    let team_name = require(req.team_name.as_deref(), "team_name")?;
    req.user.user_id = require(Some(req.user.user_id.as_str()), "user_id")?;

    let team = teams::add_user_to_team(&state.db, &team_name, &req.user).await?;
    Ok(Json(TeamEnvelope { team }))
}

/// POST /team/removeUser
async fn remove_user_from_team(
    State(state): State<AppState>,
    payload: Result<Json<RemoveUserRequest>, JsonRejection>,
) -> Result<Json<TeamEnvelope>, ApiErr> {
    let Json(req) = payload?;
    let team_name = require(req.team_name.as_deref(), "team_name")?;
    let user_id = require(req.user_id.as_deref(), "user_id")?;

    let team = teams::remove_user_from_team(&state.db, &team_name, &user_id).await?;
    Ok(Json(TeamEnvelope { team }))
}

/// POST /users/setIsActive
async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiErr> {
    let Json(req) = payload?;
    let user_id = require(req.user_id.as_deref(), "user_id")?;

    let user = teams::set_user_active(&state.db, &user_id, req.is_active).await?;
    Ok(Json(UserEnvelope { user }))
}

/// GET /users/getReview?user_id=
async fn get_review(
    State(state): State<AppState>,
    Query(params): Query<ReviewerQuery>,
) -> Result<Json<ReviewListResponse>, ApiErr> {
    let user_id = require(params.user_id.as_deref(), "user_id")?;
    let pull_requests = state.pull_requests.list_by_reviewer(&user_id).await?;
    Ok(Json(ReviewListResponse {
        user_id,
        pull_requests,
    }))
}

/// POST /pullRequest/create
async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestEnvelope>), ApiErr> {
    let Json(req) = payload?;
    let new_pr = NewPullRequest {
        pull_request_id: require(req.pull_request_id.as_deref(), "pull_request_id")?,
        pull_request_name: require(req.pull_request_name.as_deref(), "pull_request_name")?,
        author_id: require(req.author_id.as_deref(), "author_id")?,
    };

    let pr = state.pull_requests.create(&new_pr).await?;
    Ok((StatusCode::CREATED, Json(PullRequestEnvelope { pr: pr.into() })))
}

/// POST /pullRequest/merge
async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<PullRequestEnvelope>, ApiErr> {
    let Json(req) = payload?;
    let pull_request_id = require(req.pull_request_id.as_deref(), "pull_request_id")?;

    let pr = state.pull_requests.merge(&pull_request_id).await?;
    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// POST /pullRequest/reassign
async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let Json(req) = payload?;
    let pull_request_id = require(req.pull_request_id.as_deref(), "pull_request_id")?;
    let old_user_id = require(req.old_user_id.as_deref(), "old_user_id")?;

    let result = state
        .pull_requests
        .reassign(&pull_request_id, &old_user_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: result.pull_request.into(),
        replaced_by: result.replaced_by,
    }))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
