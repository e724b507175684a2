// rest/routes/sessions.rs — Study-session CRUD + paginated history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::storage::sessions::{SessionWithMethod, StudySessionRow};
use crate::AppContext;

pub const MAX_SESSION_MINUTES: i64 = 1440;

#[derive(Deserialize)]
pub struct SessionRequest {
    pub method_id: i64,
    /// RFC 3339 timestamp; defaults to now when omitted.
    pub started_at: Option<String>,
    pub duration_minutes: i64,
    #[serde(default)]
    pub completed: bool,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub user_id: i64,
    pub method_id: i64,
    pub started_at: String,
    pub duration_minutes: i64,
    pub completed: bool,
    pub note: Option<String>,
}

impl From<StudySessionRow> for SessionResponse {
    fn from(r: StudySessionRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            method_id: r.method_id,
            started_at: r.started_at,
            duration_minutes: r.duration_minutes,
            completed: r.completed,
            note: r.note,
        }
    }
}

#[derive(Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub method_id: i64,
    pub method_name: String,
    pub started_at: String,
    pub duration_minutes: i64,
    pub completed: bool,
    pub note: Option<String>,
}

impl From<SessionWithMethod> for HistoryEntry {
    fn from(r: SessionWithMethod) -> Self {
        Self {
            id: r.id,
            method_id: r.method_id,
            method_name: r.method_name,
            started_at: r.started_at,
            duration_minutes: r.duration_minutes,
            completed: r.completed,
            note: r.note,
        }
    }
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub sessions: Vec<HistoryEntry>,
    pub total_count: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Validate the request body and normalise `started_at` to RFC 3339 UTC.
async fn validate(ctx: &AppContext, body: &SessionRequest) -> Result<String, ApiError> {
    if body.duration_minutes < 1 || body.duration_minutes > MAX_SESSION_MINUTES {
        return Err(ApiError::BadRequest(format!(
            "duration_minutes must be between 1 and {MAX_SESSION_MINUTES}"
        )));
    }

    let started_at = match &body.started_at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| ApiError::BadRequest(format!("invalid started_at timestamp: {raw}")))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    if started_at > Utc::now() {
        return Err(ApiError::BadRequest(
            "started_at cannot be in the future".to_string(),
        ));
    }

    if !ctx.storage.method_exists(body.method_id).await? {
        return Err(ApiError::NotFound(format!(
            "study method {} not found",
            body.method_id
        )));
    }

    Ok(started_at.to_rfc3339())
}

pub async fn create_session(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
    Json(body): Json<SessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let started_at = validate(&ctx, &body).await?;
    let row = ctx
        .sessions
        .create_session(
            user_id,
            body.method_id,
            &started_at,
            body.duration_minutes,
            body.completed,
            body.note.as_deref(),
        )
        .await?;
    tracing::info!(user_id, session_id = row.id, "study session logged");
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_session(
    State(ctx): State<Arc<AppContext>>,
    Path((user_id, id)): Path<(i64, i64)>,
) -> Result<Json<SessionResponse>, ApiError> {
    match ctx.sessions.get_session(user_id, id).await? {
        Some(row) => Ok(Json(row.into())),
        None => Err(ApiError::NotFound("session not found".to_string())),
    }
}

pub async fn update_session(
    State(ctx): State<Arc<AppContext>>,
    Path((user_id, id)): Path<(i64, i64)>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let started_at = validate(&ctx, &body).await?;
    match ctx
        .sessions
        .update_session(
            user_id,
            id,
            body.method_id,
            &started_at,
            body.duration_minutes,
            body.completed,
            body.note.as_deref(),
        )
        .await?
    {
        Some(row) => Ok(Json(row.into())),
        None => Err(ApiError::NotFound("session not found".to_string())),
    }
}

pub async fn delete_session(
    State(ctx): State<Arc<AppContext>>,
    Path((user_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    if ctx.sessions.delete_session(user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("session not found".to_string()))
    }
}

pub async fn session_history(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let total_count = ctx.sessions.count_sessions(user_id).await?;
    let rows = ctx.sessions.list_history(user_id, skip, limit).await?;

    Ok(Json(HistoryResponse {
        sessions: rows.into_iter().map(HistoryEntry::from).collect(),
        total_count,
        page: skip / limit + 1,
        pages: (total_count + limit - 1) / limit,
    }))
}
