// rest/routes/dashboard.rs — Aggregated progress views.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::dashboard::model::{
    DailyProgress, DashboardSummary, MethodUsage, MonthlyStats, WeeklyProgress,
};
use crate::error::ApiError;
use crate::AppContext;

pub async fn summary(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> Result<Json<DashboardSummary>, ApiError> {
    match ctx.dashboard.summary(user_id).await? {
        Some(summary) => Ok(Json(summary)),
        None => Err(ApiError::NotFound(format!("user {user_id} not found"))),
    }
}

pub async fn today_progress(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> Result<Json<DailyProgress>, ApiError> {
    Ok(Json(ctx.dashboard.today_progress(user_id).await?))
}

pub async fn weekly_progress(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> Result<Json<WeeklyProgress>, ApiError> {
    Ok(Json(ctx.dashboard.weekly_progress(user_id).await?))
}

#[derive(Deserialize)]
pub struct MonthlyQuery {
    /// 1..=12; defaults to the current UTC month.
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub async fn monthly_stats(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<MonthlyStats>, ApiError> {
    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    match ctx.dashboard.monthly_stats(user_id, year, month).await? {
        Some(stats) => Ok(Json(stats)),
        None => Err(ApiError::BadRequest(format!("invalid month: {month}"))),
    }
}

pub async fn methods_stats(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<MethodUsage>>, ApiError> {
    Ok(Json(ctx.dashboard.methods_stats(user_id).await?))
}
