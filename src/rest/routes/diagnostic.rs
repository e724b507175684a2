// rest/routes/diagnostic.rs — Quiz questions, submission, and results.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::diagnostic::scorer::{
    self, Answer, MethodScore, Recommendation,
};
use crate::diagnostic::storage::{DiagnosticStatus, QuestionWithOptions};
use crate::error::ApiError;
use crate::methods::{guide_for, method_id};
use crate::AppContext;

#[derive(Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<QuestionWithOptions>,
}

pub async fn list_questions(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let questions = ctx.diagnostic.list_questions().await?;
    Ok(Json(QuestionsResponse { questions }))
}

pub async fn status(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> Result<Json<DiagnosticStatus>, ApiError> {
    Ok(Json(ctx.diagnostic.status(user_id).await?))
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub question_id: i64,
    pub option_id: i64,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub answers: Vec<AnswerRequest>,
}

/// A recommended method with its score and practical guide.
#[derive(Serialize)]
pub struct RecommendedMethod {
    pub method_id: i64,
    pub method_name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub tips: &'static [&'static str],
    pub best_for: &'static str,
    pub score: i64,
}

#[derive(Serialize)]
pub struct DiagnosticResult {
    pub primary: RecommendedMethod,
    pub secondary: Option<RecommendedMethod>,
    /// Full score board, method name → accumulated points.
    pub scores: BTreeMap<&'static str, i64>,
}

fn recommended(entry: MethodScore) -> Result<RecommendedMethod, ApiError> {
    let id = method_id(entry.name)
        .ok_or_else(|| anyhow::anyhow!("method {} missing from catalog", entry.name))?;
    let guide = guide_for(entry.name);
    Ok(RecommendedMethod {
        method_id: id,
        method_name: entry.name,
        title: guide.title,
        description: guide.description,
        tips: guide.tips,
        best_for: guide.best_for,
        score: entry.score,
    })
}

fn result_from(board: Vec<MethodScore>, rec: Recommendation) -> Result<DiagnosticResult, ApiError> {
    Ok(DiagnosticResult {
        primary: recommended(rec.primary)?,
        secondary: rec.secondary.map(recommended).transpose()?,
        scores: board.into_iter().map(|s| (s.name, s.score)).collect(),
    })
}

pub async fn submit(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<DiagnosticResult>, ApiError> {
    let answers: Vec<Answer> = body
        .answers
        .iter()
        .map(|a| Answer { question_id: a.question_id, option_id: a.option_id })
        .collect();

    let (question_ids, options) = ctx.diagnostic.load_scoring_table().await?;

    scorer::validate_answers(&answers, &question_ids, &options)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let board = scorer::score_answers(&answers, &options)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
    let rec = scorer::recommend(&board);

    ctx.diagnostic.replace_responses(user_id, &answers).await?;

    let primary_id = method_id(rec.primary.name)
        .ok_or_else(|| anyhow::anyhow!("method {} missing from catalog", rec.primary.name))?;
    let secondary_id = rec.secondary.as_ref().and_then(|s| method_id(s.name));
    ctx.diagnostic
        .apply_recommendation(user_id, primary_id, secondary_id)
        .await?;

    tracing::info!(
        user_id,
        primary = rec.primary.name,
        secondary = rec.secondary.as_ref().map(|s| s.name),
        "diagnostic completed"
    );

    Ok(Json(result_from(board, rec)?))
}

/// Replay the stored submission. 404 until the diagnostic has been completed.
pub async fn result(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> Result<Json<DiagnosticResult>, ApiError> {
    let status = ctx.diagnostic.status(user_id).await?;
    if !status.diagnostic_completed {
        return Err(ApiError::NotFound(
            "diagnostic not completed yet".to_string(),
        ));
    }

    let answers = ctx.diagnostic.responses(user_id).await?;
    let (_, options) = ctx.diagnostic.load_scoring_table().await?;
    let board = scorer::score_answers(&answers, &options)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
    let rec = scorer::recommend(&board);

    Ok(Json(result_from(board, rec)?))
}
