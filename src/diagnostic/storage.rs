//! Diagnostic persistence — reference data reads, submission writes, and
//! recommended-method bookkeeping on `user_methods` / `users`.

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

use super::scorer::{Answer, ScoringOption};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub question_text: String,
    pub question_order: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OptionRow {
    pub id: i64,
    pub question_id: i64,
    pub option_text: String,
}

/// A question with its selectable options, ready for the questions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithOptions {
    pub question_id: i64,
    pub question_text: String,
    pub question_order: i64,
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionOption {
    pub option_id: i64,
    pub option_text: String,
}

/// Whether the user has completed the diagnostic, and with what outcome.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticStatus {
    pub diagnostic_completed: bool,
    pub has_recommended_method: bool,
    pub recommended_method_id: Option<i64>,
}

/// Diagnostic query + write layer.
#[derive(Clone)]
pub struct DiagnosticStorage {
    pool: SqlitePool,
}

impl DiagnosticStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All questions in display order, each with its options.
    pub async fn list_questions(&self) -> Result<Vec<QuestionWithOptions>> {
        let questions: Vec<QuestionRow> = sqlx::query_as(
            "SELECT id, question_text, question_order
               FROM diagnostic_questions
           ORDER BY question_order",
        )
        .fetch_all(&self.pool)
        .await
        .context("load diagnostic questions")?;

        let options: Vec<OptionRow> = sqlx::query_as(
            "SELECT id, question_id, option_text FROM diagnostic_options ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("load diagnostic options")?;

        let mut by_question: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
        for o in options {
            by_question
                .entry(o.question_id)
                .or_default()
                .push(QuestionOption { option_id: o.id, option_text: o.option_text });
        }

        Ok(questions
            .into_iter()
            .map(|q| QuestionWithOptions {
                options: by_question.remove(&q.id).unwrap_or_default(),
                question_id: q.id,
                question_text: q.question_text,
                question_order: q.question_order,
            })
            .collect())
    }

    /// The scoring reference data: the set of question ids and the option →
    /// (question, method, points) table the pure scorer works from.
    pub async fn load_scoring_table(
        &self,
    ) -> Result<(BTreeSet<i64>, HashMap<i64, ScoringOption>)> {
        let question_ids: Vec<(i64,)> =
            sqlx::query_as("SELECT id FROM diagnostic_questions")
                .fetch_all(&self.pool)
                .await?;

        let rows: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT id, question_id, method_id, points FROM diagnostic_options",
        )
        .fetch_all(&self.pool)
        .await
        .context("load scoring table")?;

        let options = rows
            .into_iter()
            .map(|(id, question_id, method_id, points)| {
                (id, ScoringOption { question_id, method_id, points })
            })
            .collect();

        Ok((question_ids.into_iter().map(|(id,)| id).collect(), options))
    }

    /// Replace any previous submission with the new answers.
    pub async fn replace_responses(&self, user_id: i64, answers: &[Answer]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM diagnostic_responses WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for a in answers {
            sqlx::query(
                "INSERT INTO diagnostic_responses (user_id, question_id, option_id, answered_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(a.question_id)
            .bind(a.option_id)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("insert diagnostic response")?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Persist the recommendation outcome: clear old recommended flags, mark
    /// the primary (and secondary, if any), and flag the diagnostic complete.
    pub async fn apply_recommendation(
        &self,
        user_id: i64,
        primary_method_id: i64,
        secondary_method_id: Option<i64>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO users (id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE user_methods SET recommended = 0 WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for method_id in std::iter::once(primary_method_id).chain(secondary_method_id) {
            sqlx::query(
                "INSERT INTO user_methods (user_id, method_id, recommended, used)
                 VALUES (?, ?, 1, 0)
                 ON CONFLICT (user_id, method_id) DO UPDATE SET recommended = 1",
            )
            .bind(user_id)
            .bind(method_id)
            .execute(&mut *tx)
            .await
            .context("mark recommended method")?;
        }

        sqlx::query("UPDATE users SET diagnostic_completed = 1 WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The user's stored answers, if any. Used to replay the result.
    pub async fn responses(&self, user_id: i64) -> Result<Vec<Answer>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT question_id, option_id FROM diagnostic_responses
              WHERE user_id = ?
           ORDER BY question_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load diagnostic responses")?;
        Ok(rows
            .into_iter()
            .map(|(question_id, option_id)| Answer { question_id, option_id })
            .collect())
    }

    pub async fn status(&self, user_id: i64) -> Result<DiagnosticStatus> {
        let completed: Option<(bool,)> =
            sqlx::query_as("SELECT diagnostic_completed FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let recommended: Option<(i64,)> = sqlx::query_as(
            "SELECT method_id FROM user_methods
              WHERE user_id = ? AND recommended = 1
           ORDER BY method_id
              LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(DiagnosticStatus {
            diagnostic_completed: completed.map(|(c,)| c).unwrap_or(false),
            has_recommended_method: recommended.is_some(),
            recommended_method_id: recommended.map(|(id,)| id),
        })
    }

    /// Recommended method ids + names, lowest method id first. Empty when
    /// the diagnostic was never completed.
    pub async fn recommended_methods(&self, user_id: i64) -> Result<Vec<(i64, String)>> {
        Ok(sqlx::query_as(
            "SELECT um.method_id, m.name
               FROM user_methods um
               JOIN methods m ON m.id = um.method_id
              WHERE um.user_id = ? AND um.recommended = 1
           ORDER BY um.method_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load recommended methods")?)
    }
}
