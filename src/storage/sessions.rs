//! Study-session storage.
//!
//! Every mutation keeps the `users.total_studied_minutes` aggregate in step
//! with the surviving sessions: create adds the duration, update applies the
//! delta, delete subtracts (clamped at zero). Mutations run in a transaction
//! so the session row and the aggregate never diverge.

use anyhow::{Context as _, Result};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudySessionRow {
    pub id: i64,
    pub user_id: i64,
    pub method_id: i64,
    /// RFC 3339 UTC timestamp.
    pub started_at: String,
    pub duration_minutes: i64,
    pub completed: bool,
    pub note: Option<String>,
}

/// A session row joined with its method name, as returned by history queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionWithMethod {
    pub id: i64,
    pub user_id: i64,
    pub method_id: i64,
    pub method_name: String,
    pub started_at: String,
    pub duration_minutes: i64,
    pub completed: bool,
    pub note: Option<String>,
}

/// Study-session query + write layer.
#[derive(Clone)]
pub struct SessionStorage {
    pool: SqlitePool,
}

impl SessionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a session, bump the user's studied-minutes total, and mark the
    /// method as used. The caller has already validated the method id and the
    /// duration range.
    pub async fn create_session(
        &self,
        user_id: i64,
        method_id: i64,
        started_at: &str,
        duration_minutes: i64,
        completed: bool,
        note: Option<&str>,
    ) -> Result<StudySessionRow> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO users (id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO study_sessions
                 (user_id, method_id, started_at, duration_minutes, completed, note)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(user_id)
        .bind(method_id)
        .bind(started_at)
        .bind(duration_minutes)
        .bind(completed)
        .bind(note)
        .fetch_one(&mut *tx)
        .await
        .context("insert study session")?;

        sqlx::query("UPDATE users SET total_studied_minutes = total_studied_minutes + ? WHERE id = ?")
            .bind(duration_minutes)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_methods (user_id, method_id, recommended, used)
             VALUES (?, ?, 0, 1)
             ON CONFLICT (user_id, method_id) DO UPDATE SET used = 1",
        )
        .bind(user_id)
        .bind(method_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_session(user_id, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("session not found after insert"))
    }

    pub async fn get_session(&self, user_id: i64, id: i64) -> Result<Option<StudySessionRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM study_sessions WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Rewrite a session's fields and apply the duration delta to the user's
    /// total. Returns `None` when the session does not exist (or belongs to a
    /// different user).
    pub async fn update_session(
        &self,
        user_id: i64,
        id: i64,
        method_id: i64,
        started_at: &str,
        duration_minutes: i64,
        completed: bool,
        note: Option<&str>,
    ) -> Result<Option<StudySessionRow>> {
        let mut tx = self.pool.begin().await?;

        let old: Option<(i64,)> = sqlx::query_as(
            "SELECT duration_minutes FROM study_sessions WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((old_duration,)) = old else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE study_sessions
                SET method_id = ?, started_at = ?, duration_minutes = ?, completed = ?, note = ?
              WHERE id = ? AND user_id = ?",
        )
        .bind(method_id)
        .bind(started_at)
        .bind(duration_minutes)
        .bind(completed)
        .bind(note)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("update study session")?;

        sqlx::query("UPDATE users SET total_studied_minutes = total_studied_minutes + ? WHERE id = ?")
            .bind(duration_minutes - old_duration)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_methods (user_id, method_id, recommended, used)
             VALUES (?, ?, 0, 1)
             ON CONFLICT (user_id, method_id) DO UPDATE SET used = 1",
        )
        .bind(user_id)
        .bind(method_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_session(user_id, id).await
    }

    /// Delete a session and subtract its minutes from the user's total,
    /// clamping at zero. Returns `false` when nothing matched.
    pub async fn delete_session(&self, user_id: i64, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let old: Option<(i64,)> = sqlx::query_as(
            "SELECT duration_minutes FROM study_sessions WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((duration,)) = old else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM study_sessions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE users
                SET total_studied_minutes = MAX(0, total_studied_minutes - ?)
              WHERE id = ?",
        )
        .bind(duration)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn count_sessions(&self, user_id: i64) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM study_sessions WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    /// Paginated history, newest first, with method names resolved.
    pub async fn list_history(
        &self,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<SessionWithMethod>> {
        Ok(sqlx::query_as(
            "SELECT s.id, s.user_id, s.method_id, m.name AS method_name,
                    s.started_at, s.duration_minutes, s.completed, s.note
               FROM study_sessions s
               JOIN methods m ON m.id = s.method_id
              WHERE s.user_id = ?
           ORDER BY s.started_at DESC
              LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .context("list session history")?)
    }
}
