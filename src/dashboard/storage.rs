//! Dashboard queries: fetch session facts for a window and hand them to the
//! pure calculator, then assemble the response DTOs.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::SqlitePool;

use super::calc::{self, SessionFact};
use super::model::{DailyProgress, DashboardSummary, MethodUsage, MonthlyStats, WeeklyProgress};

#[derive(Debug, sqlx::FromRow)]
struct FactRow {
    started_at: String,
    duration_minutes: i64,
    completed: bool,
    method_id: i64,
}

impl FactRow {
    fn into_fact(self) -> Result<SessionFact> {
        let started_at = DateTime::parse_from_rfc3339(&self.started_at)
            .with_context(|| format!("bad started_at timestamp: {}", self.started_at))?
            .with_timezone(&Utc);
        Ok(SessionFact {
            started_at,
            duration_minutes: self.duration_minutes,
            completed: self.completed,
            method_id: self.method_id,
        })
    }
}

/// Read-only aggregation queries over study sessions.
#[derive(Clone)]
pub struct DashboardStorage {
    pool: SqlitePool,
}

impl DashboardStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All of the user's sessions falling on the closed calendar-day range
    /// `start..=end` (UTC).
    async fn facts_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SessionFact>> {
        let rows: Vec<FactRow> = sqlx::query_as(
            "SELECT started_at, duration_minutes, completed, method_id
               FROM study_sessions
              WHERE user_id = ? AND date(started_at) BETWEEN date(?) AND date(?)",
        )
        .bind(user_id)
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_all(&self.pool)
        .await
        .context("load session facts for window")?;
        rows.into_iter().map(FactRow::into_fact).collect()
    }

    async fn all_facts(&self, user_id: i64) -> Result<Vec<SessionFact>> {
        let rows: Vec<FactRow> = sqlx::query_as(
            "SELECT started_at, duration_minutes, completed, method_id
               FROM study_sessions
              WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load all session facts")?;
        rows.into_iter().map(FactRow::into_fact).collect()
    }

    async fn recommended_method(&self, user_id: i64) -> Result<Option<String>> {
        Ok(sqlx::query_scalar(
            "SELECT m.name
               FROM user_methods um
               JOIN methods m ON m.id = um.method_id
              WHERE um.user_id = ? AND um.recommended = 1
           ORDER BY um.method_id
              LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    fn weekly_from_facts(facts: &[SessionFact], today: NaiveDate) -> WeeklyProgress {
        let week_start = calc::week_start(today);
        let week_end = week_start + Days::new(6);
        let in_week: Vec<SessionFact> = facts
            .iter()
            .filter(|f| {
                let d = f.started_at.date_naive();
                d >= week_start && d <= week_end
            })
            .copied()
            .collect();
        let total_sessions = in_week.len() as i64;
        let completed_sessions = calc::completed_count(&in_week);
        WeeklyProgress {
            week_start,
            week_end,
            total_minutes: calc::total_minutes(&in_week),
            total_sessions,
            completed_sessions,
            completion_rate: calc::completion_rate(total_sessions, completed_sessions),
            daily_breakdown: calc::daily_breakdown(&in_week, week_start, week_end),
        }
    }

    /// The full dashboard payload. `None` when the user has never been seen.
    pub async fn summary(&self, user_id: i64) -> Result<Option<DashboardSummary>> {
        let user: Option<(i64, bool)> = sqlx::query_as(
            "SELECT total_studied_minutes, diagnostic_completed FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((total_studied_minutes, diagnostic_completed)) = user else {
            return Ok(None);
        };

        let today = Utc::now().date_naive();
        let facts = self.all_facts(user_id).await?;
        let method_usage = calc::method_usage(&facts);

        Ok(Some(DashboardSummary {
            user_id,
            total_studied_minutes,
            total_studied_hours: calc::minutes_to_hours(total_studied_minutes),
            diagnostic_completed,
            recommended_method: self.recommended_method(user_id).await?,
            most_used_method: method_usage.first().map(|u| u.method_name.clone()),
            today: calc::day_progress(&facts, today),
            streak: calc::study_streak(&facts, today),
            weekly: Self::weekly_from_facts(&facts, today),
            method_usage,
        }))
    }

    pub async fn today_progress(&self, user_id: i64) -> Result<DailyProgress> {
        let today = Utc::now().date_naive();
        let facts = self.facts_between(user_id, today, today).await?;
        Ok(calc::day_progress(&facts, today))
    }

    pub async fn weekly_progress(&self, user_id: i64) -> Result<WeeklyProgress> {
        let today = Utc::now().date_naive();
        let week_start = calc::week_start(today);
        let facts = self
            .facts_between(user_id, week_start, week_start + Days::new(6))
            .await?;
        Ok(Self::weekly_from_facts(&facts, today))
    }

    /// Totals for one calendar month. `None` when the month number is invalid.
    pub async fn monthly_stats(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Option<MonthlyStats>> {
        let Some((first, last)) = calc::month_bounds(year, month) else {
            return Ok(None);
        };
        let facts = self.facts_between(user_id, first, last).await?;
        let total_sessions = facts.len() as i64;
        let completed_sessions = calc::completed_count(&facts);
        let minutes = calc::total_minutes(&facts);
        Ok(Some(MonthlyStats {
            month,
            year,
            total_minutes: minutes,
            total_hours: calc::minutes_to_hours(minutes),
            total_sessions,
            completed_sessions,
            completion_rate: calc::completion_rate(total_sessions, completed_sessions),
            average_session_minutes: calc::average_session_minutes(&facts),
            most_productive_day: calc::most_productive_day(&facts),
        }))
    }

    /// Lifetime per-method usage, heaviest first.
    pub async fn methods_stats(&self, user_id: i64) -> Result<Vec<MethodUsage>> {
        let facts = self.all_facts(user_id).await?;
        Ok(calc::method_usage(&facts))
    }
}
