//! Dashboard response shapes.

use chrono::NaiveDate;
use serde::Serialize;

/// Aggregates for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub total_minutes: i64,
    pub total_sessions: i64,
    pub completed_sessions: i64,
    /// Percentage, rounded to 2 decimals. 0.0 when the day has no sessions.
    pub completion_rate: f64,
}

/// A Monday-to-Sunday week with its per-day breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyProgress {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_minutes: i64,
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub completion_rate: f64,
    /// One entry per day of the week, zero-filled for idle days.
    pub daily_breakdown: Vec<DailyProgress>,
}

/// How much one study method has been used, relative to the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodUsage {
    pub method_id: i64,
    pub method_name: String,
    pub total_sessions: i64,
    pub total_minutes: i64,
    pub total_hours: f64,
    /// Share of all studied minutes, rounded to 2 decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyStreak {
    /// Consecutive days ending today or yesterday; 0 otherwise.
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_study_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    pub month: u32,
    pub year: i32,
    pub total_minutes: i64,
    pub total_hours: f64,
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub completion_rate: f64,
    pub average_session_minutes: f64,
    /// English weekday name with the largest minute sum; absent when the
    /// month has no sessions.
    pub most_productive_day: Option<String>,
}

/// The main dashboard payload: lifetime totals plus the current windows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub user_id: i64,
    pub total_studied_minutes: i64,
    pub total_studied_hours: f64,
    pub diagnostic_completed: bool,
    pub recommended_method: Option<String>,
    pub most_used_method: Option<String>,
    pub today: DailyProgress,
    pub streak: StudyStreak,
    pub weekly: WeeklyProgress,
    pub method_usage: Vec<MethodUsage>,
}
