//! Pure aggregation over session facts.
//!
//! Everything here operates on an in-memory slice of [`SessionFact`] rows;
//! no function touches the database or the clock. Callers pass the window
//! bounds and "today" explicitly, which keeps the math trivially testable.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use std::collections::BTreeSet;

use crate::dashboard::model::{DailyProgress, MethodUsage, StudyStreak};
use crate::methods::method_name;

/// The facts the calculator needs about one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionFact {
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub completed: bool,
    pub method_id: i64,
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Round to 2 decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn total_minutes(facts: &[SessionFact]) -> i64 {
    facts.iter().map(|f| f.duration_minutes).sum()
}

pub fn completed_count(facts: &[SessionFact]) -> i64 {
    facts.iter().filter(|f| f.completed).count() as i64
}

/// Completed sessions as a percentage of all sessions. 0.0 when there are
/// no sessions at all.
pub fn completion_rate(total_sessions: i64, completed_sessions: i64) -> f64 {
    if total_sessions == 0 {
        return 0.0;
    }
    round2(completed_sessions as f64 / total_sessions as f64 * 100.0)
}

pub fn minutes_to_hours(minutes: i64) -> f64 {
    round2(minutes as f64 / 60.0)
}

/// Aggregates for a single calendar day.
pub fn day_progress(facts: &[SessionFact], date: NaiveDate) -> DailyProgress {
    let day: Vec<SessionFact> = facts
        .iter()
        .filter(|f| f.started_at.date_naive() == date)
        .copied()
        .collect();
    let total_sessions = day.len() as i64;
    let completed_sessions = completed_count(&day);
    DailyProgress {
        date,
        total_minutes: total_minutes(&day),
        total_sessions,
        completed_sessions,
        completion_rate: completion_rate(total_sessions, completed_sessions),
    }
}

/// One entry per calendar day in `start..=end`, inclusive and zero-filled.
pub fn daily_breakdown(facts: &[SessionFact], start: NaiveDate, end: NaiveDate) -> Vec<DailyProgress> {
    let mut out = Vec::new();
    let mut date = start;
    while date <= end {
        out.push(day_progress(facts, date));
        let Some(next) = date.succ_opt() else { break };
        date = next;
    }
    out
}

/// Per-method totals with each method's share of all studied minutes,
/// sorted by minutes descending. Methods never used are omitted.
pub fn method_usage(facts: &[SessionFact]) -> Vec<MethodUsage> {
    let grand_total = total_minutes(facts);

    let mut ids: Vec<i64> = facts.iter().map(|f| f.method_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut usage: Vec<MethodUsage> = ids
        .into_iter()
        .map(|id| {
            let of_method: Vec<SessionFact> =
                facts.iter().filter(|f| f.method_id == id).copied().collect();
            let minutes = total_minutes(&of_method);
            let percentage = if grand_total == 0 {
                0.0
            } else {
                round2(minutes as f64 / grand_total as f64 * 100.0)
            };
            MethodUsage {
                method_id: id,
                method_name: method_name(id).unwrap_or("unknown").to_string(),
                total_sessions: of_method.len() as i64,
                total_minutes: minutes,
                total_hours: minutes_to_hours(minutes),
                percentage,
            }
        })
        .collect();

    usage.sort_by(|a, b| b.total_minutes.cmp(&a.total_minutes));
    usage
}

/// Current and longest runs of consecutive study days.
///
/// The current streak is 0 unless the most recent study date is `today` or
/// yesterday; otherwise it is the length of the contiguous run ending there.
/// The longest streak is found in a single scan over the distinct dates.
pub fn study_streak(facts: &[SessionFact], today: NaiveDate) -> StudyStreak {
    let dates: BTreeSet<NaiveDate> = facts.iter().map(|f| f.started_at.date_naive()).collect();

    let Some(&last) = dates.iter().next_back() else {
        return StudyStreak { current_streak: 0, longest_streak: 0, last_study_date: None };
    };

    let current_streak = if last == today || Some(last) == today.pred_opt() {
        let mut run = 1i64;
        let mut cursor = last;
        while let Some(prev) = cursor.pred_opt() {
            if !dates.contains(&prev) {
                break;
            }
            run += 1;
            cursor = prev;
        }
        run
    } else {
        0
    };

    let mut longest = 0i64;
    let mut run = 0i64;
    let mut prev: Option<NaiveDate> = None;
    for &d in &dates {
        run = match prev {
            Some(p) if p.succ_opt() == Some(d) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(d);
    }

    StudyStreak { current_streak, longest_streak: longest, last_study_date: Some(last) }
}

/// English name of the weekday with the largest minute sum, or `None` when
/// there are no sessions. Ties go to the earlier weekday (Monday first).
pub fn most_productive_day(facts: &[SessionFact]) -> Option<String> {
    if facts.is_empty() {
        return None;
    }
    let mut per_weekday = [0i64; 7];
    for f in facts {
        per_weekday[f.started_at.weekday().num_days_from_monday() as usize] +=
            f.duration_minutes;
    }
    let best = (0..7).max_by_key(|&i| (per_weekday[i], 6 - i))?;
    Some(WEEKDAY_NAMES[best].to_string())
}

/// Mean session length, 2 decimals, 0.0 on an empty window.
pub fn average_session_minutes(facts: &[SessionFact]) -> f64 {
    if facts.is_empty() {
        return 0.0;
    }
    round2(total_minutes(facts) as f64 / facts.len() as f64)
}

/// The Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

/// First and last day of the given month, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_month.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fact(date: &str, minutes: i64, completed: bool, method_id: i64) -> SessionFact {
        let d: NaiveDate = date.parse().unwrap();
        SessionFact {
            started_at: Utc.from_utc_datetime(&d.and_hms_opt(12, 0, 0).unwrap()),
            duration_minutes: minutes,
            completed,
            method_id,
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rates_and_rounding() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(3, 2), 66.67);
        assert_eq!(completion_rate(4, 4), 100.0);
        assert_eq!(minutes_to_hours(90), 1.5);
        assert_eq!(round2(33.333), 33.33);
    }

    #[test]
    fn breakdown_covers_every_day_zero_filled() {
        let facts = [
            fact("2025-01-02", 30, true, 1),
            fact("2025-01-02", 20, false, 2),
            fact("2025-01-05", 60, true, 1),
        ];
        let days = daily_breakdown(&facts, date("2025-01-01"), date("2025-01-07"));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].total_sessions, 0);
        assert_eq!(days[0].completion_rate, 0.0);
        assert_eq!(days[1].total_minutes, 50);
        assert_eq!(days[1].completed_sessions, 1);
        assert_eq!(days[1].completion_rate, 50.0);
        assert_eq!(days[4].total_minutes, 60);
        assert!(days.iter().all(|d| d.date >= date("2025-01-01") && d.date <= date("2025-01-07")));
    }

    #[test]
    fn usage_percentages_sum_and_sort() {
        let facts = [
            fact("2025-01-01", 75, true, 1),
            fact("2025-01-02", 25, true, 2),
        ];
        let usage = method_usage(&facts);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].method_name, "pomodoro");
        assert_eq!(usage[0].percentage, 75.0);
        assert_eq!(usage[1].percentage, 25.0);
        assert_eq!(usage[0].total_hours, 1.25);
    }

    #[test]
    fn usage_is_empty_without_sessions() {
        assert!(method_usage(&[]).is_empty());
    }

    #[test]
    fn zero_minute_usage_has_zero_percentages() {
        let facts = [fact("2025-01-01", 0, false, 3)];
        let usage = method_usage(&facts);
        assert_eq!(usage[0].percentage, 0.0);
    }

    #[test]
    fn streak_counts_runs_and_gaps() {
        // Study dates {Jan 1, 2, 3, 5}; today = Jan 5.
        let facts = [
            fact("2025-01-01", 30, true, 1),
            fact("2025-01-02", 30, true, 1),
            fact("2025-01-03", 30, true, 1),
            fact("2025-01-05", 30, true, 1),
        ];
        let streak = study_streak(&facts, date("2025-01-05"));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.last_study_date, Some(date("2025-01-05")));
    }

    #[test]
    fn streak_survives_a_yesterday_gap_to_today() {
        let facts = [fact("2025-01-04", 30, true, 1), fact("2025-01-05", 30, true, 1)];
        let streak = study_streak(&facts, date("2025-01-06"));
        assert_eq!(streak.current_streak, 2);
    }

    #[test]
    fn streak_is_zero_after_two_idle_days() {
        let facts = [fact("2025-01-01", 30, true, 1), fact("2025-01-02", 30, true, 1)];
        let streak = study_streak(&facts, date("2025-01-05"));
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.last_study_date, Some(date("2025-01-02")));
    }

    #[test]
    fn streak_on_no_sessions() {
        let streak = study_streak(&[], date("2025-01-05"));
        assert_eq!(streak, StudyStreak { current_streak: 0, longest_streak: 0, last_study_date: None });
    }

    #[test]
    fn multiple_sessions_one_day_count_once_for_streaks() {
        let facts = [
            fact("2025-01-04", 30, true, 1),
            fact("2025-01-04", 45, true, 2),
            fact("2025-01-05", 30, true, 1),
        ];
        let streak = study_streak(&facts, date("2025-01-05"));
        assert_eq!(streak.current_streak, 2);
        assert_eq!(streak.longest_streak, 2);
    }

    #[test]
    fn productive_day_picks_heaviest_weekday() {
        // 2025-01-06 is a Monday, 2025-01-07 a Tuesday.
        let facts = [
            fact("2025-01-06", 30, true, 1),
            fact("2025-01-07", 90, true, 1),
            fact("2025-01-14", 20, true, 1), // another Tuesday
        ];
        assert_eq!(most_productive_day(&facts).as_deref(), Some("Tuesday"));
        assert_eq!(most_productive_day(&[]), None);
    }

    #[test]
    fn productive_day_ties_go_to_earlier_weekday() {
        let facts = [
            fact("2025-01-06", 60, true, 1), // Monday
            fact("2025-01-08", 60, true, 1), // Wednesday
        ];
        assert_eq!(most_productive_day(&facts).as_deref(), Some("Monday"));
    }

    #[test]
    fn week_start_is_monday() {
        assert_eq!(week_start(date("2025-01-08")), date("2025-01-06")); // Wed → Mon
        assert_eq!(week_start(date("2025-01-06")), date("2025-01-06")); // Mon → itself
        assert_eq!(week_start(date("2025-01-12")), date("2025-01-06")); // Sun → Mon
    }

    #[test]
    fn month_bounds_handle_year_rollover() {
        assert_eq!(
            month_bounds(2025, 12),
            Some((date("2025-12-01"), date("2025-12-31")))
        );
        assert_eq!(
            month_bounds(2024, 2),
            Some((date("2024-02-01"), date("2024-02-29")))
        );
        assert_eq!(month_bounds(2025, 13), None);
    }

    #[test]
    fn averages() {
        let facts = [fact("2025-01-01", 30, true, 1), fact("2025-01-01", 35, true, 1)];
        assert_eq!(average_session_minutes(&facts), 32.5);
        assert_eq!(average_session_minutes(&[]), 0.0);
    }
}
