//! Pure diagnostic scoring and recommendation.
//!
//! Answers are validated first (`validate_answers`), then tallied into a
//! per-method score board (`score_answers`), and finally turned into a
//! primary/secondary recommendation (`recommend`). None of this touches
//! storage; the reference data arrives as plain maps.

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::methods::{method_name, METHODS};

/// One submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub question_id: i64,
    pub option_id: i64,
}

/// A scoring-table entry for one selectable option.
#[derive(Debug, Clone, Copy)]
pub struct ScoringOption {
    pub question_id: i64,
    pub method_id: i64,
    pub points: i64,
}

/// A method and its accumulated score. The full board always covers every
/// method in the catalog, in declaration order, even at score zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodScore {
    pub name: &'static str,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub primary: MethodScore,
    /// Present only when the runner-up scored at least 80% of the primary.
    pub secondary: Option<MethodScore>,
}

/// A submission the caller must reject before scoring.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected {expected} answers, got {got}")]
    WrongAnswerCount { expected: usize, got: usize },
    #[error("question {0} answered more than once")]
    DuplicateQuestion(i64),
    #[error("question {0} was not answered")]
    MissingQuestion(i64),
    #[error("option {option_id} is not valid for question {question_id}")]
    OptionMismatch { question_id: i64, option_id: i64 },
}

/// Reference data broken in a way that should never happen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("option {0} missing from the scoring table")]
    UnknownOption(i64),
    #[error("method id {0} is not in the catalog")]
    UnknownMethod(i64),
}

/// Check that `answers` covers every question exactly once and that each
/// chosen option belongs to its question.
pub fn validate_answers(
    answers: &[Answer],
    question_ids: &BTreeSet<i64>,
    options: &HashMap<i64, ScoringOption>,
) -> Result<(), ValidationError> {
    if answers.len() != question_ids.len() {
        return Err(ValidationError::WrongAnswerCount {
            expected: question_ids.len(),
            got: answers.len(),
        });
    }

    let mut seen = BTreeSet::new();
    for a in answers {
        if !seen.insert(a.question_id) {
            return Err(ValidationError::DuplicateQuestion(a.question_id));
        }
        let belongs = options
            .get(&a.option_id)
            .is_some_and(|opt| opt.question_id == a.question_id);
        if !belongs {
            return Err(ValidationError::OptionMismatch {
                question_id: a.question_id,
                option_id: a.option_id,
            });
        }
    }

    if let Some(missing) = question_ids.difference(&seen).next() {
        return Err(ValidationError::MissingQuestion(*missing));
    }
    Ok(())
}

/// Tally each answer's points into a zero-initialised board covering the
/// whole method catalog. Unknown options or method ids are internal
/// consistency errors — the reference data is seeded, so they signal a
/// broken table, not bad user input.
pub fn score_answers(
    answers: &[Answer],
    options: &HashMap<i64, ScoringOption>,
) -> Result<Vec<MethodScore>, ScoreError> {
    let mut board: Vec<MethodScore> = METHODS
        .iter()
        .map(|m| MethodScore { name: m.name, score: 0 })
        .collect();

    for a in answers {
        let opt = options
            .get(&a.option_id)
            .ok_or(ScoreError::UnknownOption(a.option_id))?;
        let name =
            method_name(opt.method_id).ok_or(ScoreError::UnknownMethod(opt.method_id))?;
        // The board covers the whole catalog, so this lookup cannot miss.
        if let Some(entry) = board.iter_mut().find(|s| s.name == name) {
            entry.score += opt.points;
        }
    }
    Ok(board)
}

/// Pick the primary (and conditionally secondary) method from a score board.
///
/// Stable sort by score descending: methods tied on score keep their catalog
/// declaration order, which makes the outcome deterministic. The runner-up
/// becomes secondary only when its score is at least 80% of the primary's.
pub fn recommend(board: &[MethodScore]) -> Recommendation {
    let mut sorted = board.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    let primary = sorted[0];
    let secondary = sorted
        .get(1)
        .filter(|s| (s.score as f64) >= (primary.score as f64) * 0.8)
        .copied();

    Recommendation { primary, secondary }
}
