//! Integration tests for the diagnostic quiz: seeded reference data, the
//! submit flow end to end, and result replay from stored responses.

use hived::diagnostic::scorer::{self, Answer};
use hived::diagnostic::storage::DiagnosticStorage;
use hived::methods::method_id;
use hived::storage::Storage;
use tempfile::TempDir;

async fn open(dir: &TempDir) -> (Storage, DiagnosticStorage) {
    let storage = Storage::new(&dir.path().join("hived.db")).await.unwrap();
    let diagnostic = DiagnosticStorage::new(storage.pool());
    (storage, diagnostic)
}

/// Pick, for every question, the option that scores toward `method`.
async fn answers_toward(diagnostic: &DiagnosticStorage, method: &str) -> Vec<Answer> {
    let target = method_id(method).unwrap();
    let (question_ids, options) = diagnostic.load_scoring_table().await.unwrap();
    question_ids
        .iter()
        .map(|&qid| {
            let (&option_id, _) = options
                .iter()
                .find(|(_, o)| o.question_id == qid && o.method_id == target)
                .unwrap();
            Answer { question_id: qid, option_id }
        })
        .collect()
}

#[tokio::test]
async fn seed_data_is_complete_and_idempotent() {
    let dir = TempDir::new().unwrap();
    let (_, diagnostic) = open(&dir).await;

    let questions = diagnostic.list_questions().await.unwrap();
    assert_eq!(questions.len(), 5);
    for (i, q) in questions.iter().enumerate() {
        assert_eq!(q.question_order, i as i64 + 1);
        assert_eq!(q.options.len(), 4);
        assert!(!q.question_text.is_empty());
    }

    // Reopening the same database must not duplicate the seed rows.
    let storage = Storage::new(&dir.path().join("hived.db")).await.unwrap();
    let diagnostic = DiagnosticStorage::new(storage.pool());
    assert_eq!(diagnostic.list_questions().await.unwrap().len(), 5);

    let (question_ids, options) = diagnostic.load_scoring_table().await.unwrap();
    assert_eq!(question_ids.len(), 5);
    assert_eq!(options.len(), 20);
}

#[tokio::test]
async fn submit_flow_scores_and_records_recommendation() {
    let dir = TempDir::new().unwrap();
    let (storage, diagnostic) = open(&dir).await;

    let answers = answers_toward(&diagnostic, "feynman").await;
    let (question_ids, options) = diagnostic.load_scoring_table().await.unwrap();

    scorer::validate_answers(&answers, &question_ids, &options).unwrap();
    let board = scorer::score_answers(&answers, &options).unwrap();
    let rec = scorer::recommend(&board);
    assert_eq!(rec.primary.name, "feynman");

    diagnostic.replace_responses(42, &answers).await.unwrap();
    let secondary = rec.secondary.as_ref().and_then(|s| method_id(s.name));
    diagnostic
        .apply_recommendation(42, method_id(rec.primary.name).unwrap(), secondary)
        .await
        .unwrap();

    let status = diagnostic.status(42).await.unwrap();
    assert!(status.diagnostic_completed);
    assert!(status.has_recommended_method);

    let user = storage.get_user(42).await.unwrap().unwrap();
    assert!(user.diagnostic_completed);

    let recommended = diagnostic.recommended_methods(42).await.unwrap();
    assert!(recommended.iter().any(|(_, name)| name == "feynman"));
}

#[tokio::test]
async fn result_replays_from_stored_responses() {
    let dir = TempDir::new().unwrap();
    let (_, diagnostic) = open(&dir).await;

    let answers = answers_toward(&diagnostic, "flashcards").await;
    diagnostic.replace_responses(5, &answers).await.unwrap();
    diagnostic
        .apply_recommendation(5, method_id("flashcards").unwrap(), None)
        .await
        .unwrap();

    let stored = diagnostic.responses(5).await.unwrap();
    assert_eq!(stored.len(), answers.len());

    let (_, options) = diagnostic.load_scoring_table().await.unwrap();
    let board = scorer::score_answers(&stored, &options).unwrap();
    let rec = scorer::recommend(&board);
    assert_eq!(rec.primary.name, "flashcards");
}

#[tokio::test]
async fn resubmission_replaces_previous_answers_and_flags() {
    let dir = TempDir::new().unwrap();
    let (_, diagnostic) = open(&dir).await;

    let first = answers_toward(&diagnostic, "pomodoro").await;
    diagnostic.replace_responses(1, &first).await.unwrap();
    diagnostic
        .apply_recommendation(1, method_id("pomodoro").unwrap(), None)
        .await
        .unwrap();

    let second = answers_toward(&diagnostic, "cornell").await;
    diagnostic.replace_responses(1, &second).await.unwrap();
    diagnostic
        .apply_recommendation(1, method_id("cornell").unwrap(), None)
        .await
        .unwrap();

    // Only the new answers survive, and only cornell stays recommended.
    let stored = diagnostic.responses(1).await.unwrap();
    assert_eq!(stored.len(), second.len());
    assert_eq!(stored, second);

    let recommended = diagnostic.recommended_methods(1).await.unwrap();
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0].1, "cornell");
}

#[tokio::test]
async fn status_for_unknown_user_is_all_false() {
    let dir = TempDir::new().unwrap();
    let (_, diagnostic) = open(&dir).await;

    let status = diagnostic.status(999).await.unwrap();
    assert!(!status.diagnostic_completed);
    assert!(!status.has_recommended_method);
    assert_eq!(status.recommended_method_id, None);
}
