//! SQLite persistence layer.
//!
//! One pool, WAL mode, schema bootstrapped with `CREATE TABLE IF NOT EXISTS`
//! at startup — no external migration files. Reference data (methods and the
//! diagnostic question bank) is seeded idempotently on every start.

pub mod sessions;

use anyhow::{Context as _, Result};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

use crate::methods::METHODS;

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

/// A seeded diagnostic question: text plus its four answer options
/// (option text, method id the option scores toward, points).
struct SeedQuestion {
    text: &'static str,
    options: [(&'static str, i64, i64); 4],
}

/// The built-in question bank. Option order inside a question follows the
/// method catalog (pomodoro, feynman, cornell, flashcards).
const SEED_QUESTIONS: [SeedQuestion; 5] = [
    SeedQuestion {
        text: "When you sit down to study, what usually works best for you?",
        options: [
            ("Short, timed bursts with breaks in between", 1, 3),
            ("Explaining the topic to myself or someone else", 2, 3),
            ("Writing structured notes as I go", 3, 3),
            ("Quizzing myself over and over", 4, 3),
        ],
    },
    SeedQuestion {
        text: "What is your biggest obstacle while studying?",
        options: [
            ("I get distracted and lose track of time", 1, 3),
            ("I read things but don't really understand them", 2, 3),
            ("My notes end up messy and useless for review", 3, 3),
            ("I forget the material within a few days", 4, 3),
        ],
    },
    SeedQuestion {
        text: "How do you prefer to review before an exam?",
        options: [
            ("Focused sprints with a countdown running", 1, 2),
            ("Talking through the ideas in my own words", 2, 2),
            ("Re-reading summaries and key-word cues", 3, 2),
            ("Running through question-and-answer cards", 4, 2),
        ],
    },
    SeedQuestion {
        text: "Which describes the material you study most often?",
        options: [
            ("Long problem sets that need sustained focus", 1, 2),
            ("Abstract concepts I need to truly understand", 2, 2),
            ("Lecture-heavy courses with lots of note-taking", 3, 2),
            ("Vocabulary, formulas, or facts to memorise", 4, 2),
        ],
    },
    SeedQuestion {
        text: "After a study session, how do you check what you learned?",
        options: [
            ("I count how many focused blocks I completed", 1, 1),
            ("I try to explain the topic without looking", 2, 2),
            ("I condense my notes into a short summary", 3, 2),
            ("I test myself with the cards I made", 4, 2),
        ],
    },
];

impl Storage {
    /// Open (or create) the database at `db_path` and bootstrap the schema.
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(dir) = db_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::init_schema(&pool).await?;
        Self::seed_reference_data(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used to create the per-domain storage layers sharing one connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        let stmts = [
            // Per-user aggregate state. Rows are created lazily on first touch;
            // total_studied_minutes must always equal the sum of the user's
            // non-deleted session durations.
            "CREATE TABLE IF NOT EXISTS users (
                id                     INTEGER PRIMARY KEY,
                username               TEXT NOT NULL DEFAULT '',
                total_studied_minutes  INTEGER NOT NULL DEFAULT 0,
                diagnostic_completed   INTEGER NOT NULL DEFAULT 0
            )",
            "CREATE TABLE IF NOT EXISTS methods (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS study_sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id          INTEGER NOT NULL,
                method_id        INTEGER NOT NULL,
                started_at       TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                completed        INTEGER NOT NULL,
                note             TEXT
            )",
            "CREATE INDEX IF NOT EXISTS idx_study_sessions_user
                 ON study_sessions (user_id, started_at)",
            // Per-user method flags: recommended by the diagnostic, and/or
            // actually used in a logged session.
            "CREATE TABLE IF NOT EXISTS user_methods (
                user_id     INTEGER NOT NULL,
                method_id   INTEGER NOT NULL,
                recommended INTEGER NOT NULL DEFAULT 0,
                used        INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, method_id)
            )",
            "CREATE TABLE IF NOT EXISTS diagnostic_questions (
                id             INTEGER PRIMARY KEY,
                question_text  TEXT NOT NULL,
                question_order INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS diagnostic_options (
                id          INTEGER PRIMARY KEY,
                question_id INTEGER NOT NULL,
                option_text TEXT NOT NULL,
                method_id   INTEGER NOT NULL,
                points      INTEGER NOT NULL DEFAULT 1
            )",
            "CREATE TABLE IF NOT EXISTS diagnostic_responses (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL,
                question_id INTEGER NOT NULL,
                option_id   INTEGER NOT NULL,
                answered_at TEXT NOT NULL
            )",
        ];
        for stmt in stmts {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("schema bootstrap")?;
        }
        Ok(())
    }

    /// Insert the method catalog and the question bank. `INSERT OR IGNORE`
    /// keeps this idempotent across restarts.
    async fn seed_reference_data(pool: &SqlitePool) -> Result<()> {
        for m in &METHODS {
            sqlx::query("INSERT OR IGNORE INTO methods (id, name, description) VALUES (?, ?, ?)")
                .bind(m.id)
                .bind(m.name)
                .bind(m.description)
                .execute(pool)
                .await
                .context("seed methods")?;
        }

        let mut option_id: i64 = 0;
        for (i, q) in SEED_QUESTIONS.iter().enumerate() {
            let question_id = i as i64 + 1;
            sqlx::query(
                "INSERT OR IGNORE INTO diagnostic_questions (id, question_text, question_order)
                 VALUES (?, ?, ?)",
            )
            .bind(question_id)
            .bind(q.text)
            .bind(question_id)
            .execute(pool)
            .await
            .context("seed questions")?;

            for (text, method_id, points) in q.options {
                option_id += 1;
                sqlx::query(
                    "INSERT OR IGNORE INTO diagnostic_options
                         (id, question_id, option_text, method_id, points)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(option_id)
                .bind(question_id)
                .bind(text)
                .bind(method_id)
                .bind(points)
                .execute(pool)
                .await
                .context("seed options")?;
            }
        }
        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn method_exists(&self, method_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM methods WHERE id = ?")
            .bind(method_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub total_studied_minutes: i64,
    pub diagnostic_completed: bool,
}
