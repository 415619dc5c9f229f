//! Durable progress store on SQLite.
//!
//! The solve is one IMMEDIATE transaction: insert-or-ignore into solved_titles
//! acts as the guard, and the counters move in a single UPDATE only when that
//! insert actually added a row.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{info, warn};

use crate::domain::{Difficulty, User};
use crate::progress::{PersistenceError, ProgressStore, SolveOutcome};

impl From<rusqlite::Error> for PersistenceError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                        | rusqlite::ErrorCode::CannotOpen
                ) =>
            {
                PersistenceError::Unavailable(e.to_string())
            }
            other => PersistenceError::Storage(other.to_string()),
        }
    }
}

pub struct SqliteProgressStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProgressStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        info!(target: "progress", path = %path.display(), "Opened SQLite progress store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE IF NOT EXISTS users (
                 username TEXT PRIMARY KEY,
                 credential TEXT NOT NULL,
                 score INTEGER NOT NULL DEFAULT 0,
                 problems_solved INTEGER NOT NULL DEFAULT 0,
                 easy_solved INTEGER NOT NULL DEFAULT 0,
                 medium_solved INTEGER NOT NULL DEFAULT 0,
                 hard_solved INTEGER NOT NULL DEFAULT 0,
                 current_streak INTEGER NOT NULL DEFAULT 0,
                 best_streak INTEGER NOT NULL DEFAULT 0,
                 last_access TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS solved_titles (
                 username TEXT NOT NULL REFERENCES users(username),
                 title TEXT NOT NULL,
                 solved_at TEXT NOT NULL,
                 PRIMARY KEY (username, title)
             );
             CREATE INDEX IF NOT EXISTS idx_users_score ON users(score);",
        )?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Run blocking SQLite work off the async executor.
    async fn blocking<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, PersistenceError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| PersistenceError::Unavailable("connection mutex poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| PersistenceError::Unavailable(e.to_string()))?
    }
}

fn difficulty_column(d: Difficulty) -> &'static str {
    match d {
        Difficulty::Easy => "easy_solved",
        Difficulty::Medium => "medium_solved",
        Difficulty::Hard => "hard_solved",
    }
}

/// A corrupt timestamp must not make the whole record unreadable; it reads as
/// the epoch and is reported.
fn parse_ts(username: &str, s: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            warn!(target: "progress", %username, value = %s, error = %e, "Unreadable last_access; using epoch");
            DateTime::<Utc>::default()
        }
    }
}

fn load_user(conn: &Connection, username: &str) -> Result<Option<User>, PersistenceError> {
    let mut user = conn
        .query_row(
            "SELECT username, credential, score, problems_solved, easy_solved, medium_solved,
                    hard_solved, current_streak, best_streak, last_access
             FROM users WHERE username = ?1",
            params![username],
            |row| {
                let last_access: String = row.get(9)?;
                let name: String = row.get(0)?;
                Ok(User {
                    last_access: parse_ts(&name, &last_access),
                    username: name,
                    credential: row.get(1)?,
                    score: row.get(2)?,
                    problems_solved: row.get(3)?,
                    solved_titles: Default::default(),
                    easy_solved: row.get(4)?,
                    medium_solved: row.get(5)?,
                    hard_solved: row.get(6)?,
                    current_streak: row.get(7)?,
                    best_streak: row.get(8)?,
                })
            },
        )
        .optional()?;

    if let Some(u) = user.as_mut() {
        let mut stmt = conn.prepare("SELECT title FROM solved_titles WHERE username = ?1")?;
        let titles = stmt.query_map(params![username], |row| row.get::<_, String>(0))?;
        for t in titles {
            u.solved_titles.insert(t?);
        }
    }
    Ok(user)
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    async fn register(&self, username: &str, credential: &str) -> Result<User, PersistenceError> {
        let username = username.to_string();
        let credential = credential.to_string();
        self.blocking(move |conn| {
            let now = Utc::now().to_rfc3339();
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (username, credential, last_access) VALUES (?1, ?2, ?3)",
                params![username, credential, now],
            )?;
            if inserted == 0 {
                return Err(PersistenceError::DuplicateUser(username));
            }
            load_user(conn, &username)?.ok_or(PersistenceError::UserNotFound(username))
        })
        .await
    }

    async fn user(&self, username: &str) -> Result<Option<User>, PersistenceError> {
        let username = username.to_string();
        self.blocking(move |conn| load_user(conn, &username)).await
    }

    async fn touch_access(&self, username: &str) -> Result<(), PersistenceError> {
        let username = username.to_string();
        self.blocking(move |conn| {
            let n = conn.execute(
                "UPDATE users SET last_access = ?1 WHERE username = ?2",
                params![Utc::now().to_rfc3339(), username],
            )?;
            if n == 0 {
                return Err(PersistenceError::UserNotFound(username));
            }
            Ok(())
        })
        .await
    }

    async fn record_solve(
        &self,
        username: &str,
        title: &str,
        difficulty: Difficulty,
        points: i64,
    ) -> Result<SolveOutcome, PersistenceError> {
        let username = username.to_string();
        let title = title.to_string();
        let points = points.max(0);
        self.blocking(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let exists: bool = tx
                .query_row("SELECT 1 FROM users WHERE username = ?1", params![username], |_| Ok(true))
                .optional()?
                .unwrap_or(false);
            if !exists {
                return Err(PersistenceError::UserNotFound(username));
            }

            let now = Utc::now().to_rfc3339();
            let added = tx.execute(
                "INSERT OR IGNORE INTO solved_titles (username, title, solved_at) VALUES (?1, ?2, ?3)",
                params![username, title, now],
            )?;
            let applied = added == 1;
            if applied {
                // Right-hand sides see the pre-update row, hence current_streak + 1.
                // SQLite turns an overflowing integer sum into REAL, so saturate first.
                let sql = format!(
                    "UPDATE users SET
                         score = CASE WHEN score > 9223372036854775807 - ?1
                                      THEN 9223372036854775807
                                      ELSE score + ?1 END,
                         problems_solved = problems_solved + 1,
                         current_streak = current_streak + 1,
                         best_streak = MAX(best_streak, current_streak + 1),
                         {col} = {col} + 1,
                         last_access = ?2
                     WHERE username = ?3",
                    col = difficulty_column(difficulty)
                );
                tx.execute(&sql, params![points, now, username])?;
            }
            tx.commit()?;

            let user = load_user(conn, &username)?.ok_or(PersistenceError::UserNotFound(username))?;
            Ok(SolveOutcome { applied, user })
        })
        .await
    }

    async fn top_by_score(&self, limit: usize) -> Result<Vec<User>, PersistenceError> {
        self.blocking(move |conn| {
            let names: Vec<String> = {
                let mut stmt = conn.prepare(
                    "SELECT username FROM users WHERE score > 0 ORDER BY score DESC, rowid ASC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<_, _>>()?
            };
            let mut users = Vec::with_capacity(names.len());
            for name in names {
                if let Some(u) = load_user(conn, &name)? {
                    users.push(u);
                }
            }
            Ok(users)
        })
        .await
    }
}
