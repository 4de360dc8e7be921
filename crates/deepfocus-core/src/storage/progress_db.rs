//! SQLite-backed progress persistence.
//!
//! Provides persistent storage for:
//! - The single user's `ProgressState` (a key-value slot, JSON-encoded)
//! - A completion history table and statistics rollup

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::error::{CoreError, Result, StorageError};
use crate::graph::LearningNode;
use crate::progress::{ProgressState, ProgressStore};

const PROGRESS_KEY: &str = "progress_state";

/// One row of the completion history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: i64,
    pub node_id: String,
    pub subject: String,
    pub exp_awarded: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_completions: u64,
    pub total_exp_awarded: u64,
    pub today_completions: u64,
}

/// SQLite database holding progress state and completion history.
pub struct ProgressDb {
    conn: Connection,
}

impl ProgressDb {
    /// Open the database at `~/.config/deepfocus/deepfocus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let path = data_dir()
            .map_err(|e| CoreError::Custom(e.to_string()))?
            .join("deepfocus.db");
        Self::open_at(&path)
    }

    /// Open at an explicit path (tests use a temp directory).
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| {
            CoreError::Storage(StorageError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })
        })?;
        let db = Self { conn };
        db.migrate().map_err(StorageError::from)?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate().map_err(StorageError::from)?;
        Ok(db)
    }

    fn migrate(&self) -> std::result::Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS completions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                node_id      TEXT NOT NULL,
                subject      TEXT NOT NULL DEFAULT '',
                exp_awarded  INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_completions_completed_at ON completions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_completions_node_id ON completions(node_id);",
        )?;
        Ok(())
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(StorageError::from)?;
        let mut rows = stmt.query(params![key]).map_err(StorageError::from)?;
        match rows.next().map_err(StorageError::from)? {
            Some(row) => Ok(Some(row.get(0).map_err(StorageError::from)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Full completion history, most recent first.
    pub fn completions(&self) -> Result<Vec<CompletionRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, node_id, subject, exp_awarded, completed_at
                 FROM completions ORDER BY completed_at DESC, id DESC",
            )
            .map_err(StorageError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(StorageError::from)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, node_id, subject, exp_awarded, completed_at) =
                row.map_err(StorageError::from)?;
            let completed_at = completed_at
                .parse::<DateTime<Utc>>()
                .map_err(|e| StorageError::CorruptRecord(e.to_string()))?;
            records.push(CompletionRecord {
                id,
                node_id,
                subject,
                exp_awarded,
                completed_at,
            });
        }
        Ok(records)
    }

    pub fn stats(&self) -> Result<Stats> {
        let (total_completions, total_exp_awarded) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(exp_awarded), 0) FROM completions",
                [],
                |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
            )
            .map_err(StorageError::from)?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let today_completions = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM completions WHERE completed_at >= ?1",
                params![format!("{today}T00:00:00+00:00")],
                |row| row.get::<_, u64>(0),
            )
            .map_err(StorageError::from)?;

        Ok(Stats {
            total_completions,
            total_exp_awarded,
            today_completions,
        })
    }
}

impl ProgressStore for ProgressDb {
    fn load(&self) -> Result<ProgressState> {
        match self.kv_get(PROGRESS_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StorageError::CorruptRecord(e.to_string()).into()),
            None => Ok(ProgressState::default()),
        }
    }

    fn save(&self, state: &ProgressState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv_set(PROGRESS_KEY, &json)
    }

    fn record_completion(&self, node: &LearningNode, exp_awarded: u64) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO completions (node_id, subject, exp_awarded, completed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![node.id, node.subject, exp_awarded, Utc::now().to_rfc3339()],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SkillGraph;

    #[test]
    fn fresh_db_loads_default_state() {
        let db = ProgressDb::open_memory().unwrap();
        let state = db.load().unwrap();
        assert!(state.completed_ids.is_empty());
        assert_eq!(state.focus_score, 100);
    }

    #[test]
    fn save_then_load_round_trips() {
        let db = ProgressDb::open_memory().unwrap();
        let mut state = ProgressState::default();
        state.complete_node("p1", 100);
        db.save(&state).unwrap();
        let loaded = db.load().unwrap();
        assert!(loaded.is_completed("p1"));
        assert_eq!(loaded.current_exp, 100);
    }

    #[test]
    fn completion_history_and_stats() {
        let db = ProgressDb::open_memory().unwrap();
        let graph = SkillGraph::default_catalog();
        db.record_completion(graph.get("p1").unwrap(), 100).unwrap();
        db.record_completion(graph.get("n1").unwrap(), 100).unwrap();

        let records = db.completions().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.subject == "Neuroscience"));

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_completions, 2);
        assert_eq!(stats.total_exp_awarded, 200);
        assert_eq!(stats.today_completions, 2);
    }

    #[test]
    fn opens_at_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deepfocus.db");
        {
            let db = ProgressDb::open_at(&path).unwrap();
            let mut state = ProgressState::default();
            state.complete_node("phi1", 100);
            db.save(&state).unwrap();
        }
        let db = ProgressDb::open_at(&path).unwrap();
        assert!(db.load().unwrap().is_completed("phi1"));
    }
}
