use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use super::models::{Category, Knowledge};
use crate::seeds;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("chat log serialization error: {0}")]
    ChatLog(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(&path)?;
        let db = Database { conn: Mutex::new(conn) };
        db.init()?;
        Ok(db)
    }

    #[allow(dead_code)]
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn: Mutex::new(conn) };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // parent_id is intentionally not a foreign key: inserts never validate
        // it and parent deletion does not cascade, so dangling references are
        // live data the traversal code must tolerate.
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS knowledge (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                parent_id TEXT,
                generation INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                chat_log TEXT NOT NULL DEFAULT '[]',
                times_shown INTEGER NOT NULL DEFAULT 0,
                children_count INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_knowledge_parent_id ON knowledge(parent_id);
            CREATE INDEX IF NOT EXISTS idx_knowledge_category ON knowledge(category);
            CREATE INDEX IF NOT EXISTS idx_knowledge_generation ON knowledge(generation);
            ",
        )?;

        // Seed rows ship with the game and survive reopen without duplication.
        for seed in seeds::seed_knowledge() {
            let chat_log = serde_json::to_string(&seed.chat_log)?;
            conn.execute(
                "INSERT OR IGNORE INTO knowledge (id, title, category, description, parent_id, generation, created_at, created_by, chat_log, times_shown, children_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    seed.id,
                    seed.title,
                    seed.category.as_str(),
                    seed.description,
                    seed.parent_id,
                    seed.generation,
                    seed.created_at,
                    seed.created_by,
                    chat_log,
                    seed.times_shown,
                    seed.children_count,
                ],
            )?;
        }

        Ok(())
    }

    /// Standard SELECT columns for knowledge rows
    const KNOWLEDGE_COLUMNS: &'static str =
        "id, title, category, description, parent_id, generation, created_at, created_by, chat_log, times_shown, children_count";

    /// Helper to convert a row to Knowledge. Malformed stored data degrades
    /// instead of failing the whole query: unknown categories fall back to
    /// misc and an unreadable chat log reads as empty.
    fn row_to_knowledge(row: &rusqlite::Row) -> rusqlite::Result<Knowledge> {
        let category: String = row.get(2)?;
        let chat_log: String = row.get(8)?;
        Ok(Knowledge {
            id: row.get(0)?,
            title: row.get(1)?,
            category: Category::from_str(&category).unwrap_or(Category::Misc),
            description: row.get(3)?,
            parent_id: row.get(4)?,
            generation: row.get(5)?,
            created_at: row.get(6)?,
            created_by: row.get(7)?,
            chat_log: serde_json::from_str(&chat_log).unwrap_or_default(),
            times_shown: row.get(9)?,
            children_count: row.get(10)?,
        })
    }

    pub fn list_all(&self) -> StoreResult<Vec<Knowledge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM knowledge ORDER BY created_at DESC",
            Self::KNOWLEDGE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], Self::row_to_knowledge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_by_id(&self, id: &str) -> StoreResult<Option<Knowledge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM knowledge WHERE id = ?1",
            Self::KNOWLEDGE_COLUMNS
        ))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_knowledge(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_by_category(&self, category: Category) -> StoreResult<Vec<Knowledge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM knowledge WHERE category = ?1 ORDER BY created_at DESC",
            Self::KNOWLEDGE_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![category.as_str()], Self::row_to_knowledge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Seed entries (generation 0), ordered by id for a stable game menu.
    pub fn list_seeds(&self) -> StoreResult<Vec<Knowledge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM knowledge WHERE generation = 0 ORDER BY id",
            Self::KNOWLEDGE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], Self::row_to_knowledge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Insert unless a row with the same id already exists. Returns whether a
    /// fresh row was written; duplicates are a normal outcome, not an error.
    pub fn insert_if_absent(&self, knowledge: &Knowledge) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM knowledge WHERE id = ?1",
            params![knowledge.id],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(false);
        }

        let chat_log = serde_json::to_string(&knowledge.chat_log)?;
        conn.execute(
            "INSERT INTO knowledge (id, title, category, description, parent_id, generation, created_at, created_by, chat_log, times_shown, children_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                knowledge.id,
                knowledge.title,
                knowledge.category.as_str(),
                knowledge.description,
                knowledge.parent_id,
                knowledge.generation,
                knowledge.created_at,
                knowledge.created_by,
                chat_log,
                knowledge.times_shown,
                knowledge.children_count,
            ],
        )?;
        Ok(true)
    }

    pub fn increment_child_count(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE knowledge SET children_count = children_count + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    pub fn increment_times_shown(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE knowledge SET times_shown = times_shown + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    pub fn delete_by_title(&self, title: &str) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute("DELETE FROM knowledge WHERE title = ?1", params![title])?;
        Ok(count)
    }

    pub fn delete_by_ids(&self, ids: &[String]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM knowledge WHERE id IN ({})", placeholders);
        let count = conn.execute(&sql, rusqlite::params_from_iter(ids.iter()))?;
        Ok(count)
    }

    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM knowledge", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
