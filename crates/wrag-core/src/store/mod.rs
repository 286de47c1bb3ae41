// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::path::Path;

use rusqlite::{params, Connection};

use wrag_common::types::{ChatTurn, Role};
use wrag_common::{Error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    label TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE TABLE IF NOT EXISTS turns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    source_url TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id);
";

/// sqlite-backed chat session store. the engine itself is stateless;
/// this exists so the REPL can hand back history each turn.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { conn })
    }

    /// idempotent: resuming an existing session is a no-op
    pub fn create_session(&self, session_id: &str, label: Option<&str>) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO sessions (id, label) VALUES (?1, ?2)",
                params![session_id, label],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn add_turn(
        &self,
        session_id: &str,
        turn: &ChatTurn,
        source_url: Option<&str>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO turns (session_id, role, content, source_url)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, turn.role.as_str(), turn.content, source_url],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// newest `limit` turns of a session, returned oldest-first
    pub fn recent_turns(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT role, content FROM turns
                 WHERE session_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![session_id, limit], |row| {
                let role: String = row.get(0)?;
                let content: String = row.get(1)?;
                Ok(ChatTurn {
                    role: Role::from_str_lossy(&role),
                    content,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut turns = Vec::new();
        for row in rows {
            turns.push(row.map_err(|e| Error::Database(e.to_string()))?);
        }
        turns.reverse();
        Ok(turns)
    }
}
