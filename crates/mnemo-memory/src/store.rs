// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with vector BLOB storage and a change log.
//!
//! Every mutation writes its history entry in the same transaction, so the
//! log never disagrees with the memories table.

use std::path::Path;

use mnemo_core::MnemoError;
use mnemo_core::types::{HistoryEntry, MemoryEventKind, MemoryScope};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::types::{StoredMemory, blob_to_vec, now_timestamp, vec_to_blob};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY NOT NULL,
    content TEXT NOT NULL,
    hash TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT,
    user_id TEXT,
    agent_id TEXT,
    run_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_memories_user ON memories(user_id);
CREATE INDEX IF NOT EXISTS idx_memories_hash ON memories(hash);

CREATE TABLE IF NOT EXISTS history (
    id TEXT PRIMARY KEY NOT NULL,
    memory_id TEXT NOT NULL,
    old_memory TEXT,
    new_memory TEXT,
    event TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_history_memory ON history(memory_id);
";

const MEMORY_COLUMNS: &str =
    "id, content, hash, embedding, metadata, user_id, agent_id, run_id, created_at, updated_at";

/// Matches every identifier that is set; unset identifiers match anything.
const SCOPE_FILTER: &str =
    "(?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR agent_id = ?2) AND (?3 IS NULL OR run_id = ?3)";

/// Helper to convert tokio_rusqlite errors into MnemoError::Storage.
fn storage_err(e: tokio_rusqlite::Error) -> MnemoError {
    MnemoError::Storage {
        source: Box::new(e),
    }
}

/// Persistent store for memories and their history in SQLite.
pub struct MemoryStore {
    conn: Connection,
}

impl MemoryStore {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    pub async fn open(path: &str) -> Result<Self, MnemoError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MnemoError::Storage {
                    source: Box::new(e),
                })?;
        }

        let conn = Connection::open(path).await.map_err(|e| MnemoError::Storage { source: Box::new(e) })?;
        Self::initialize(conn).await
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, MnemoError> {
        let conn = Connection::open_in_memory().await.map_err(|e| MnemoError::Storage { source: Box::new(e) })?;
        Self::initialize(conn).await
    }

    async fn initialize(conn: Connection) -> Result<Self, MnemoError> {
        conn.call(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(storage_err)?;
        Ok(Self { conn })
    }

    /// Inserts a memory and records an `ADD` history entry.
    pub async fn insert(&self, memory: &StoredMemory) -> Result<(), MnemoError> {
        let memory = memory.clone();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    &format!(
                        "INSERT INTO memories ({MEMORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                    ),
                    rusqlite::params![
                        memory.id,
                        memory.content,
                        memory.hash,
                        vec_to_blob(&memory.embedding),
                        memory.metadata.as_ref().map(|m| m.to_string()),
                        memory.scope.user_id,
                        memory.scope.agent_id,
                        memory.scope.run_id,
                        memory.created_at,
                        memory.updated_at,
                    ],
                )?;
                record_history(
                    &tx,
                    &memory.id,
                    None,
                    Some(&memory.content),
                    MemoryEventKind::Add,
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Get a memory by ID.
    pub async fn get(&self, id: &str) -> Result<Option<StoredMemory>, MnemoError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let memory = conn
                    .query_row(
                        &format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"),
                        rusqlite::params![id],
                        row_to_memory,
                    )
                    .optional()?;
                Ok(memory)
            })
            .await
            .map_err(storage_err)
    }

    /// Lists memories in `scope`, newest first.
    pub async fn list(&self, scope: &MemoryScope) -> Result<Vec<StoredMemory>, MnemoError> {
        let scope = scope.clone();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories WHERE {SCOPE_FILTER} ORDER BY created_at DESC, rowid DESC"
                ))?;
                let memories = stmt
                    .query_map(
                        rusqlite::params![scope.user_id, scope.agent_id, scope.run_id],
                        row_to_memory,
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(memories)
            })
            .await
            .map_err(storage_err)
    }

    /// Finds a memory with `hash` whose identifiers equal `scope` exactly.
    pub async fn find_by_hash(
        &self,
        scope: &MemoryScope,
        hash: &str,
    ) -> Result<Option<String>, MnemoError> {
        let scope = scope.clone();
        let hash = hash.to_string();
        self.conn
            .call(move |conn| {
                let id = conn
                    .query_row(
                        "SELECT id FROM memories WHERE hash = ?1 AND user_id IS ?2 AND agent_id IS ?3 AND run_id IS ?4 LIMIT 1",
                        rusqlite::params![hash, scope.user_id, scope.agent_id, scope.run_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(id)
            })
            .await
            .map_err(storage_err)
    }

    /// Replaces the content of a memory and records an `UPDATE` entry.
    ///
    /// Returns false when the memory does not exist.
    pub async fn update(
        &self,
        id: &str,
        content: &str,
        hash: &str,
        embedding: &[f32],
    ) -> Result<bool, MnemoError> {
        let id = id.to_string();
        let content = content.to_string();
        let hash = hash.to_string();
        let blob = vec_to_blob(embedding);
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let old: Option<String> = tx
                    .query_row(
                        "SELECT content FROM memories WHERE id = ?1",
                        rusqlite::params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(old) = old else {
                    return Ok(false);
                };

                tx.execute(
                    "UPDATE memories SET content = ?1, hash = ?2, embedding = ?3, updated_at = ?4 WHERE id = ?5",
                    rusqlite::params![content, hash, blob, now_timestamp(), id],
                )?;
                record_history(&tx, &id, Some(&old), Some(&content), MemoryEventKind::Update)?;
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(storage_err)
    }

    /// Deletes a memory and records a `DELETE` entry.
    ///
    /// Returns false when the memory does not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, MnemoError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let deleted = delete_one(&tx, &id)?;
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(storage_err)
    }

    /// Deletes every memory in `scope`, returning how many were removed.
    pub async fn delete_scope(&self, scope: &MemoryScope) -> Result<usize, MnemoError> {
        let scope = scope.clone();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let ids: Vec<String> = {
                    let mut stmt =
                        tx.prepare(&format!("SELECT id FROM memories WHERE {SCOPE_FILTER}"))?;
                    stmt.query_map(
                        rusqlite::params![scope.user_id, scope.agent_id, scope.run_id],
                        |row| row.get(0),
                    )?
                    .collect::<Result<Vec<_>, _>>()?
                };
                for id in &ids {
                    delete_one(&tx, id)?;
                }
                tx.commit()?;
                Ok(ids.len())
            })
            .await
            .map_err(storage_err)
    }

    /// History of a memory, oldest first.
    pub async fn history(&self, memory_id: &str) -> Result<Vec<HistoryEntry>, MnemoError> {
        let memory_id = memory_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, memory_id, old_memory, new_memory, event, created_at, is_deleted FROM history WHERE memory_id = ?1 ORDER BY rowid",
                )?;
                let entries = stmt
                    .query_map(rusqlite::params![memory_id], row_to_history)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(storage_err)
    }

    /// Deletes all memories and history.
    pub async fn reset(&self) -> Result<(), MnemoError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("DELETE FROM memories; DELETE FROM history;")?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Runs a trivial query to verify the connection.
    pub async fn ping(&self) -> Result<(), MnemoError> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

fn delete_one(tx: &rusqlite::Transaction<'_>, id: &str) -> Result<bool, rusqlite::Error> {
    let old: Option<String> = tx
        .query_row(
            "SELECT content FROM memories WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(old) = old else {
        return Ok(false);
    };

    tx.execute("DELETE FROM memories WHERE id = ?1", rusqlite::params![id])?;
    record_history(tx, id, Some(&old), None, MemoryEventKind::Delete)?;
    Ok(true)
}

fn record_history(
    conn: &rusqlite::Connection,
    memory_id: &str,
    old_memory: Option<&str>,
    new_memory: Option<&str>,
    event: MemoryEventKind,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO history (id, memory_id, old_memory, new_memory, event, created_at, is_deleted) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            uuid::Uuid::new_v4().to_string(),
            memory_id,
            old_memory,
            new_memory,
            event.to_string(),
            now_timestamp(),
            event == MemoryEventKind::Delete,
        ],
    )?;
    Ok(())
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> Result<StoredMemory, rusqlite::Error> {
    let blob: Vec<u8> = row.get(3)?;
    let metadata: Option<String> = row.get(4)?;
    Ok(StoredMemory {
        id: row.get(0)?,
        content: row.get(1)?,
        hash: row.get(2)?,
        embedding: blob_to_vec(&blob),
        metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
        scope: MemoryScope {
            user_id: row.get(5)?,
            agent_id: row.get(6)?,
            run_id: row.get(7)?,
        },
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_history(row: &rusqlite::Row<'_>) -> Result<HistoryEntry, rusqlite::Error> {
    let event: String = row.get(4)?;
    let event = event.parse::<MemoryEventKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        memory_id: row.get(1)?,
        old_memory: row.get(2)?,
        new_memory: row.get(3)?,
        event,
        created_at: row.get(5)?,
        is_deleted: row.get(6)?,
    })
}
