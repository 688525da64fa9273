//! Persistent permission-decision store backed by SQLite.
//!
//! Decisions are keyed by `(hostname, permission)` and never expire; a row
//! is either granted (1) or denied (2). Absence of a row means the user has
//! not decided yet.

use std::path::Path;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::types::errors::StorageError;
use crate::types::permission::{PermissionDecision, PermissionRecord};

pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (or creates) the store at the given path and ensures the
    /// schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// In-memory store, discarded on drop.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS permissions (
                    id TEXT PRIMARY KEY,
                    url TEXT NOT NULL,
                    permission TEXT NOT NULL,
                    type INTEGER NOT NULL,
                    media_types TEXT NOT NULL DEFAULT ''
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_permissions_url_perm
                    ON permissions (url, permission);",
            )
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }

    /// The stored decision for `(hostname, permission)`, if any.
    pub fn find_permission(
        &self,
        hostname: &str,
        permission: &str,
    ) -> Result<Option<PermissionDecision>, StorageError> {
        let result = self.conn.query_row(
            "SELECT type FROM permissions WHERE url = ?1 AND permission = ?2",
            params![hostname, permission],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(value) => Ok(PermissionDecision::from_i64(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::DatabaseError(e.to_string())),
        }
    }

    /// Records a decision, replacing any earlier one for the same key.
    pub fn save_permission(
        &mut self,
        hostname: &str,
        permission: &str,
        decision: PermissionDecision,
        media_types: &str,
    ) -> Result<(), StorageError> {
        let updated = self
            .conn
            .execute(
                "UPDATE permissions SET type = ?1, media_types = ?2
                 WHERE url = ?3 AND permission = ?4",
                params![decision.as_i64(), media_types, hostname, permission],
            )
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if updated == 0 {
            let id = Uuid::new_v4().to_string();
            self.conn
                .execute(
                    "INSERT INTO permissions (id, url, permission, type, media_types)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, hostname, permission, decision.as_i64(), media_types],
                )
                .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    /// Every stored decision, ordered by hostname.
    pub fn list_permissions(&self) -> Result<Vec<PermissionRecord>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, permission, type, media_types FROM permissions ORDER BY url")
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let value: i64 = row.get(2)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    value,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (url, permission, value, media_types) =
                row.map_err(|e| StorageError::DatabaseError(e.to_string()))?;
            if let Some(decision) = PermissionDecision::from_i64(value) {
                records.push(PermissionRecord {
                    url,
                    permission,
                    decision,
                    media_types,
                });
            }
        }
        Ok(records)
    }

    /// Drops every stored decision.
    pub fn clear_permissions(&mut self) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM permissions", [])
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
