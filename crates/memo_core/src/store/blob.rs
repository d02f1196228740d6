//! Single-file SQLite key/value backend.
//!
//! # Responsibility
//! - Keep every record as one row of `memo_records` inside a single SQLite
//!   file, keyed exactly like the directory backend.
//!
//! # Invariants
//! - The connection is only held after migrations succeeded.
//! - Writes upsert by key; deletes of missing keys change nothing.

use super::{
    ensure_flat_key, BoxedPicker, NoLocation, RawRecord, StoreBackend, StoreError, StoreResult,
};
use crate::db::{open_db, open_db_in_memory};
use log::{debug, info};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// SQLite-backed record store.
pub struct SqliteBlobBackend {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    picker: BoxedPicker,
}

impl SqliteBlobBackend {
    /// Creates a backend with no database; `request_access` consults `picker`.
    pub fn new(picker: BoxedPicker) -> Self {
        Self {
            conn: None,
            path: None,
            picker,
        }
    }

    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut backend = Self::new(Box::new(NoLocation));
        backend.select(path.into())?;
        Ok(backend)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Some(open_db_in_memory()?),
            path: None,
            picker: Box::new(NoLocation),
        })
    }

    fn select(&mut self, path: PathBuf) -> StoreResult<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                action: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = open_db(&path)?;
        info!(
            "event=store_location module=store status=ok backend=sqlite path={}",
            path.display()
        );
        self.conn = Some(conn);
        self.path = Some(path);
        Ok(())
    }

    fn require_conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::NotReady)
    }
}

impl StoreBackend for SqliteBlobBackend {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn is_ready(&self) -> bool {
        self.conn.is_some()
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn request_access(&mut self) -> StoreResult<bool> {
        if self.is_ready() {
            return Ok(true);
        }
        match self.picker.pick_location() {
            Some(path) => {
                self.select(path)?;
                Ok(true)
            }
            None => {
                info!("event=store_location module=store status=cancelled backend=sqlite");
                Ok(false)
            }
        }
    }

    fn list(&self) -> StoreResult<Vec<RawRecord>> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare("SELECT record_key, content FROM memo_records;")?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(RawRecord {
                key: row.get("record_key")?,
                text: row.get("content")?,
            });
        }

        debug!(
            "event=store_list module=store status=ok backend=sqlite count={}",
            records.len()
        );
        Ok(records)
    }

    fn write(&mut self, key: &str, text: &str) -> StoreResult<()> {
        let conn = self.require_conn()?;
        ensure_flat_key(key)?;
        conn.execute(
            "INSERT INTO memo_records (record_key, content, written_at)
             VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             ON CONFLICT(record_key) DO UPDATE SET
                content = excluded.content,
                written_at = excluded.written_at;",
            params![key, text],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        let conn = self.require_conn()?;
        ensure_flat_key(key)?;
        conn.execute("DELETE FROM memo_records WHERE record_key = ?1;", [key])?;
        Ok(())
    }
}
