//! Snapshot store: the last successful extraction per (url, year).
//!
//! One row per key, overwritten in place on every refresh. The store
//! never deletes; retention is out of scope.

use crate::scrape::extract::PageExtract;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Stored copy of the last successful extraction for one page address.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub url: String,
    pub year: i32,
    pub category: String,
    pub extract: PageExtract,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed store keyed by (url, year).
///
/// `upsert` is a full overwrite, so concurrent writers to the same key
/// serialize behind the connection lock and the last completed write
/// wins. Writers to different keys never interfere.
pub struct SnapshotStore {
    db: Mutex<Connection>,
}

impl SnapshotStore {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("failed to open snapshot store: {}", path.display()))?;
        Self::init(db)
    }

    /// In-memory store for tests and one-shot CLI runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS snapshots (
                url        TEXT NOT NULL,
                year       INTEGER NOT NULL,
                category   TEXT NOT NULL DEFAULT '',
                headings   TEXT NOT NULL,
                paragraphs TEXT NOT NULL,
                data_table TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (url, year)
            );",
        )
        .context("failed to create snapshots table")?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// Insert or overwrite the snapshot for `(url, year)`.
    ///
    /// Safe to call repeatedly with identical arguments: the stored
    /// category and extraction are unchanged, only `updated_at` moves.
    pub fn upsert(&self, url: &str, year: i32, category: &str, extract: &PageExtract) -> Result<()> {
        let headings = serde_json::to_string(&extract.headings)?;
        let paragraphs = serde_json::to_string(&extract.paragraphs)?;
        let table = serde_json::to_string(&extract.table)?;
        let updated_at = Utc::now().to_rfc3339();

        let db = self.lock()?;
        db.execute(
            "INSERT OR REPLACE INTO snapshots
                (url, year, category, headings, paragraphs, data_table, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![url, year, category, headings, paragraphs, table, updated_at],
        )
        .context("failed to upsert snapshot")?;
        Ok(())
    }

    /// Point lookup by key.
    pub fn get(&self, url: &str, year: i32) -> Result<Option<Snapshot>> {
        let db = self.lock()?;
        let mut stmt = db.prepare(
            "SELECT category, headings, paragraphs, data_table, updated_at
             FROM snapshots WHERE url = ?1 AND year = ?2",
        )?;
        let row = stmt.query_row(params![url, year], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        });

        match row {
            Ok((category, headings, paragraphs, table, updated_at)) => {
                let extract = PageExtract {
                    headings: serde_json::from_str(&headings)
                        .context("corrupt headings column")?,
                    paragraphs: serde_json::from_str(&paragraphs)
                        .context("corrupt paragraphs column")?,
                    table: serde_json::from_str(&table).context("corrupt data_table column")?,
                };
                let updated_at = DateTime::parse_from_rfc3339(&updated_at)
                    .context("corrupt updated_at column")?
                    .with_timezone(&Utc);
                Ok(Some(Snapshot {
                    url: url.to_string(),
                    year,
                    category,
                    extract,
                    updated_at,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> Result<usize> {
        let db = self.lock()?;
        let count: i64 = db.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))
    }
}
