//! User store backing the authentication layer.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Registered API users, keyed by username.
pub struct UserStore {
    db: Mutex<Connection>,
}

impl UserStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("failed to open user store: {}", path.display()))?;
        Self::init(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                username      TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );",
        )
        .context("failed to create users table")?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// Insert a new user. Returns `false` when the username is taken.
    pub fn create(&self, username: &str, password_hash: &str) -> Result<bool> {
        let db = self.lock()?;
        let inserted = db.execute(
            "INSERT OR IGNORE INTO users (username, password_hash, created_at)
             VALUES (?1, ?2, ?3)",
            params![username, password_hash, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Stored password hash for `username`, if registered.
    pub fn lookup(&self, username: &str) -> Result<Option<String>> {
        let db = self.lock()?;
        let mut stmt = db.prepare("SELECT password_hash FROM users WHERE username = ?1")?;
        match stmt.query_row(params![username], |row| row.get::<_, String>(0)) {
            Ok(hash) => Ok(Some(hash)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| anyhow!("user store lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(store.create("alice", "hash-a").unwrap());
        assert_eq!(store.lookup("alice").unwrap().as_deref(), Some("hash-a"));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(store.create("alice", "hash-a").unwrap());
        assert!(!store.create("alice", "hash-b").unwrap());
        // original hash untouched
        assert_eq!(store.lookup("alice").unwrap().as_deref(), Some("hash-a"));
    }

    #[test]
    fn test_lookup_unknown_user() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(store.lookup("nobody").unwrap().is_none());
    }
}
