//! SQLite-backed persistence: report snapshots and API users.
//!
//! Snapshots and users live in separate database files so the scrape
//! path and the auth path never contend for the same connection.

pub mod snapshots;
pub mod users;

pub use snapshots::{Snapshot, SnapshotStore};
pub use users::UserStore;

use std::path::PathBuf;

/// Default data directory for the SQLite databases.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".vitis")
}
