//! Start the Vitis API server.

use crate::auth::TokenSigner;
use crate::report::DEFAULT_BASE_URL;
use crate::rest::{self, ApiState};
use crate::retrieve::Retriever;
use crate::scrape::fetch::{Fetcher, DEFAULT_TIMEOUT};
use crate::store::{self, SnapshotStore, UserStore};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn run(port: u16, data_dir: Option<PathBuf>, base_url: Option<String>) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(store::default_data_dir);
    let snapshots = Arc::new(SnapshotStore::open(&data_dir.join("snapshots.db"))?);
    let users = UserStore::open(&data_dir.join("users.db"))?;
    let signer = TokenSigner::from_env()?;
    let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let retriever = Retriever::new(Fetcher::new(DEFAULT_TIMEOUT), snapshots, base_url);
    let state = Arc::new(ApiState {
        retriever,
        users,
        signer,
    });

    info!(
        "starting vitis v{} (data dir: {})",
        env!("CARGO_PKG_VERSION"),
        data_dir.display()
    );
    rest::serve(port, state).await
}
