//! One-shot report fetch, printed as JSON.
//!
//! Uses the same retrieval pipeline as the server, including the
//! snapshot fallback, so an offline run replays the last stored data.

use crate::report::{ReportKind, ReportQuery, DEFAULT_BASE_URL};
use crate::retrieve::Retriever;
use crate::scrape::fetch::{Fetcher, DEFAULT_TIMEOUT};
use crate::store::{self, SnapshotStore};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run(
    kind: ReportKind,
    year: i32,
    sub_option: Option<u8>,
    data_dir: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<()> {
    let query = ReportQuery::new(kind, year, sub_option).context("invalid report parameters")?;

    let data_dir = data_dir.unwrap_or_else(store::default_data_dir);
    let snapshots = Arc::new(SnapshotStore::open(&data_dir.join("snapshots.db"))?);
    let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let retriever = Retriever::new(Fetcher::new(DEFAULT_TIMEOUT), snapshots, base_url);

    let sections = retriever
        .retrieve(&query)
        .await
        .context("no live or cached data for this report")?;

    println!("{}", serde_json::to_string_pretty(&sections)?);
    Ok(())
}
