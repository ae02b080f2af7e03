//! Retrieval orchestrator: try live, else cached, else unavailable.
//!
//! The single resilience mechanism of the system. Each resolved URL runs
//! its own fetch/extract/store cycle; when the live path fails for a URL,
//! the snapshot lookup uses that same URL's key, never a neighbour's.
//! A partial upstream outage therefore shrinks a fan-out response
//! instead of killing it.

use crate::error::{ScrapeError, Unavailable};
use crate::report::{ReportQuery, ResolvedUrl};
use crate::scrape::{category, extract, DataTable, Fetcher, PageExtract};
use crate::store::{Snapshot, SnapshotStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a report section's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Cached,
}

/// The per-URL result unit: one scraped (or cache-served) report page.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub source: Provenance,
    pub url: String,
    pub year: i32,
    pub category: String,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub table: DataTable,
}

impl ReportSection {
    fn live(target: &ResolvedUrl, category: String, extract: PageExtract) -> Self {
        Self {
            source: Provenance::Live,
            url: target.url.clone(),
            year: target.year,
            category,
            headings: extract.headings,
            paragraphs: extract.paragraphs,
            table: extract.table,
        }
    }

    fn cached(snapshot: Snapshot) -> Self {
        Self {
            source: Provenance::Cached,
            url: snapshot.url,
            year: snapshot.year,
            category: snapshot.category,
            headings: snapshot.extract.headings,
            paragraphs: snapshot.extract.paragraphs,
            table: snapshot.extract.table,
        }
    }
}

/// Composes the fetcher, extractor, category resolver and snapshot store.
pub struct Retriever {
    fetcher: Fetcher,
    snapshots: Arc<SnapshotStore>,
    base_url: String,
}

impl Retriever {
    pub fn new(fetcher: Fetcher, snapshots: Arc<SnapshotStore>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            snapshots,
            base_url: base_url.into(),
        }
    }

    /// Retrieve every page the query covers.
    ///
    /// Per URL: fresh fetch + extract + store on success (`Live`), stored
    /// snapshot on failure (`Cached`), nothing when neither exists. The
    /// aggregate keeps request order; an empty aggregate is
    /// [`Unavailable`].
    pub async fn retrieve(&self, query: &ReportQuery) -> Result<Vec<ReportSection>, Unavailable> {
        let targets = query.resolve(&self.base_url);
        let mut sections = Vec::with_capacity(targets.len());

        for target in &targets {
            match self.live(target, query).await {
                Ok(section) => sections.push(section),
                Err(err) => {
                    warn!(url = %target.url, error = %err, "live retrieval failed, trying snapshot");
                    match self.snapshots.get(&target.url, target.year) {
                        Ok(Some(snapshot)) => sections.push(ReportSection::cached(snapshot)),
                        Ok(None) => debug!(url = %target.url, "no snapshot for failed url"),
                        Err(err) => {
                            warn!(url = %target.url, error = %err, "snapshot lookup failed")
                        }
                    }
                }
            }
        }

        if sections.is_empty() {
            return Err(Unavailable);
        }
        Ok(sections)
    }

    /// The live path for one URL: fetch, extract, resolve the category
    /// label, persist, tag as fresh.
    async fn live(
        &self,
        target: &ResolvedUrl,
        query: &ReportQuery,
    ) -> Result<ReportSection, ScrapeError> {
        let html = self.fetcher.fetch(&target.url).await?;
        let extracted = extract::extract(&html)?;

        // Label resolution is metadata only; it cannot fail this path.
        let category = match query.kind.static_category() {
            Some(label) => label.to_string(),
            None => category::resolve(&self.fetcher, &target.url).await,
        };

        self.snapshots
            .upsert(&target.url, target.year, &category, &extracted)
            .map_err(ScrapeError::Store)?;

        Ok(ReportSection::live(target, category, extracted))
    }
}
