//! Failure taxonomy for the retrieval pipeline.
//!
//! Transient failures (`FetchError`, `ExtractError`, store trouble during
//! the live path) are folded into [`ScrapeError`] and trigger the snapshot
//! fallback. [`Unavailable`] is terminal: neither a fresh result nor a
//! stored snapshot exists.

use crate::report::ReportKind;
use thiserror::Error;

/// Transport-level failure while fetching a report page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Structural failure while extracting a report page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The page carries no data table marker at all. Distinct from a
    /// present table with zero data rows, which is a valid result.
    #[error("data table marker not found in document")]
    TableMissing,
}

/// Any failure that prevents producing a fresh result for one URL.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("snapshot store: {0}")]
    Store(anyhow::Error),
}

/// Neither live retrieval nor any cached snapshot produced a result.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no live or cached data available for the requested report")]
pub struct Unavailable;

/// Rejected report parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("year {year} outside valid range {min}..={max} for {kind}")]
    YearOutOfRange {
        kind: ReportKind,
        year: i32,
        min: i32,
        max: i32,
    },
    #[error("sub-category {index} outside valid range 1..={count} for {kind}")]
    SubOptionOutOfRange { kind: ReportKind, index: u8, count: u8 },
    #[error("{kind} has no sub-categories")]
    NoSubOptions { kind: ReportKind },
}
