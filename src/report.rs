//! Report catalogue for the VitiBrasil source site.
//!
//! Every report family maps to a fixed `opcao` code; fan-out families
//! additionally carry numbered `subopcao` pages. A validated
//! [`ReportQuery`] resolves deterministically into the concrete page
//! addresses it covers: identical queries always yield identical URLs.

use crate::error::QueryError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Default base address of the upstream report pages.
pub const DEFAULT_BASE_URL: &str = "http://vitibrasil.cnpuv.embrapa.br/index.php";

/// One of the five statistical report families published by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Production,
    Processing,
    Commercialization,
    Import,
    Export,
}

impl ReportKind {
    /// `opcao` query value selecting this report family on the source site.
    pub fn option_code(self) -> &'static str {
        match self {
            ReportKind::Production => "opt_02",
            ReportKind::Processing => "opt_03",
            ReportKind::Commercialization => "opt_04",
            ReportKind::Import => "opt_05",
            ReportKind::Export => "opt_06",
        }
    }

    /// Years for which the source publishes this report.
    pub fn year_range(self) -> RangeInclusive<i32> {
        match self {
            ReportKind::Import | ReportKind::Export => 1970..=2024,
            _ => 1970..=2023,
        }
    }

    /// Number of sibling sub-category pages. Zero means the report is a
    /// single page.
    pub fn sub_option_count(self) -> u8 {
        match self {
            ReportKind::Processing => 4,
            ReportKind::Import => 5,
            ReportKind::Export => 4,
            _ => 0,
        }
    }

    pub fn fans_out(self) -> bool {
        self.sub_option_count() > 0
    }

    /// Category label for single-page reports. Fan-out reports resolve
    /// their label from the page itself.
    pub fn static_category(self) -> Option<&'static str> {
        match self {
            ReportKind::Production => Some("producao"),
            ReportKind::Commercialization => Some("comercializacao"),
            _ => None,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::Production => "production",
            ReportKind::Processing => "processing",
            ReportKind::Commercialization => "commercialization",
            ReportKind::Import => "import",
            ReportKind::Export => "export",
        };
        f.write_str(name)
    }
}

/// A validated request for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub kind: ReportKind,
    pub year: i32,
    /// 1-based sub-category selector. `None` requests every sub-category
    /// of a fan-out report.
    pub sub_option: Option<u8>,
}

impl ReportQuery {
    /// Build a query, rejecting out-of-range years and sub-category
    /// selectors up front.
    pub fn new(kind: ReportKind, year: i32, sub_option: Option<u8>) -> Result<Self, QueryError> {
        let range = kind.year_range();
        if !range.contains(&year) {
            return Err(QueryError::YearOutOfRange {
                kind,
                year,
                min: *range.start(),
                max: *range.end(),
            });
        }
        if let Some(index) = sub_option {
            let count = kind.sub_option_count();
            if count == 0 {
                return Err(QueryError::NoSubOptions { kind });
            }
            if index == 0 || index > count {
                return Err(QueryError::SubOptionOutOfRange { kind, index, count });
            }
        }
        Ok(Self { kind, year, sub_option })
    }

    /// Expand into the concrete page addresses this query covers, in
    /// catalogue order.
    pub fn resolve(&self, base_url: &str) -> Vec<ResolvedUrl> {
        let subs: Vec<Option<u8>> = match (self.kind.sub_option_count(), self.sub_option) {
            (0, _) => vec![None],
            (_, Some(index)) => vec![Some(index)],
            (count, None) => (1..=count).map(Some).collect(),
        };
        subs.into_iter()
            .map(|sub| ResolvedUrl {
                url: page_url(base_url, self.kind, sub, self.year),
                year: self.year,
            })
            .collect()
    }
}

/// A single concrete page address produced from a [`ReportQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub year: i32,
}

fn page_url(base: &str, kind: ReportKind, sub: Option<u8>, year: i32) -> String {
    // Parameter order matches the upstream site's own links.
    match sub {
        Some(index) => format!(
            "{base}?subopcao=subopt_{index:02}&opcao={}&ano={year}",
            kind.option_code()
        ),
        None => format!("{base}?opcao={}&ano={year}", kind.option_code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_url_shape() {
        let query = ReportQuery::new(ReportKind::Production, 2020, None).unwrap();
        let urls = query.resolve(DEFAULT_BASE_URL);
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0].url,
            "http://vitibrasil.cnpuv.embrapa.br/index.php?opcao=opt_02&ano=2020"
        );
        assert_eq!(urls[0].year, 2020);
    }

    #[test]
    fn test_fanout_resolves_all_sub_pages_in_order() {
        let query = ReportQuery::new(ReportKind::Import, 2024, None).unwrap();
        let urls = query.resolve(DEFAULT_BASE_URL);
        assert_eq!(urls.len(), 5);
        for (i, resolved) in urls.iter().enumerate() {
            assert_eq!(
                resolved.url,
                format!(
                    "http://vitibrasil.cnpuv.embrapa.br/index.php?subopcao=subopt_{:02}&opcao=opt_05&ano=2024",
                    i + 1
                )
            );
        }
    }

    #[test]
    fn test_sub_option_selects_one_page() {
        let query = ReportQuery::new(ReportKind::Processing, 1995, Some(3)).unwrap();
        let urls = query.resolve(DEFAULT_BASE_URL);
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0].url,
            "http://vitibrasil.cnpuv.embrapa.br/index.php?subopcao=subopt_03&opcao=opt_03&ano=1995"
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let query = ReportQuery::new(ReportKind::Export, 2000, None).unwrap();
        assert_eq!(query.resolve(DEFAULT_BASE_URL), query.resolve(DEFAULT_BASE_URL));
    }

    #[test]
    fn test_year_bounds_per_kind() {
        assert!(ReportQuery::new(ReportKind::Production, 1970, None).is_ok());
        assert!(ReportQuery::new(ReportKind::Production, 2023, None).is_ok());
        assert!(ReportQuery::new(ReportKind::Production, 2024, None).is_err());
        assert!(ReportQuery::new(ReportKind::Export, 2024, None).is_ok());
        assert!(ReportQuery::new(ReportKind::Export, 2025, None).is_err());
        assert!(ReportQuery::new(ReportKind::Import, 1969, None).is_err());
    }

    #[test]
    fn test_sub_option_bounds() {
        assert!(ReportQuery::new(ReportKind::Processing, 2000, Some(4)).is_ok());
        assert!(ReportQuery::new(ReportKind::Processing, 2000, Some(5)).is_err());
        assert!(ReportQuery::new(ReportKind::Processing, 2000, Some(0)).is_err());
        assert!(ReportQuery::new(ReportKind::Import, 2000, Some(5)).is_ok());
        // single-page kinds accept no selector at all
        assert!(ReportQuery::new(ReportKind::Production, 2000, Some(1)).is_err());
    }
}
