//! Data-source integrations.
//!
//! Defines the `RaceDataSource` trait, the boundary between the
//! resolution engine and whatever supplies market, runner, and book
//! snapshots. Provided implementation:
//! - Betfair replay: recorded `listMarketCatalogue` / `listMarketBook`
//!   responses read from disk

pub mod betfair;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::config::FeedConfig;
use crate::types::{MarketBook, MarketSummary, RunnerDescription};

/// Abstraction over race data sources.
///
/// Implementors return snapshots only; the engine never asks a source to
/// refresh, retry, or cache. Selection ids must be stable join keys
/// between `runner_descriptions` and `market_book` for the same market.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RaceDataSource: Send + Sync {
    /// List the markets matching a filter.
    async fn list_markets(&self, filter: &MarketFilter) -> Result<Vec<MarketSummary>>;

    /// Runner descriptions (with metadata) for one market.
    async fn runner_descriptions(&self, market_id: &str) -> Result<Vec<RunnerDescription>>;

    /// Book snapshot for one market, if the source has one.
    async fn market_book(&self, market_id: &str) -> Result<Option<MarketBook>>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Market filter
// ---------------------------------------------------------------------------

/// Start-time window, inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// The whole UTC calendar day: 00:00:00 to 23:59:59.999999.
    pub fn for_date(date: NaiveDate) -> Self {
        let from = date.and_time(NaiveTime::MIN).and_utc();
        let to = from + chrono::Duration::days(1) - chrono::Duration::microseconds(1);
        Self { from, to }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }
}

/// Market selection criteria, shaped like a Betfair market filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFilter {
    pub event_type_ids: Vec<String>,
    pub market_type_codes: Vec<String>,
    pub market_countries: Vec<String>,
    pub market_start_time: TimeRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_ids: Option<Vec<String>>,
    #[serde(skip)]
    pub max_results: usize,
}

impl MarketFilter {
    /// Races of the configured type and countries on `date`.
    pub fn for_date(date: NaiveDate, feed: &FeedConfig) -> Self {
        Self {
            event_type_ids: vec![feed.event_type_id.clone()],
            market_type_codes: vec![feed.market_type.clone()],
            market_countries: feed.countries.clone(),
            market_start_time: TimeRange::for_date(date),
            market_ids: None,
            max_results: feed.max_results,
        }
    }

    /// Narrow the filter to specific markets.
    pub fn with_market_ids(mut self, ids: Vec<String>) -> Self {
        self.max_results = self.max_results.min(ids.len().max(1));
        self.market_ids = Some(ids);
        self
    }

    /// Whether a market id passes the id restriction (if any).
    pub fn allows_market_id(&self, market_id: &str) -> bool {
        self.market_ids
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|id| id == market_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
