//! Betfair Exchange replay.
//!
//! Decodes recorded Betfair Exchange API responses and serves them as race
//! snapshots. A replay directory holds:
//!
//! - `catalogue.json`: a `listMarketCatalogue` response (array), recorded
//!   with the `EVENT`, `EVENT_TYPE`, `MARKET_DESCRIPTION`,
//!   `MARKET_START_TIME`, `RUNNER_DESCRIPTION`, and `RUNNER_METADATA`
//!   projections
//! - `books.json` (optional): a `listMarketBook` response (array),
//!   recorded with `EX_BEST_OFFERS` price data
//!
//! Runner lines in a book may also carry `position` / `placement` result
//! fields; Betfair itself only reports `status`, so these are optional.
//!
//! The wire structs mirror Betfair's camelCase JSON and are converted to
//! the crate's snapshot types at this boundary.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{MarketFilter, RaceDataSource};
use crate::types::{
    self, BookRunner, MarketStatus, MarketSummary, RacecardError, RunnerDescription,
    RunnerStatus, StartTime,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const PLATFORM_NAME: &str = "betfair-replay";

const CATALOGUE_FILE: &str = "catalogue.json";
const BOOKS_FILE: &str = "books.json";

// ---------------------------------------------------------------------------
// Betfair API types
// ---------------------------------------------------------------------------

/// Market catalogue entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCatalogue {
    pub market_id: String,
    pub market_name: String,
    #[serde(default)]
    pub description: Option<MarketDescription>,
    #[serde(default)]
    pub event: Option<EventInfo>,
    #[serde(default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub market_start_time: Option<String>,
    #[serde(default)]
    pub runners: Vec<RunnerCatalogue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDescription {
    #[serde(default)]
    pub market_type: Option<String>,
    #[serde(default)]
    pub betting_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Event type (top-level sport).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerCatalogue {
    pub selection_id: u64,
    pub runner_name: String,
    #[serde(default)]
    pub sort_priority: Option<u32>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Option<String>>>,
}

/// Market book (status, runner states, prices).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBook {
    pub market_id: String,
    #[serde(default)]
    pub status: Option<MarketStatus>,
    #[serde(default)]
    pub runners: Vec<RunnerBook>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerBook {
    pub selection_id: u64,
    #[serde(default)]
    pub status: Option<RunnerStatus>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub placement: Option<u32>,
    #[serde(default)]
    pub last_price_traded: Option<f64>,
    #[serde(default)]
    pub ex: Option<ExchangePrices>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePrices {
    #[serde(default)]
    pub available_to_back: Vec<PriceSize>,
    #[serde(default)]
    pub available_to_lay: Vec<PriceSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceSize {
    pub price: f64,
    pub size: f64,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

impl MarketCatalogue {
    /// Whether this catalogue entry passes the filter. Fields the
    /// recording lacks do not exclude a market; the start time does.
    pub fn matches(&self, filter: &MarketFilter) -> bool {
        let in_list = |list: &[String], value: Option<&str>| {
            list.is_empty() || value.map_or(true, |v| list.iter().any(|l| l == v))
        };

        let start_ok = self
            .start_time()
            .is_some_and(|t| filter.market_start_time.contains(t.instant()));

        filter.allows_market_id(&self.market_id)
            && start_ok
            && in_list(
                &filter.event_type_ids,
                self.event_type.as_ref().map(|et| et.id.as_str()),
            )
            && in_list(
                &filter.market_type_codes,
                self.description.as_ref().and_then(|d| d.market_type.as_deref()),
            )
            && in_list(
                &filter.market_countries,
                self.event.as_ref().and_then(|e| e.country_code.as_deref()),
            )
    }

    fn start_time(&self) -> Option<StartTime> {
        self.market_start_time.as_deref().and_then(StartTime::parse)
    }

    /// Convert to a market summary. Entries without a readable start time
    /// cannot be classified and are dropped.
    pub fn to_summary(&self) -> Option<MarketSummary> {
        let Some(start_time) = self.start_time() else {
            warn!(
                market_id = %self.market_id,
                start = ?self.market_start_time,
                "Catalogue entry has no usable start time, skipping"
            );
            return None;
        };

        Some(MarketSummary {
            market_id: self.market_id.clone(),
            start_time,
            venue: self.event.as_ref().and_then(|e| e.venue.clone()),
            event_name: self.event.as_ref().and_then(|e| e.name.clone()),
            market_name: self.market_name.clone(),
        })
    }

    /// Runner descriptions in catalogue order.
    pub fn runner_descriptions(&self) -> Vec<RunnerDescription> {
        self.runners
            .iter()
            .map(|r| RunnerDescription {
                selection_id: r.selection_id,
                runner_name: r.runner_name.clone(),
                metadata: r.metadata.clone().unwrap_or_default(),
            })
            .collect()
    }
}

impl RunnerBook {
    /// Best available back price: the head of `availableToBack`.
    pub fn best_back_price(&self) -> Option<f64> {
        self.ex
            .as_ref()
            .and_then(|ex| ex.available_to_back.first())
            .map(|p| p.price)
    }
}

impl From<&MarketBook> for types::MarketBook {
    fn from(book: &MarketBook) -> Self {
        types::MarketBook {
            market_id: book.market_id.clone(),
            status: book.status.unwrap_or_default(),
            runners: book
                .runners
                .iter()
                .map(|r| BookRunner {
                    selection_id: r.selection_id,
                    status: r.status.unwrap_or_default(),
                    position: r.position,
                    placement: r.placement,
                    best_back_price: r.best_back_price(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Replay source
// ---------------------------------------------------------------------------

/// Serves recorded Betfair responses as a race data source.
#[derive(Debug)]
pub struct BetfairReplay {
    origin: Option<PathBuf>,
    catalogues: Vec<MarketCatalogue>,
    books: HashMap<String, MarketBook>,
}

impl BetfairReplay {
    /// Load a replay directory. `catalogue.json` is required,
    /// `books.json` is optional.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let catalogue_path = dir.join(CATALOGUE_FILE);
        let books_path = dir.join(BOOKS_FILE);

        let catalogue_json = tokio::fs::read_to_string(&catalogue_path)
            .await
            .with_context(|| format!("Failed to read {}", catalogue_path.display()))?;

        let books_json = if tokio::fs::try_exists(&books_path).await.unwrap_or(false) {
            Some(
                tokio::fs::read_to_string(&books_path)
                    .await
                    .with_context(|| format!("Failed to read {}", books_path.display()))?,
            )
        } else {
            debug!(path = %books_path.display(), "No market books recorded");
            None
        };

        let mut replay = Self::from_json(&catalogue_json, books_json.as_deref())
            .with_context(|| format!("Failed to load replay from {}", dir.display()))?;
        replay.origin = Some(dir.to_path_buf());

        info!(
            path = %dir.display(),
            markets = replay.catalogues.len(),
            books = replay.books.len(),
            "Betfair replay loaded"
        );
        Ok(replay)
    }

    /// Build a replay from raw response bodies.
    pub fn from_json(catalogue_json: &str, books_json: Option<&str>) -> Result<Self> {
        let catalogues: Vec<MarketCatalogue> = serde_json::from_str(catalogue_json)
            .context("Failed to parse Betfair listMarketCatalogue response")?;

        let books: Vec<MarketBook> = match books_json {
            Some(json) => serde_json::from_str(json)
                .context("Failed to parse Betfair listMarketBook response")?,
            None => Vec::new(),
        };

        Ok(Self {
            origin: None,
            catalogues,
            books: books.into_iter().map(|b| (b.market_id.clone(), b)).collect(),
        })
    }

    /// Directory this replay was loaded from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    fn catalogue(&self, market_id: &str) -> Result<&MarketCatalogue> {
        self.catalogues
            .iter()
            .find(|c| c.market_id == market_id)
            .ok_or_else(|| RacecardError::MarketNotFound(market_id.to_string()).into())
    }
}

// ---------------------------------------------------------------------------
// RaceDataSource trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl RaceDataSource for BetfairReplay {
    async fn list_markets(&self, filter: &MarketFilter) -> Result<Vec<MarketSummary>> {
        debug!(
            filter = %serde_json::to_string(filter).unwrap_or_default(),
            "Listing recorded markets"
        );

        let markets: Vec<MarketSummary> = self
            .catalogues
            .iter()
            .filter(|c| c.matches(filter))
            .filter_map(MarketCatalogue::to_summary)
            .take(filter.max_results)
            .collect();

        info!(
            recorded = self.catalogues.len(),
            matched = markets.len(),
            "Betfair replay market listing"
        );
        Ok(markets)
    }

    async fn runner_descriptions(&self, market_id: &str) -> Result<Vec<RunnerDescription>> {
        Ok(self.catalogue(market_id)?.runner_descriptions())
    }

    async fn market_book(&self, market_id: &str) -> Result<Option<types::MarketBook>> {
        let book = self.books.get(market_id).map(types::MarketBook::from);
        if book.is_none() {
            debug!(market_id, "No book recorded for market");
        }
        Ok(book)
    }

    fn name(&self) -> &str {
        PLATFORM_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
