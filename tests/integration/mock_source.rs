//! Mock race data source for integration testing.
//!
//! Provides a deterministic `RaceDataSource` implementation holding
//! markets, runners, and books in memory, with switches to make the
//! whole source or individual books fail.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use racecard::platforms::{MarketFilter, RaceDataSource};
use racecard::types::*;

/// A mock race data source for deterministic testing.
pub struct MockSource {
    name: String,
    markets: Vec<MarketSummary>,
    runners: HashMap<String, Vec<RunnerDescription>>,
    books: HashMap<String, MarketBook>,
    /// Markets whose book lookup fails.
    broken_books: Arc<Mutex<HashSet<String>>>,
    /// If set, all operations will return this error.
    force_error: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

pub fn runner(id: SelectionId, name: &str, cloth: &str, jockey: Option<&str>) -> RunnerDescription {
    let mut metadata = HashMap::new();
    metadata.insert("CLOTH_NUMBER".to_string(), Some(cloth.to_string()));
    metadata.insert("JOCKEY_NAME".to_string(), jockey.map(str::to_string));
    RunnerDescription {
        selection_id: id,
        runner_name: name.to_string(),
        metadata,
    }
}

pub fn book_runner(
    id: SelectionId,
    status: RunnerStatus,
    position: Option<u32>,
    price: Option<f64>,
) -> BookRunner {
    BookRunner {
        selection_id: id,
        status,
        position,
        placement: None,
        best_back_price: price,
    }
}

impl MockSource {
    /// An empty source.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            markets: Vec::new(),
            runners: HashMap::new(),
            books: HashMap::new(),
            broken_books: Arc::new(Mutex::new(HashSet::new())),
            force_error: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a race with its runners and (optionally) its book.
    pub fn with_race(
        mut self,
        market: MarketSummary,
        runners: Vec<RunnerDescription>,
        book: Option<MarketBook>,
    ) -> Self {
        let id = market.market_id.clone();
        self.runners.insert(id.clone(), runners);
        if let Some(b) = book {
            self.books.insert(id, b);
        }
        self.markets.push(market);
        self
    }

    /// A race day around `now`: one finished race with an explicit
    /// winner, one finished race resolved by elimination, and one
    /// upcoming race with a non-runner.
    pub fn race_day(now: DateTime<Utc>) -> Self {
        let market = |id: &str, venue: &str, offset_mins: i64| MarketSummary {
            market_id: id.to_string(),
            start_time: (now + Duration::minutes(offset_mins)).into(),
            venue: Some(venue.to_string()),
            event_name: None,
            market_name: "1m Hcap".to_string(),
        };

        Self::new("mock")
            .with_race(
                market("1.300", "York", 45),
                vec![
                    runner(31, "Stradivarius", "1", Some("F Dettori")),
                    runner(32, "Enable", "2", None),
                    runner(33, "Crystal Ocean", "3", Some("W Buick")),
                ],
                Some(MarketBook {
                    market_id: "1.300".to_string(),
                    status: MarketStatus::Open,
                    runners: vec![
                        book_runner(31, RunnerStatus::Active, None, Some(4.0)),
                        book_runner(32, RunnerStatus::Removed, None, Some(1.8)),
                        book_runner(33, RunnerStatus::Active, None, Some(2.2)),
                    ],
                }),
            )
            .with_race(
                market("1.100", "Ascot", -120),
                vec![
                    runner(11, "Golden Horn", "1", Some("F Dettori")),
                    runner(12, "Jack Hobbs", "2", Some("W Buick")),
                ],
                Some(MarketBook {
                    market_id: "1.100".to_string(),
                    status: MarketStatus::Closed,
                    runners: vec![
                        book_runner(11, RunnerStatus::Winner, Some(1), Some(3.0)),
                        book_runner(12, RunnerStatus::Loser, Some(2), Some(2.5)),
                    ],
                }),
            )
            .with_race(
                market("1.200", "Newbury", -30),
                vec![
                    runner(21, "Kingman", "1", Some("J Doyle")),
                    runner(22, "Night Of Thunder", "2", None),
                    runner(23, "Australia", "3", None),
                ],
                Some(MarketBook {
                    market_id: "1.200".to_string(),
                    status: MarketStatus::Closed,
                    runners: vec![
                        book_runner(21, RunnerStatus::Loser, Some(3), Some(1.9)),
                        book_runner(22, RunnerStatus::Active, None, Some(5.0)),
                        book_runner(23, RunnerStatus::Removed, Some(1), None),
                    ],
                }),
            )
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// Make the book lookup for one market fail.
    pub fn break_book(&self, market_id: &str) {
        self.broken_books.lock().unwrap().insert(market_id.to_string());
    }

    /// Every call made so far, as `"<method>:<market_id>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(())
    }
}

#[async_trait]
impl RaceDataSource for MockSource {
    async fn list_markets(&self, filter: &MarketFilter) -> Result<Vec<MarketSummary>> {
        self.check("list_markets".to_string())?;
        Ok(self
            .markets
            .iter()
            .filter(|m| filter.allows_market_id(&m.market_id))
            .take(filter.max_results)
            .cloned()
            .collect())
    }

    async fn runner_descriptions(&self, market_id: &str) -> Result<Vec<RunnerDescription>> {
        self.check(format!("runner_descriptions:{market_id}"))?;
        self.runners
            .get(market_id)
            .cloned()
            .ok_or_else(|| RacecardError::MarketNotFound(market_id.to_string()).into())
    }

    async fn market_book(&self, market_id: &str) -> Result<Option<MarketBook>> {
        self.check(format!("market_book:{market_id}"))?;
        if self.broken_books.lock().unwrap().contains(market_id) {
            return Err(anyhow!("Book request timed out for {market_id}"));
        }
        Ok(self.books.get(market_id).cloned())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use racecard::config::FeedConfig;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).unwrap()
    }

    fn filter() -> MarketFilter {
        MarketFilter::for_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), &FeedConfig::default())
    }

    #[tokio::test]
    async fn test_mock_lists_markets() {
        let source = MockSource::race_day(now());
        let markets = source.list_markets(&filter()).await.unwrap();
        assert_eq!(markets.len(), 3);

        let only = filter().with_market_ids(vec!["1.200".into()]);
        let markets = source.list_markets(&only).await.unwrap();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].course(), "Newbury");
    }

    #[tokio::test]
    async fn test_mock_unknown_market() {
        let source = MockSource::race_day(now());
        let err = source.runner_descriptions("1.999").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(source.market_book("1.999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let source = MockSource::race_day(now());
        source.set_error("simulated feed outage");

        assert!(source.list_markets(&filter()).await.is_err());
        assert!(source.runner_descriptions("1.100").await.is_err());
        assert!(source.market_book("1.100").await.is_err());

        source.clear_error();
        assert!(source.list_markets(&filter()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_broken_book() {
        let source = MockSource::race_day(now());
        source.break_book("1.100");
        assert!(source.market_book("1.100").await.is_err());
        assert!(source.market_book("1.200").await.unwrap().is_some());
        assert_eq!(source.calls(), vec!["market_book:1.100", "market_book:1.200"]);
    }
}
