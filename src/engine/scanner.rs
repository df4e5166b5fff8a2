//! Race-day scanner.
//!
//! Lists a day's races from a data source, classifies them into upcoming
//! and finished, and builds a race card for each. Cards are independent:
//! each race's runners and book are fetched and resolved as its own
//! future, and a source failure on one race does not touch the others.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::platforms::{MarketFilter, RaceDataSource};
use crate::racing::{classify, ClassifiedMarkets, RaceCard, RacePhase};
use crate::types::{MarketSummary, RacecardError};

/// A classified race day, ready for card building.
#[derive(Debug, Clone)]
pub struct RaceDay {
    pub markets: ClassifiedMarkets,
    pub as_of: DateTime<Utc>,
}

/// Builds race days and race cards from a data source.
pub struct RaceScanner<S: RaceDataSource> {
    source: S,
}

impl<S: RaceDataSource> RaceScanner<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// List and classify the markets matching `filter` as of `now`.
    pub async fn scan(&self, filter: &MarketFilter, now: DateTime<Utc>) -> Result<RaceDay> {
        let markets = self.source.list_markets(filter).await?;
        let listed = markets.len();
        let classified = classify(markets, now);

        info!(
            source = self.source.name(),
            listed,
            upcoming = classified.upcoming.len(),
            finished = classified.finished.len(),
            "Race day classified"
        );

        Ok(RaceDay {
            markets: classified,
            as_of: now,
        })
    }

    /// Build the card for one race.
    pub async fn card(&self, market: &MarketSummary, phase: RacePhase) -> Result<RaceCard> {
        let (runners, book) = tokio::join!(
            self.source.runner_descriptions(&market.market_id),
            self.source.market_book(&market.market_id),
        );
        let runners = runners?;

        // A missing or failed book still yields a card with every runner
        let book = book.unwrap_or_else(|e| {
            warn!(market_id = %market.market_id, error = %e, "Market book unavailable");
            None
        });

        let card = RaceCard::build(market.clone(), &runners, book.as_ref(), phase);
        debug!(
            market_id = %market.market_id,
            runners = card.entries.len(),
            favourite = ?card.favourite,
            winner = ?card.winner.map(|w| w.selection_id),
            "Race card built"
        );
        Ok(card)
    }

    /// Build the card for a market on a scanned day.
    pub async fn card_by_id(&self, day: &RaceDay, market_id: &str) -> Result<RaceCard> {
        let (market, phase) = day
            .markets
            .find(market_id)
            .ok_or_else(|| RacecardError::MarketNotFound(market_id.to_string()))?;
        self.card(market, phase).await
    }

    /// Build every card on the day concurrently, upcoming races first.
    /// Races whose runners cannot be loaded are logged and left out.
    pub async fn cards(&self, day: &RaceDay) -> Vec<RaceCard> {
        let results = join_all(day.markets.iter().map(|(m, phase)| self.card(m, phase))).await;

        let total = results.len();
        let cards: Vec<RaceCard> = results
            .into_iter()
            .filter_map(|r| {
                r.map_err(|e| warn!(error = %e, "Race card failed, continuing"))
                    .ok()
            })
            .collect();

        info!(built = cards.len(), failed = total - cards.len(), "Race cards built");
        cards
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
