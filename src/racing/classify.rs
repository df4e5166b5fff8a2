//! Upcoming / finished partition of a race day.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::MarketSummary;

/// Whether a race is still to run, relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RacePhase {
    Upcoming,
    Finished,
}

impl RacePhase {
    /// Phase of a race starting at `start`, observed at `now`.
    /// A race starting exactly at `now` counts as finished.
    pub fn at(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if start > now {
            RacePhase::Upcoming
        } else {
            RacePhase::Finished
        }
    }
}

/// Result of [`classify`]: two disjoint lists, each in start order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifiedMarkets {
    pub upcoming: Vec<MarketSummary>,
    pub finished: Vec<MarketSummary>,
}

impl ClassifiedMarkets {
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a market in either list, with its phase.
    pub fn find(&self, market_id: &str) -> Option<(&MarketSummary, RacePhase)> {
        self.upcoming
            .iter()
            .map(|m| (m, RacePhase::Upcoming))
            .chain(self.finished.iter().map(|m| (m, RacePhase::Finished)))
            .find(|(m, _)| m.market_id == market_id)
    }

    /// All markets with their phase, upcoming first.
    pub fn iter(&self) -> impl Iterator<Item = (&MarketSummary, RacePhase)> {
        self.upcoming
            .iter()
            .map(|m| (m, RacePhase::Upcoming))
            .chain(self.finished.iter().map(|m| (m, RacePhase::Finished)))
    }
}

/// Partition markets into upcoming (start strictly after `now`) and
/// finished, each sorted ascending by start instant. The sort is stable,
/// so markets sharing a start keep their input order.
pub fn classify(markets: Vec<MarketSummary>, now: DateTime<Utc>) -> ClassifiedMarkets {
    let (mut upcoming, mut finished): (Vec<_>, Vec<_>) = markets
        .into_iter()
        .partition(|m| RacePhase::at(m.start_time.instant(), now) == RacePhase::Upcoming);

    upcoming.sort_by_key(|m| m.start_time.instant());
    finished.sort_by_key(|m| m.start_time.instant());

    ClassifiedMarkets { upcoming, finished }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
