//! Market/runner resolution engine.
//!
//! Pure functions over a single snapshot of market, runner, and book data:
//! race classification, non-runner detection, favourite selection, and
//! winner resolution. [`RaceCard`] joins them into one record per race.

pub mod classify;
pub mod runners;
pub mod winner;

use serde::Serialize;
use std::fmt;

use crate::types::{MarketBook, MarketStatus, MarketSummary, RunnerDescription, RunnerInfo, SelectionId};
pub use classify::{classify, ClassifiedMarkets, RacePhase};
pub use runners::{build_runner_info, is_non_runner, non_runners, odds_by_selection, select_favourite};
pub use winner::{resolve_winner, WinnerResolution, WinnerSignal};

// ---------------------------------------------------------------------------
// Race card
// ---------------------------------------------------------------------------

/// One runner's line on a race card.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerEntry {
    pub info: RunnerInfo,
    pub odds: Option<f64>,
    pub non_runner: bool,
    pub favourite: bool,
    pub winner: bool,
}

impl RunnerEntry {
    /// Name with its status marker: winner, non-runner, or favourite.
    pub fn label(&self) -> String {
        if self.winner {
            format!("{} 🥇 Winner", self.info.name)
        } else if self.non_runner {
            format!("{} NR", self.info.name)
        } else if self.favourite {
            format!("{} 🔥", self.info.name)
        } else {
            self.info.name.clone()
        }
    }
}

impl fmt::Display for RunnerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} — Cloth #{}", self.label(), self.info.cloth_number)?;
        if self.info.jockey != crate::types::NOT_AVAILABLE {
            write!(f, " | Jockey: {}", self.info.jockey)?;
        }
        if self.info.trainer != crate::types::NOT_AVAILABLE {
            write!(f, " | Trainer: {}", self.info.trainer)?;
        }
        match self.odds {
            Some(odds) => write!(f, " | Odds: {odds:.2}"),
            None => write!(f, " | Odds: N/A"),
        }
    }
}

/// A race with every runner annotated for display.
#[derive(Debug, Clone, Serialize)]
pub struct RaceCard {
    pub market: MarketSummary,
    pub phase: RacePhase,
    pub market_status: Option<MarketStatus>,
    pub entries: Vec<RunnerEntry>,
    pub favourite: Option<SelectionId>,
    /// Only resolved for finished races.
    pub winner: Option<WinnerResolution>,
}

impl RaceCard {
    /// Join a market's runner descriptions with its (optional) book.
    ///
    /// Without a book there are no odds, no non-runners, no favourite,
    /// and no winner; the card still lists every runner.
    pub fn build(
        market: MarketSummary,
        runners: &[RunnerDescription],
        book: Option<&MarketBook>,
        phase: RacePhase,
    ) -> Self {
        let odds = book.map(odds_by_selection).unwrap_or_default();
        let withdrawn = non_runners(runners, book);
        let favourite = select_favourite(runners, &odds, &withdrawn);

        let winner = match (phase, book) {
            (RacePhase::Finished, Some(b)) => resolve_winner(&b.runners, b.status),
            _ => None,
        };
        let winner_id = winner.map(|w| w.selection_id);

        let entries = runners
            .iter()
            .map(|r| RunnerEntry {
                info: build_runner_info(r),
                odds: odds.get(&r.selection_id).copied(),
                non_runner: withdrawn.contains(&r.selection_id),
                favourite: favourite == Some(r.selection_id),
                winner: winner_id == Some(r.selection_id),
            })
            .collect();

        RaceCard {
            market,
            phase,
            market_status: book.map(|b| b.status),
            entries,
            favourite,
            winner,
        }
    }

    /// Entry for a selection on this card.
    pub fn runner(&self, selection_id: SelectionId) -> Option<&RunnerEntry> {
        self.entries.iter().find(|e| e.info.selection_id == selection_id)
    }

    pub fn favourite_entry(&self) -> Option<&RunnerEntry> {
        self.favourite.and_then(|id| self.runner(id))
    }

    pub fn winner_entry(&self) -> Option<&RunnerEntry> {
        self.winner.and_then(|w| self.runner(w.selection_id))
    }

    /// Winner's name, or its selection id when the book names a runner
    /// the descriptions do not list.
    pub fn winner_name(&self) -> Option<String> {
        let winner = self.winner?;
        Some(match self.winner_entry() {
            Some(e) => e.info.name.clone(),
            None => format!("selection {}", winner.selection_id),
        })
    }

    /// Priced, declared runners sorted by ascending odds (shortest first).
    pub fn odds_ladder(&self) -> Vec<&RunnerEntry> {
        let mut ladder: Vec<&RunnerEntry> = self
            .entries
            .iter()
            .filter(|e| !e.non_runner && e.odds.is_some_and(f64::is_finite))
            .collect();
        ladder.sort_by(|a, b| {
            a.odds
                .partial_cmp(&b.odds)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ladder
    }
}

impl fmt::Display for RaceCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.market.display_label())?;
        for entry in &self.entries {
            writeln!(f, "  {entry}")?;
        }
        if self.phase == RacePhase::Finished {
            match self.winner_name() {
                Some(name) => write!(f, "  Winner: {name}"),
                None => write!(f, "  Winner: unknown"),
            }?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
