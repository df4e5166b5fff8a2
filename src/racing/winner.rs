//! Winner resolution for finished races.
//!
//! The book's winner signal is not always populated, so the winner is
//! resolved through an ordered table of rules. Rules are evaluated top to
//! bottom and the first one that names a runner wins:
//!
//! 1. [`WinnerSignal::Position`]: a runner whose finishing position is 1.
//! 2. [`WinnerSignal::Placement`]: a runner whose legacy placement is 1.
//! 3. [`WinnerSignal::SoleActiveRunner`]: on a CLOSED market, the only
//!    ACTIVE runner not carrying a losing position.
//!
//! Rule 3 is approximate. A dead heat or incomplete status data can make
//! it name the wrong runner (or none), and the book alone cannot tell.
//!
//! Withdrawn (REMOVED) runners are never candidates for any rule.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::types::{BookRunner, MarketStatus, RunnerStatus, SelectionId};

/// Which rule produced a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WinnerSignal {
    Position,
    Placement,
    SoleActiveRunner,
}

impl fmt::Display for WinnerSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinnerSignal::Position => write!(f, "position"),
            WinnerSignal::Placement => write!(f, "placement"),
            WinnerSignal::SoleActiveRunner => write!(f, "sole active runner"),
        }
    }
}

/// A resolved winner and the rule that named it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinnerResolution {
    pub selection_id: SelectionId,
    pub signal: WinnerSignal,
}

/// One row of the decision table.
pub struct WinnerRule {
    pub signal: WinnerSignal,
    pub resolve: fn(&[BookRunner], MarketStatus) -> Option<SelectionId>,
}

/// The decision table, highest priority first.
pub const WINNER_RULES: [WinnerRule; 3] = [
    WinnerRule {
        signal: WinnerSignal::Position,
        resolve: by_position,
    },
    WinnerRule {
        signal: WinnerSignal::Placement,
        resolve: by_placement,
    },
    WinnerRule {
        signal: WinnerSignal::SoleActiveRunner,
        resolve: by_sole_active_runner,
    },
];

fn candidates(runners: &[BookRunner]) -> impl Iterator<Item = &BookRunner> {
    runners.iter().filter(|r| r.status != RunnerStatus::Removed)
}

/// First runner with an explicit finishing position of 1.
pub fn by_position(runners: &[BookRunner], _status: MarketStatus) -> Option<SelectionId> {
    candidates(runners)
        .find(|r| r.position == Some(1))
        .map(|r| r.selection_id)
}

/// First runner with a legacy placement of 1.
pub fn by_placement(runners: &[BookRunner], _status: MarketStatus) -> Option<SelectionId> {
    candidates(runners)
        .find(|r| r.placement == Some(1))
        .map(|r| r.selection_id)
}

/// On a CLOSED market, the single ACTIVE runner whose position is absent
/// or 1. Two or more such runners, or none, resolve nothing.
pub fn by_sole_active_runner(runners: &[BookRunner], status: MarketStatus) -> Option<SelectionId> {
    if status != MarketStatus::Closed {
        return None;
    }

    let mut active = candidates(runners).filter(|r| {
        r.status == RunnerStatus::Active && matches!(r.position, None | Some(1))
    });

    match (active.next(), active.next()) {
        (Some(only), None) => Some(only.selection_id),
        _ => None,
    }
}

/// Resolve the winner of a race from its book. `None` means the winner
/// is unknown and must be rendered as such.
pub fn resolve_winner(runners: &[BookRunner], status: MarketStatus) -> Option<WinnerResolution> {
    let resolution = WINNER_RULES.iter().find_map(|rule| {
        (rule.resolve)(runners, status).map(|selection_id| WinnerResolution {
            selection_id,
            signal: rule.signal,
        })
    });

    match resolution {
        Some(w) => debug!(selection_id = w.selection_id, signal = %w.signal, "Winner resolved"),
        None => debug!(runners = runners.len(), market_status = %status, "Winner unknown"),
    }

    resolution
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
