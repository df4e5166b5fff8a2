//! Wager settlement calculator.
//!
//! Computes the financial outcome of a Win, Each-Way, or Lay bet at
//! decimal odds (the quoted price already includes the unit stake).
//!
//! All figures are returned at full `f64` precision; rounding happens in
//! [`display`] only, never inside the calculation.
//!
//! Preconditions are checked, not clamped: a stake of zero or less, odds
//! below 1.01, or unsupported each-way place terms are rejected with a
//! [`RacecardError`].

pub mod display;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::types::{RacecardError, SelectionId};

/// Lowest decimal price the exchange quotes.
pub const MIN_ODDS: f64 = 1.01;

// ---------------------------------------------------------------------------
// Bet specification
// ---------------------------------------------------------------------------

/// Each-way place terms: the fraction of the win odds paid on the place leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlaceTerms {
    Quarter,
    Fifth,
    Sixth,
}

impl PlaceTerms {
    pub const ALL: [PlaceTerms; 3] = [PlaceTerms::Quarter, PlaceTerms::Fifth, PlaceTerms::Sixth];

    /// Terms for a divisor of 4, 5, or 6.
    pub fn from_divisor(divisor: u32) -> Result<Self, RacecardError> {
        match divisor {
            4 => Ok(PlaceTerms::Quarter),
            5 => Ok(PlaceTerms::Fifth),
            6 => Ok(PlaceTerms::Sixth),
            other => Err(RacecardError::InvalidPlaceTerms(other)),
        }
    }

    pub fn divisor(&self) -> u32 {
        match self {
            PlaceTerms::Quarter => 4,
            PlaceTerms::Fifth => 5,
            PlaceTerms::Sixth => 6,
        }
    }

    /// e.g. `1/4 (4 places)`
    pub fn label(&self) -> String {
        let n = self.divisor();
        format!("1/{n} ({n} places)")
    }
}

impl fmt::Display for PlaceTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.divisor())
    }
}

/// Bet type, as chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BetType {
    Win,
    EachWay,
    Lay,
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetType::Win => write!(f, "Win"),
            BetType::EachWay => write!(f, "Each Way"),
            BetType::Lay => write!(f, "Lay"),
        }
    }
}

impl FromStr for BetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "win" | "back" => Ok(BetType::Win),
            "each-way" | "eachway" | "ew" => Ok(BetType::EachWay),
            "lay" => Ok(BetType::Lay),
            _ => Err(format!("Unknown bet type: {s}")),
        }
    }
}

/// Bet-type-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BetKind {
    Win,
    EachWay { place_terms: PlaceTerms },
    Lay,
}

impl BetKind {
    /// Kind for a bet type; the place divisor only matters for each-way.
    pub fn from_type(bet_type: BetType, place_divisor: u32) -> Result<Self, RacecardError> {
        Ok(match bet_type {
            BetType::Win => BetKind::Win,
            BetType::EachWay => BetKind::EachWay {
                place_terms: PlaceTerms::from_divisor(place_divisor)?,
            },
            BetType::Lay => BetKind::Lay,
        })
    }

    pub fn bet_type(&self) -> BetType {
        match self {
            BetKind::Win => BetType::Win,
            BetKind::EachWay { .. } => BetType::EachWay,
            BetKind::Lay => BetType::Lay,
        }
    }
}

/// A bet to settle: stake in currency units at decimal odds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BetSpec {
    pub stake: f64,
    pub odds: f64,
    pub kind: BetKind,
}

impl BetSpec {
    pub fn win(stake: f64, odds: f64) -> Self {
        Self { stake, odds, kind: BetKind::Win }
    }

    /// Each-way bet; the divisor must be 4, 5, or 6.
    pub fn each_way(stake: f64, odds: f64, place_divisor: u32) -> Result<Self, RacecardError> {
        let place_terms = PlaceTerms::from_divisor(place_divisor)?;
        Ok(Self {
            stake,
            odds,
            kind: BetKind::EachWay { place_terms },
        })
    }

    pub fn lay(stake: f64, odds: f64) -> Self {
        Self { stake, odds, kind: BetKind::Lay }
    }

    /// Bet on a runner at its current price. A runner with no price
    /// cannot be bet on.
    pub fn for_runner(
        selection_id: SelectionId,
        kind: BetKind,
        stake: f64,
        current_odds: Option<f64>,
    ) -> Result<Self, RacecardError> {
        let odds = current_odds.ok_or(RacecardError::NoOdds(selection_id))?;
        Ok(Self { stake, odds, kind })
    }

    /// Check the calculator's preconditions.
    pub fn validate(&self) -> Result<(), RacecardError> {
        if !(self.stake.is_finite() && self.stake > 0.0) {
            return Err(RacecardError::InvalidStake(self.stake));
        }
        if !(self.odds.is_finite() && self.odds >= MIN_ODDS) {
            return Err(RacecardError::InvalidOdds(self.odds));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Settlement results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinSettlement {
    pub stake: f64,
    pub odds: f64,
    pub profit: f64,
    pub total_return: f64,
    pub roi_pct: f64,
    pub implied_probability_pct: f64,
}

/// Both legs of an each-way bet, kept separate: which one pays depends
/// on where the runner finishes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EachWaySettlement {
    pub odds: f64,
    pub place_terms: PlaceTerms,
    pub win_stake: f64,
    pub place_stake: f64,
    pub place_odds: f64,
    pub win_profit: f64,
    pub place_profit: f64,
    pub total_win_return: f64,
    pub total_place_return: f64,
}

/// Lay side: the layer takes the backer's stake and carries the liability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaySettlement {
    pub stake: f64,
    pub odds: f64,
    pub liability: f64,
    pub profit_if_loses: f64,
    pub total_risk: f64,
    pub implied_probability_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Settlement {
    Win(WinSettlement),
    EachWay(EachWaySettlement),
    Lay(LaySettlement),
}

impl Settlement {
    pub fn bet_type(&self) -> BetType {
        match self {
            Settlement::Win(_) => BetType::Win,
            Settlement::EachWay(_) => BetType::EachWay,
            Settlement::Lay(_) => BetType::Lay,
        }
    }
}

fn implied_probability_pct(odds: f64) -> f64 {
    (1.0 / odds) * 100.0
}

/// Settle a bet. Fails on a stake of zero or less or odds below 1.01.
pub fn settle(bet: &BetSpec) -> Result<Settlement, RacecardError> {
    bet.validate()?;
    let BetSpec { stake, odds, kind } = *bet;

    let settlement = match kind {
        BetKind::Win => {
            let profit = stake * (odds - 1.0);
            Settlement::Win(WinSettlement {
                stake,
                odds,
                profit,
                total_return: stake + profit,
                roi_pct: (profit / stake) * 100.0,
                implied_probability_pct: implied_probability_pct(odds),
            })
        }
        BetKind::EachWay { place_terms } => {
            let win_stake = stake / 2.0;
            let place_stake = stake / 2.0;
            let place_odds = odds / f64::from(place_terms.divisor());
            let win_profit = win_stake * (odds - 1.0);
            let place_profit = place_stake * (place_odds - 1.0);
            Settlement::EachWay(EachWaySettlement {
                odds,
                place_terms,
                win_stake,
                place_stake,
                place_odds,
                win_profit,
                place_profit,
                total_win_return: win_stake + win_profit,
                total_place_return: place_stake + place_profit,
            })
        }
        BetKind::Lay => {
            let liability = stake * (odds - 1.0);
            Settlement::Lay(LaySettlement {
                stake,
                odds,
                liability,
                profit_if_loses: stake,
                total_risk: liability,
                implied_probability_pct: implied_probability_pct(odds),
            })
        }
    };

    debug!(bet_type = %kind.bet_type(), stake, odds, "Bet settled");
    Ok(settlement)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
