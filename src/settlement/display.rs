//! Presentation of settlement figures.
//!
//! Money is rounded to pennies here and nowhere else, half away from
//! zero, via `rust_decimal` so that `2.675` shows as `2.68` rather than
//! whatever the nearest binary float happens to round to. Amounts too
//! large for a `Decimal` are shown from the raw `f64` instead.

use rust_decimal::prelude::*;

use super::{EachWaySettlement, LaySettlement, Settlement, WinSettlement};

/// Round a monetary amount to two decimal places for display.
/// `None` when the value does not fit a `Decimal` (or is not finite).
pub fn money(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Round a percentage to two decimal places for display.
pub fn percent(value: f64) -> Option<Decimal> {
    money(value)
}

/// Two-decimal text for an amount.
pub fn amount(value: f64) -> String {
    match money(value) {
        Some(d) => format!("{d:.2}"),
        None => format!("{value:.2}"),
    }
}

/// One labelled figure of a settlement summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub label: &'static str,
    pub value: String,
}

impl SummaryLine {
    fn money(label: &'static str, currency: &str, value: f64) -> Self {
        Self {
            label,
            value: format!("{currency}{}", amount(value)),
        }
    }

    fn percent(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value: format!("{}%", amount(value)),
        }
    }
}

impl Settlement {
    /// Labelled figures in display order.
    pub fn summary(&self, currency: &str) -> Vec<SummaryLine> {
        match self {
            Settlement::Win(s) => win_lines(s, currency),
            Settlement::EachWay(s) => each_way_lines(s, currency),
            Settlement::Lay(s) => lay_lines(s, currency),
        }
    }

    /// Extra explanatory line, where the bet type has one.
    pub fn breakdown(&self, currency: &str) -> Option<String> {
        match self {
            Settlement::EachWay(s) => Some(format!(
                "Each Way Breakdown: {currency}{} on Win @ {:.2}, {currency}{} on Place @ {:.2}",
                amount(s.win_stake),
                s.odds,
                amount(s.place_stake),
                s.place_odds,
            )),
            Settlement::Lay(s) => Some(format!(
                "Lay Bet: you risk {currency}{} to win {currency}{}",
                amount(s.liability),
                amount(s.profit_if_loses),
            )),
            Settlement::Win(_) => None,
        }
    }

    /// Summary and breakdown as printable text.
    pub fn render(&self, currency: &str) -> String {
        let mut out: Vec<String> = self
            .summary(currency)
            .into_iter()
            .map(|line| format!("{:<22}{}", line.label, line.value))
            .collect();
        if let Some(b) = self.breakdown(currency) {
            out.push(b);
        }
        out.join("\n")
    }
}

fn win_lines(s: &WinSettlement, currency: &str) -> Vec<SummaryLine> {
    vec![
        SummaryLine::money("Potential Profit", currency, s.profit),
        SummaryLine::money("Total Return", currency, s.total_return),
        SummaryLine::percent("ROI", s.roi_pct),
        SummaryLine::percent("Implied Probability", s.implied_probability_pct),
    ]
}

fn each_way_lines(s: &EachWaySettlement, currency: &str) -> Vec<SummaryLine> {
    vec![
        SummaryLine::money("Win Profit", currency, s.win_profit),
        SummaryLine::money("Place Profit", currency, s.place_profit),
        SummaryLine::money("Total Win Return", currency, s.total_win_return),
        SummaryLine::money("Total Place Return", currency, s.total_place_return),
    ]
}

fn lay_lines(s: &LaySettlement, currency: &str) -> Vec<SummaryLine> {
    vec![
        SummaryLine::money("Liability", currency, s.liability),
        SummaryLine::money("Profit if Loses", currency, s.profit_if_loses),
        SummaryLine::money("Total Risk", currency, s.total_risk),
        SummaryLine::percent("Implied Probability", s.implied_probability_pct),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
