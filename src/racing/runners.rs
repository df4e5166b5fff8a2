//! Runner projection, non-runner detection, and favourite selection.

use std::collections::{HashMap, HashSet};

use crate::types::{
    BookRunner, MarketBook, RunnerDescription, RunnerInfo, RunnerStatus, SelectionId,
    NOT_AVAILABLE,
};

const CLOTH_NUMBER: &str = "CLOTH_NUMBER";
const JOCKEY_NAME: &str = "JOCKEY_NAME";
const TRAINER_NAME: &str = "TRAINER_NAME";

/// Project a runner description into a display record. Missing, null, or
/// empty metadata becomes "N/A".
pub fn build_runner_info(runner: &RunnerDescription) -> RunnerInfo {
    let field = |key: &str| {
        runner
            .metadata_value(key)
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    };

    RunnerInfo {
        name: runner.runner_name.clone(),
        cloth_number: field(CLOTH_NUMBER),
        jockey: field(JOCKEY_NAME),
        trainer: field(TRAINER_NAME),
        selection_id: runner.selection_id,
    }
}

/// A runner is a non-runner only if the book has a line for it with
/// status REMOVED. No book line is not evidence either way.
pub fn is_non_runner(book_runner: Option<&BookRunner>) -> bool {
    matches!(book_runner, Some(r) if r.status == RunnerStatus::Removed)
}

/// Selection ids of every non-runner among `runners`.
pub fn non_runners(runners: &[RunnerDescription], book: Option<&MarketBook>) -> HashSet<SelectionId> {
    runners
        .iter()
        .filter(|r| is_non_runner(book.and_then(|b| b.runner(r.selection_id))))
        .map(|r| r.selection_id)
        .collect()
}

/// Best available back price per selection, for runners that have one.
pub fn odds_by_selection(book: &MarketBook) -> HashMap<SelectionId, f64> {
    book.runners
        .iter()
        .filter_map(|r| r.best_back_price.map(|p| (r.selection_id, p)))
        .collect()
}

/// Pick the favourite: the runner with the strictly lowest price,
/// skipping non-runners entirely. On equal prices the earlier runner
/// keeps the selection. Non-finite prices count as no price.
pub fn select_favourite(
    runners: &[RunnerDescription],
    odds: &HashMap<SelectionId, f64>,
    non_runners: &HashSet<SelectionId>,
) -> Option<SelectionId> {
    let mut best: Option<(SelectionId, f64)> = None;

    for runner in runners {
        if non_runners.contains(&runner.selection_id) {
            continue;
        }
        let Some(&price) = odds.get(&runner.selection_id) else {
            continue;
        };
        if !price.is_finite() {
            continue;
        }
        match best {
            Some((_, lowest)) if price >= lowest => {}
            _ => best = Some((runner.selection_id, price)),
        }
    }

    best.map(|(id, _)| id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
