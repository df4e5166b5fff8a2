//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section and field has a default, so a missing file or a partial
//! file still yields a usable configuration.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::types::RacecardError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub display: DisplayConfig,
    pub simulator: SimulatorConfig,
}

/// Where race data comes from and which markets to select.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    /// Directory holding `catalogue.json` and `books.json`.
    pub fixture_dir: String,
    /// Betfair event type id (7 = horse racing).
    pub event_type_id: String,
    pub market_type: String,
    pub countries: Vec<String>,
    pub max_results: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            fixture_dir: "fixtures".to_string(),
            event_type_id: "7".to_string(),
            market_type: "WIN".to_string(),
            countries: vec!["GB".to_string()],
            max_results: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency: String,
    /// How far either side of today a race day may be selected.
    pub date_window_days: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: "£".to_string(),
            date_window_days: 30,
        }
    }
}

impl DisplayConfig {
    /// Reject dates outside `today ± date_window_days`.
    pub fn check_date(&self, date: NaiveDate, today: NaiveDate) -> Result<(), RacecardError> {
        let distance = (date - today).num_days().abs();
        if distance > self.date_window_days {
            return Err(RacecardError::DateOutOfRange {
                date,
                window_days: self.date_window_days,
            });
        }
        Ok(())
    }
}

/// Bet simulator defaults.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorConfig {
    pub default_stake: f64,
    pub default_place_divisor: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            default_stake: 10.0,
            default_place_divisor: 4,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), RacecardError> {
        if self.display.date_window_days < 0 {
            return Err(RacecardError::Config(format!(
                "display.date_window_days must not be negative (got {})",
                self.display.date_window_days
            )));
        }
        if !matches!(self.simulator.default_place_divisor, 4..=6) {
            return Err(RacecardError::Config(format!(
                "simulator.default_place_divisor must be 4, 5, or 6 (got {})",
                self.simulator.default_place_divisor
            )));
        }
        if self.feed.max_results == 0 {
            return Err(RacecardError::Config("feed.max_results must be positive".into()));
        }
        Ok(())
    }
}
