//! Shared types for RACECARD.
//!
//! These types form the snapshot data model used across all modules.
//! They are plain read-only records joined by market id and selection id;
//! no record owns another.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Selection id of a runner, unique within its market.
pub type SelectionId = u64;

/// Fallback course label when neither venue nor event name is known.
pub const UNKNOWN_COURSE: &str = "Unknown Course";

/// Sentinel rendered for absent runner metadata.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Scheduled start of a race as reported by the data source.
///
/// Some feeds omit the offset; those instants are read as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTime {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl StartTime {
    /// Parse an RFC 3339 timestamp, or an offset-less ISO-8601 one.
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(StartTime::Zoned(dt));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(StartTime::Naive)
    }

    /// The absolute instant, treating naive times as UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            StartTime::Zoned(dt) => dt.with_timezone(&Utc),
            StartTime::Naive(naive) => naive.and_utc(),
        }
    }
}

impl From<DateTime<Utc>> for StartTime {
    fn from(dt: DateTime<Utc>) -> Self {
        StartTime::Zoned(dt.fixed_offset())
    }
}

impl Serialize for StartTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.instant().serialize(serializer)
    }
}

/// One race's WIN market, as listed by the data source.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub market_id: String,
    pub start_time: StartTime,
    pub venue: Option<String>,
    pub event_name: Option<String>,
    pub market_name: String,
}

impl MarketSummary {
    /// Course name: venue, then event name, then "Unknown Course".
    pub fn course(&self) -> &str {
        [self.venue.as_deref(), self.event_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_COURSE)
    }

    /// `HH:MM  -  course  -  race name` in local time.
    pub fn display_label(&self) -> String {
        let local = self.start_time.instant().with_timezone(&Local);
        format!(
            "{}  -  {}  -  {}",
            local.format("%H:%M"),
            self.course(),
            self.market_name
        )
    }
}

impl fmt::Display for MarketSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.market_id, self.display_label())
    }
}

// ---------------------------------------------------------------------------
// Runners
// ---------------------------------------------------------------------------

/// Static description of a runner entered in a race.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunnerDescription {
    pub selection_id: SelectionId,
    pub runner_name: String,
    /// Keys such as `CLOTH_NUMBER`, `JOCKEY_NAME`, `TRAINER_NAME`.
    /// Values may be null in the feed.
    pub metadata: HashMap<String, Option<String>>,
}

impl RunnerDescription {
    /// Non-empty metadata value for `key`, if any.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }
}

/// Display-ready projection of a runner description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnerInfo {
    pub name: String,
    pub cloth_number: String,
    pub jockey: String,
    pub trainer: String,
    pub selection_id: SelectionId,
}

/// Runner status tag on the market book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerStatus {
    Active,
    Removed,
    Winner,
    Loser,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RunnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerStatus::Active => write!(f, "ACTIVE"),
            RunnerStatus::Removed => write!(f, "REMOVED"),
            RunnerStatus::Winner => write!(f, "WINNER"),
            RunnerStatus::Loser => write!(f, "LOSER"),
            RunnerStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A runner's line on the market book snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookRunner {
    pub selection_id: SelectionId,
    pub status: RunnerStatus,
    /// Explicit finishing position (1 = winner).
    pub position: Option<u32>,
    /// Legacy placement field, an alternate winner signal.
    pub placement: Option<u32>,
    /// Best available back price.
    pub best_back_price: Option<f64>,
}

/// Market status tag on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    Open,
    Suspended,
    Closed,
    Inactive,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStatus::Open => write!(f, "OPEN"),
            MarketStatus::Suspended => write!(f, "SUSPENDED"),
            MarketStatus::Closed => write!(f, "CLOSED"),
            MarketStatus::Inactive => write!(f, "INACTIVE"),
            MarketStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Snapshot of a market's book: status plus one line per runner.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketBook {
    pub market_id: String,
    pub status: MarketStatus,
    pub runners: Vec<BookRunner>,
}

impl MarketBook {
    /// Book line for a selection, if the book carries one.
    pub fn runner(&self, selection_id: SelectionId) -> Option<&BookRunner> {
        self.runners.iter().find(|r| r.selection_id == selection_id)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for RACECARD.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RacecardError {
    #[error("Invalid stake: {0} (must be greater than zero)")]
    InvalidStake(f64),

    #[error("Invalid odds: {0} (decimal odds must be at least 1.01)")]
    InvalidOdds(f64),

    #[error("Invalid place terms: 1/{0} (supported: 1/4, 1/5, 1/6)")]
    InvalidPlaceTerms(u32),

    #[error("No odds available for selection {0}")]
    NoOdds(SelectionId),

    #[error("Market not found: {0}")]
    MarketNotFound(String),

    #[error("Runner {selection_id} not found in market {market_id}")]
    RunnerNotFound {
        market_id: String,
        selection_id: SelectionId,
    },

    #[error("Date {date} is outside the allowed window of {window_days} days from today")]
    DateOutOfRange { date: chrono::NaiveDate, window_days: i64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
