//! Race-day engine: list → classify → build cards.

pub mod scanner;

pub use scanner::{RaceDay, RaceScanner};
