//! RACECARD — horse racing race cards and bet settlement
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod platforms;
pub mod racing;
pub mod settlement;
pub mod engine;
