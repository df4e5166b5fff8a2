//! Integration tests: full race days through the scanner, replay
//! fixtures on disk, and settlement of bets taken from race cards.

mod mock_source;
mod race_day;
