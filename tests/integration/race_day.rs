//! Race-day harness.
//!
//! Drives whole race days through the scanner, from both the in-memory
//! mock source and Betfair replay directories on disk, and settles bets
//! taken from the resulting race cards.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::Path;

use racecard::config::FeedConfig;
use racecard::engine::RaceScanner;
use racecard::platforms::betfair::BetfairReplay;
use racecard::platforms::MarketFilter;
use racecard::racing::{RaceCard, RacePhase, WinnerSignal};
use racecard::settlement::{settle, BetKind, BetSpec, PlaceTerms, Settlement};
use racecard::types::RacecardError;

use crate::mock_source::MockSource;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).unwrap()
}

fn race_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn filter() -> MarketFilter {
    MarketFilter::for_date(race_date(), &FeedConfig::default())
}

fn card<'a>(cards: &'a [RaceCard], market_id: &str) -> &'a RaceCard {
    cards
        .iter()
        .find(|c| c.market.market_id == market_id)
        .unwrap_or_else(|| panic!("no card for {market_id}"))
}

fn fixtures_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
}

// ---------------------------------------------------------------------------
// Mock source
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_race_day_classification_and_cards() {
    let scanner = RaceScanner::new(MockSource::race_day(now()));
    let day = scanner.scan(&filter(), now()).await.unwrap();

    let upcoming: Vec<_> = day.markets.upcoming.iter().map(|m| m.market_id.as_str()).collect();
    let finished: Vec<_> = day.markets.finished.iter().map(|m| m.market_id.as_str()).collect();
    assert_eq!(upcoming, vec!["1.300"]);
    assert_eq!(finished, vec!["1.100", "1.200"]);

    let cards = scanner.cards(&day).await;
    assert_eq!(cards.len(), 3);

    // Upcoming: the withdrawn shortest price is passed over
    let york = card(&cards, "1.300");
    assert_eq!(york.phase, RacePhase::Upcoming);
    assert_eq!(york.favourite, Some(33));
    assert!(york.winner.is_none());
    assert!(york.runner(32).unwrap().non_runner);
    assert_eq!(york.runner(32).unwrap().label(), "Enable NR");
    assert_eq!(york.runner(32).unwrap().info.jockey, "N/A");
    assert_eq!(york.runner(33).unwrap().label(), "Crystal Ocean 🔥");

    // Finished with an explicit position
    let ascot = card(&cards, "1.100");
    assert_eq!(ascot.favourite, Some(12));
    let winner = ascot.winner.unwrap();
    assert_eq!(winner.selection_id, 11);
    assert_eq!(winner.signal, WinnerSignal::Position);
    assert_eq!(ascot.winner_entry().unwrap().label(), "Golden Horn 🥇 Winner");

    // Finished, resolved by elimination; the withdrawn "position 1" is ignored
    let newbury = card(&cards, "1.200");
    let winner = newbury.winner.unwrap();
    assert_eq!(winner.selection_id, 22);
    assert_eq!(winner.signal, WinnerSignal::SoleActiveRunner);
    assert_eq!(newbury.favourite, Some(21));
}

#[tokio::test]
async fn test_broken_book_does_not_stop_other_races() {
    let source = MockSource::race_day(now());
    source.break_book("1.100");
    let scanner = RaceScanner::new(source);

    let day = scanner.scan(&filter(), now()).await.unwrap();
    let cards = scanner.cards(&day).await;
    assert_eq!(cards.len(), 3);

    let ascot = card(&cards, "1.100");
    assert!(ascot.winner.is_none());
    assert!(ascot.favourite.is_none());
    assert!(ascot.entries.iter().all(|e| e.odds.is_none()));
    assert!(ascot.to_string().contains("Winner: unknown"));

    assert_eq!(card(&cards, "1.200").winner.unwrap().selection_id, 22);
}

#[tokio::test]
async fn test_source_outage_fails_scan() {
    let source = MockSource::race_day(now());
    source.set_error("exchange unavailable");
    let scanner = RaceScanner::new(source);

    let err = scanner.scan(&filter(), now()).await.unwrap_err();
    assert!(err.to_string().contains("exchange unavailable"));

    scanner.source().clear_error();
    assert_eq!(scanner.scan(&filter(), now()).await.unwrap().markets.len(), 3);
}

#[tokio::test]
async fn test_every_race_fetches_runners_and_book() {
    let scanner = RaceScanner::new(MockSource::race_day(now()));
    let day = scanner.scan(&filter(), now()).await.unwrap();
    scanner.cards(&day).await;

    let calls = scanner.source().calls();
    for id in ["1.100", "1.200", "1.300"] {
        assert!(calls.contains(&format!("runner_descriptions:{id}")));
        assert!(calls.contains(&format!("market_book:{id}")));
    }
}

#[tokio::test]
async fn test_race_starting_now_is_finished() {
    let scanner = RaceScanner::new(MockSource::race_day(now()));
    let at_york_off = now() + chrono::Duration::minutes(45);
    let day = scanner.scan(&filter(), at_york_off).await.unwrap();
    assert!(day.markets.upcoming.is_empty());
    assert_eq!(day.markets.finished.last().unwrap().market_id, "1.300");

    // Open book with no result: unknown winner
    let york = scanner.card_by_id(&day, "1.300").await.unwrap();
    assert_eq!(york.phase, RacePhase::Finished);
    assert!(york.winner.is_none());
}

// ---------------------------------------------------------------------------
// Replay fixtures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bundled_fixtures_race_day() {
    let replay = BetfairReplay::open(fixtures_dir()).await.unwrap();
    let scanner = RaceScanner::new(replay);
    let day = scanner.scan(&filter(), now()).await.unwrap();

    // Dundalk (IE) is filtered out; Kempton's naive start reads as UTC
    let finished: Vec<_> = day.markets.finished.iter().map(|m| m.market_id.as_str()).collect();
    assert_eq!(finished, vec!["1.250101", "1.250102"]);
    assert_eq!(day.markets.upcoming.len(), 1);
    assert_eq!(day.markets.upcoming[0].course(), "Kempton");

    let cards = scanner.cards(&day).await;

    let newmarket = card(&cards, "1.250101");
    assert_eq!(newmarket.winner.unwrap().selection_id, 40101);
    let excelebration = newmarket.runner(40102).unwrap();
    assert_eq!(excelebration.info.trainer, "N/A");
    assert_eq!(excelebration.info.cloth_number, "2");
    assert_eq!(newmarket.runner(40103).unwrap().info.jockey, "N/A");

    let ascot = card(&cards, "1.250102");
    let winner = ascot.winner.unwrap();
    assert_eq!(winner.selection_id, 40201);
    assert_eq!(winner.signal, WinnerSignal::SoleActiveRunner);
    assert_eq!(ascot.favourite, Some(40201));

    // Joint favourites: the first listed wins the tie
    let kempton = card(&cards, "1.250103");
    assert_eq!(kempton.favourite, Some(40301));
    assert!(kempton.runner(40303).unwrap().non_runner);
    let ladder: Vec<_> = kempton.odds_ladder().iter().map(|e| e.info.selection_id).collect();
    assert_eq!(ladder, vec![40301, 40302]);
}

#[tokio::test]
async fn test_replay_directory_without_books() {
    let dir = tempfile::tempdir().unwrap();
    let catalogue = std::fs::read_to_string(fixtures_dir().join("catalogue.json")).unwrap();
    std::fs::write(dir.path().join("catalogue.json"), catalogue).unwrap();

    let replay = BetfairReplay::open(dir.path()).await.unwrap();
    assert_eq!(replay.origin(), Some(dir.path()));

    let scanner = RaceScanner::new(replay);
    let day = scanner.scan(&filter(), now()).await.unwrap();
    let cards = scanner.cards(&day).await;
    assert_eq!(cards.len(), 3);
    for c in &cards {
        assert!(c.market_status.is_none());
        assert!(c.favourite.is_none());
        assert!(c.winner.is_none());
        assert!(c.entries.iter().all(|e| !e.non_runner && e.odds.is_none()));
    }
}

#[tokio::test]
async fn test_replay_directory_missing_catalogue() {
    let dir = tempfile::tempdir().unwrap();
    let err = BetfairReplay::open(dir.path()).await.unwrap_err();
    assert!(err.to_string().contains("catalogue.json"));
}

#[tokio::test]
async fn test_replay_directory_corrupt_books() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("catalogue.json"), "[]").unwrap();
    std::fs::write(dir.path().join("books.json"), "{ truncated").unwrap();
    assert!(BetfairReplay::open(dir.path()).await.is_err());
}

#[tokio::test]
async fn test_unknown_market_on_day() {
    let replay = BetfairReplay::open(fixtures_dir()).await.unwrap();
    let scanner = RaceScanner::new(replay);
    let day = scanner.scan(&filter(), now()).await.unwrap();

    // Recorded, but on the wrong side of the country filter
    let err = scanner.card_by_id(&day, "1.250104").await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<RacecardError>(),
        Some(&RacecardError::MarketNotFound("1.250104".into()))
    );
}

// ---------------------------------------------------------------------------
// Settling bets from cards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_settle_bets_on_favourite() {
    let replay = BetfairReplay::open(fixtures_dir()).await.unwrap();
    let scanner = RaceScanner::new(replay);
    let day = scanner.scan(&filter(), now()).await.unwrap();
    let kempton = scanner.card_by_id(&day, "1.250103").await.unwrap();
    let fav = kempton.favourite_entry().unwrap();

    let win = BetSpec::for_runner(fav.info.selection_id, BetKind::Win, 10.0, fav.odds).unwrap();
    let Settlement::Win(s) = settle(&win).unwrap() else {
        panic!("expected win settlement");
    };
    assert!((s.profit - 25.0).abs() < 1e-9);
    assert!((s.total_return - 35.0).abs() < 1e-9);

    let ew = BetSpec::for_runner(
        fav.info.selection_id,
        BetKind::EachWay { place_terms: PlaceTerms::Fifth },
        10.0,
        fav.odds,
    )
    .unwrap();
    let Settlement::EachWay(s) = settle(&ew).unwrap() else {
        panic!("expected each-way settlement");
    };
    assert!((s.place_odds - 0.7).abs() < 1e-9);
    assert!((s.place_profit - -1.5).abs() < 1e-9);

    let lay = BetSpec::for_runner(fav.info.selection_id, BetKind::Lay, 10.0, fav.odds).unwrap();
    let rendered = settle(&lay).unwrap().render("£");
    assert!(rendered.contains("Lay Bet: you risk £25.00 to win £10.00"));
}

#[tokio::test]
async fn test_cannot_bet_on_unpriced_runner() {
    let dir = tempfile::tempdir().unwrap();
    let catalogue = std::fs::read_to_string(fixtures_dir().join("catalogue.json")).unwrap();
    std::fs::write(dir.path().join("catalogue.json"), catalogue).unwrap();

    let scanner = RaceScanner::new(BetfairReplay::open(dir.path()).await.unwrap());
    let day = scanner.scan(&filter(), now()).await.unwrap();
    let kempton = scanner.card_by_id(&day, "1.250103").await.unwrap();
    let altior = kempton.runner(40301).unwrap();

    assert_eq!(
        BetSpec::for_runner(40301, BetKind::Win, 10.0, altior.odds),
        Err(RacecardError::NoOdds(40301))
    );
}
