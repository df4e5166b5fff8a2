//! RACECARD — horse racing race cards and bet settlement
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the configured race data, and runs one CLI command.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use racecard::config::AppConfig;
use racecard::engine::{RaceDay, RaceScanner};
use racecard::platforms::betfair::BetfairReplay;
use racecard::platforms::MarketFilter;
use racecard::racing::{RaceCard, RacePhase};
use racecard::settlement::{settle, BetKind, BetSpec, BetType, Settlement};
use racecard::types::{RacecardError, SelectionId};

#[derive(Parser)]
#[command(name = "racecard", about = "Race cards, favourites, winners and bet settlement")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the day's upcoming and finished races
    Races {
        /// Race day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Show the full card for one race
    Card {
        market_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Settle a bet on a runner
    Settle {
        market_id: String,
        selection_id: SelectionId,
        /// Stake in currency units, defaults to the configured stake
        #[arg(long)]
        stake: Option<f64>,
        /// win, each-way, or lay
        #[arg(long, default_value = "win")]
        bet_type: BetType,
        /// Decimal odds, defaults to the runner's best back price
        #[arg(long)]
        odds: Option<f64>,
        /// Each-way place divisor (4, 5, or 6)
        #[arg(long)]
        place_terms: Option<u32>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cli = Cli::parse();
    let cfg = AppConfig::load_or_default(&cli.config)?;

    let replay = BetfairReplay::open(&cfg.feed.fixture_dir).await?;
    let scanner = RaceScanner::new(replay);

    match cli.command {
        Commands::Races { date, json } => {
            let day = load_day(&scanner, &cfg, date).await?;
            let cards = scanner.cards(&day).await;
            print_races(&cards, json)?;
        }
        Commands::Card {
            market_id,
            date,
            json,
        } => {
            let day = load_day(&scanner, &cfg, date).await?;
            let card = scanner.card_by_id(&day, &market_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&card)?);
            } else {
                println!("{card}");
            }
        }
        Commands::Settle {
            market_id,
            selection_id,
            stake,
            bet_type,
            odds,
            place_terms,
            date,
            json,
        } => {
            let day = load_day(&scanner, &cfg, date).await?;
            let card = scanner.card_by_id(&day, &market_id).await?;
            let entry = card
                .runner(selection_id)
                .ok_or_else(|| RacecardError::RunnerNotFound {
                    market_id: market_id.clone(),
                    selection_id,
                })?;
            if entry.non_runner {
                warn!(selection_id, runner = %entry.info.name, "Settling a bet on a non-runner");
            }

            let kind = BetKind::from_type(
                bet_type,
                place_terms.unwrap_or(cfg.simulator.default_place_divisor),
            )?;
            let stake = stake.unwrap_or(cfg.simulator.default_stake);
            let bet = BetSpec::for_runner(selection_id, kind, stake, odds.or(entry.odds))?;
            let settlement = settle(&bet)?;

            info!(
                market_id = %market_id,
                runner = %entry.info.name,
                bet_type = %bet_type,
                stake,
                odds = bet.odds,
                "Settlement calculated"
            );
            print_settlement(&card, &entry.info.name, &bet, &settlement, &cfg.display.currency, json)?;
        }
    }

    Ok(())
}

/// Scan the selected race day, checking it lies inside the date window.
async fn load_day(
    scanner: &RaceScanner<BetfairReplay>,
    cfg: &AppConfig,
    date: Option<NaiveDate>,
) -> Result<RaceDay> {
    let now = Utc::now();
    let today = now.date_naive();
    let date = date.unwrap_or(today);
    cfg.display.check_date(date, today)?;

    let filter = MarketFilter::for_date(date, &cfg.feed);
    scanner
        .scan(&filter, now)
        .await
        .with_context(|| format!("Failed to load races for {date}"))
}

#[derive(Serialize)]
struct RaceDayView<'a> {
    upcoming: Vec<&'a RaceCard>,
    finished: Vec<&'a RaceCard>,
}

fn print_races(cards: &[RaceCard], json: bool) -> Result<()> {
    let (upcoming, finished): (Vec<&RaceCard>, Vec<&RaceCard>) =
        cards.iter().partition(|c| c.phase == RacePhase::Upcoming);

    if json {
        let view = RaceDayView { upcoming, finished };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Upcoming Races");
    if upcoming.is_empty() {
        println!("  No upcoming races");
    }
    for card in &upcoming {
        let favourite = card
            .favourite_entry()
            .map_or("N/A".to_string(), |e| e.label());
        println!("  {}  [{}]  Favourite: {favourite}", card.market.display_label(), card.market.market_id);
    }

    println!("\nFinished Races");
    if finished.is_empty() {
        println!("  No finished races");
    }
    for card in &finished {
        let winner = card.winner_name().unwrap_or_else(|| "unknown".to_string());
        println!("  {}  [{}]  Winner: {winner}", card.market.display_label(), card.market.market_id);
    }
    Ok(())
}

#[derive(Serialize)]
struct SettlementView<'a> {
    market_id: &'a str,
    runner: &'a str,
    bet: &'a BetSpec,
    settlement: &'a Settlement,
}

fn print_settlement(
    card: &RaceCard,
    runner: &str,
    bet: &BetSpec,
    settlement: &Settlement,
    currency: &str,
    json: bool,
) -> Result<()> {
    if json {
        let view = SettlementView {
            market_id: &card.market.market_id,
            runner,
            bet,
            settlement,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", card.market.display_label());
    let terms = match bet.kind {
        BetKind::EachWay { place_terms } => format!(" ({})", place_terms.label()),
        _ => String::new(),
    };
    println!(
        "{} bet on {runner}: {currency}{} @ {:.2}{terms}\n",
        settlement.bet_type(),
        racecard::settlement::display::amount(bet.stake),
        bet.odds,
    );
    println!("{}", settlement.render(currency));
    Ok(())
}

/// Initialise the tracing subscriber.
///
/// Uses `RUST_LOG` env var for filtering (default: info for racecard).
/// Supports JSON output when `RACECARD_LOG_JSON` is set.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("racecard=info"));

    let json_logging = std::env::var("RACECARD_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
