//! arena-sim: play one Elimination Arena game from the terminal
//!
//! Loads a YAML config, places the bets given on the command line, plays
//! every round and prints the results.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use arena_host::{
    mirror::ConfiguredMirror, narrator::ConfiguredNarrator, parse_hex, session::GameSession,
    Config,
};
use arena_logic::{ContestantId, Orchestrator, PhaseKind};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run an Elimination Arena game")]
struct Args {
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 32-byte hex seed, overrides the config
    #[arg(short, long)]
    seed: Option<String>,

    /// Bet as CONTESTANT_ID:AMOUNT, repeatable
    #[arg(short, long = "bet", value_parser = parse_bet)]
    bets: Vec<(ContestantId, f64)>,

    /// Overrides the config log level
    #[arg(long)]
    log_level: Option<String>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn parse_bet(value: &str) -> Result<(ContestantId, f64), String> {
    let (id, amount) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ID:AMOUNT, got {}", value))?;
    let id = id.parse().map_err(|e| format!("invalid contestant id {}: {}", id, e))?;
    let amount = amount
        .parse()
        .map_err(|e| format!("invalid amount {}: {}", amount, e))?;
    Ok((id, amount))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("could not load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        parse_hex::<32>("seed", &seed)?;
        config.seed = Some(seed);
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    let config = config.validate().context("invalid config")?;

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();
    info!(seed = %hex::encode(config.seed), "starting game");

    // Wire collaborators
    let narrator = ConfiguredNarrator::from_target(&config.narrator, config.narrator_timeout)
        .context("could not build narrator")?;
    let mirror = ConfiguredMirror::from_target(&config.mirror).context("could not build mirror")?;
    let game = Orchestrator::new(config.game, config.seed);
    let mut session = GameSession::new(game, narrator, mirror, config.narrator_timeout);

    // Roster
    let state = session.open()?;
    println!("{} contestants enter the arena:", state.contestants.len());
    for c in &state.contestants {
        println!(
            "  #{} {:<12} {:<13} {:<14} odds {:>4.1}x  {}",
            c.number,
            c.name,
            c.personality.label(),
            c.talent.label(),
            c.current_odds,
            c.description
        );
    }

    // Bets
    for (contestant_id, amount) in args.bets {
        match session.place_bet(contestant_id, amount) {
            Ok(bet) => println!(
                "Bet {}: {:.2} on #{:03} at {:.1}x (pays {:.2})",
                bet.id, bet.amount, bet.contestant_id, bet.odds, bet.potential_payout
            ),
            Err(e) => warn!(contestant_id, amount, error = %e, "bet rejected"),
        }
    }

    // Rounds
    while session.orchestrator().phase().kind() != PhaseKind::Results {
        let report = session.play_round().await?;
        println!();
        println!(
            "== Round {}: {} ==",
            report.round_number,
            report.outcome.round_type.display_name()
        );
        for line in report.outcome.narrative_lines() {
            println!("  {}", line);
        }
        for event in &report.outcome.events {
            println!("  x {}", event.description);
        }
    }

    // Results
    let summary = session.show_results()?;
    session.flush().await;
    let last_round = session
        .orchestrator()
        .state()
        .history
        .last()
        .map(|r| r.round_type.display_name())
        .ok_or_else(|| anyhow!("game ended without a round"))?;
    println!();
    match summary.winner.and_then(|id| session.orchestrator().state().contestant(id)) {
        Some(winner) => println!("Winner: #{} {} (after {})", winner.number, winner.name, last_round),
        None => println!(
            "No single winner after {}. Survivors: {:?}",
            last_round, summary.survivors
        ),
    }
    println!(
        "Balance: {:.2} (net {:+.2}, {} won / {} lost)",
        summary.final_balance,
        summary.betting.net_profit,
        summary.betting.won_bets,
        summary.betting.lost_bets
    );

    if args.json {
        let snapshot = session.orchestrator().snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
