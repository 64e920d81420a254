//! warlight -- referee for two-player Warlight bot matches.
//!
//! Loads a map and optional settings, starts both bots through `sh -c`,
//! plays the match and prints the result on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use warlight::board::{load_map, Map, Settings};
use warlight::bot::{BotChannel, Player};
use warlight::protocol::{BotProtocol, LegacyProtocol, V1Protocol};
use warlight::referee::{MatchOptions, Referee};
use warlight::replay::MatchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProtocolKind {
    /// JSON map and standings, all picks in one request
    V1,
    /// Space-token format, one pick per request
    Legacy,
}

#[derive(Parser)]
#[command(name = "warlight")]
#[command(about = "Referee for two-player Warlight bot matches", version)]
struct Cli {
    /// Map definition (WarZone JSON)
    #[arg(long)]
    map: PathBuf,

    /// Game settings (JSON); built-in defaults when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Seed for setup and draft randomness (0 = entropy)
    #[arg(long, default_value_t = 0)]
    map_seed: u64,

    /// Seed for combat and move-order randomness (0 = entropy)
    #[arg(long, default_value_t = 0)]
    game_seed: u64,

    /// Bot protocol variant
    #[arg(long, value_enum, default_value_t = ProtocolKind::V1)]
    protocol: ProtocolKind,

    /// Write the replay JSON here
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Query both bots concurrently within a phase
    #[arg(long)]
    parallel: bool,

    #[arg(long, default_value = "bot1")]
    name1: String,

    #[arg(long, default_value = "bot2")]
    name2: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Command line starting the first bot
    bot1: String,

    /// Command line starting the second bot
    bot2: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let map = load_map(&cli.map).with_context(|| format!("loading map {}", cli.map.display()))?;
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let options = MatchOptions {
        map_seed: cli.map_seed,
        game_seed: cli.game_seed,
        parallel_requests: cli.parallel,
    };

    let players = [
        start_bot(&cli.name1, &cli.bot1, &settings)?,
        start_bot(&cli.name2, &cli.bot2, &settings)?,
    ];

    let outcome = match cli.protocol {
        ProtocolKind::V1 => {
            let protocol = V1Protocol::new(&settings);
            play(map, settings, protocol, players, options, cli.replay.as_deref())?
        }
        ProtocolKind::Legacy => {
            let protocol = LegacyProtocol::new(&settings, &map)?;
            play(map, settings, protocol, players, options, cli.replay.as_deref())?
        }
    };

    match outcome {
        MatchOutcome::Winner(name) => println!("winner {}", name),
        MatchOutcome::Draw => println!("draw"),
    }
    Ok(())
}

fn start_bot(name: &str, command_line: &str, settings: &Settings) -> Result<Player> {
    let channel = BotChannel::from_shell(name, command_line)
        .with_context(|| format!("starting bot {} ({})", name, command_line))?;
    Ok(Player::new(name, Box::new(channel), settings))
}

fn play<P: BotProtocol>(
    map: Map,
    settings: Settings,
    protocol: P,
    players: [Player; 2],
    options: MatchOptions,
    replay_path: Option<&Path>,
) -> Result<MatchOutcome> {
    let mut referee = Referee::new(map, settings, protocol, players, options)?;
    let outcome = referee.run();
    info!(rounds = referee.round(), ?outcome, "match over");

    if let Some(path) = replay_path {
        referee.replay().write(path)?;
        info!(path = %path.display(), "replay written");
    }
    Ok(outcome)
}
