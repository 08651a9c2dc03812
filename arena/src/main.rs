//! Werewolf match arena for language-model agents.
//!
//! Plays social-deduction matches where every seat is controlled by a
//! configured agent command. Matches are reproducible for a fixed seed and
//! fixed agent responses; each match writes a JSONL event log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use arena::io::agent::{CommandAgent, StockNarrator};
use arena::io::config::{MatchConfig, load_config, write_config};
use arena::io::event_log::JsonlEventLog;
use arena::logging;
use arena::match_runner::{MatchRunner, MatchSettings};

#[derive(Parser)]
#[command(
    name = "arena",
    version,
    about = "Werewolf match arena for language-model agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `arena.toml` if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Play one or more matches.
    Run {
        /// Path to the config file.
        #[arg(long, default_value = "arena.toml")]
        config: PathBuf,

        /// Override the number of seats.
        #[arg(long)]
        players: Option<usize>,

        /// Override how many matches to play.
        #[arg(long)]
        matches: Option<u32>,

        /// Override the seed for reproducible matches.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Run {
            config,
            players,
            matches,
            seed,
        } => cmd_run(&config, players, matches, seed),
    }
}

fn cmd_init(force: bool) -> Result<()> {
    let path = PathBuf::from("arena.toml");
    if path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    write_config(&path, &MatchConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_run(
    config_path: &std::path::Path,
    players: Option<usize>,
    matches: Option<u32>,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(players) = players {
        config.players = players;
    }
    if let Some(matches) = matches {
        config.matches = matches;
    }
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    config.validate()?;

    for match_no in 0..config.matches {
        play_match(&config, match_no)
            .with_context(|| format!("match {} of {}", match_no + 1, config.matches))?;
    }
    Ok(())
}

fn play_match(config: &MatchConfig, match_no: u32) -> Result<()> {
    let agents: Vec<CommandAgent> = (0..config.players)
        .map(|_| CommandAgent::from_config(config))
        .collect::<Result<_>>()?;
    let narrator = StockNarrator::new(config.narration.rounds_before_vote);
    let events = JsonlEventLog::create(&config.log_dir)?;
    let log_path = events.path().to_path_buf();

    // Each match in a batch gets a distinct but reproducible stream.
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(match_no))),
        None => StdRng::from_entropy(),
    };

    let settings = MatchSettings {
        max_discussion_rounds: config.max_discussion_rounds,
    };
    let mut runner = MatchRunner::new(agents, narrator, events, settings, rng)?;
    let report = runner.run()?;

    println!(
        "match {}: {:?} win after {} night(s), log at {}",
        match_no + 1,
        report.winner,
        report.nights,
        log_path.display()
    );
    for p in &report.participants {
        println!(
            "  {} - {} ({})",
            p.identifier,
            p.role.as_str(),
            if p.alive { "living" } else { "dead" }
        );
    }
    Ok(())
}
