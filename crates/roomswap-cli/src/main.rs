//! Headless Roomswap driver.
//!
//! Builds a level, feeds it a seeded stream of swipes for a number of fixed
//! frames and prints the final snapshot as JSON. Useful for replaying a seed
//! or checking a config file without a renderer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use roomswap_core::spawn::SpawnTable;
use roomswap_core::{BoardLayout, Game, GameConfig, GameEvent, Gesture};

#[derive(Parser)]
#[command(name = "roomswap")]
#[command(about = "Run the Roomswap simulation headless and print the final state")]
struct Cli {
    /// Game config as JSON; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spawn table as JSON; defaults to one actor per occupied cell
    #[arg(long)]
    spawns: Option<PathBuf>,

    /// Board rows, e.g. "ABA,B_B,ABA"
    #[arg(long)]
    layout: Option<String>,

    /// Overrides the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Seed for the generated swipe stream
    #[arg(long, default_value_t = 1)]
    input_seed: u64,

    /// Frames to simulate at 60 Hz
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Frames between generated swipes
    #[arg(long, default_value_t = 30)]
    swipe_every: u64,

    /// Print every event as a JSON line before the snapshot
    #[arg(long)]
    events: bool,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

const FRAME: f32 = 1.0 / 60.0;

fn load_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GameConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn load_layout(cli: &Cli) -> Result<BoardLayout> {
    match &cli.layout {
        Some(rows) => {
            let rows: Vec<&str> = rows.split(',').map(str::trim).collect();
            BoardLayout::from_rows(&rows).context("parsing --layout")
        }
        None => Ok(BoardLayout::reference()),
    }
}

fn load_spawns(cli: &Cli, layout: &BoardLayout) -> Result<SpawnTable> {
    match &cli.spawns {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading spawn table {}", path.display()))?;
            SpawnTable::from_json(&json).with_context(|| format!("parsing {}", path.display()))
        }
        None => Ok(SpawnTable::for_layout(layout)),
    }
}

/// One press-drag-release on a random cell in a random direction.
#[allow(clippy::cast_possible_wrap)]
fn random_swipe(game: &mut Game, rng: &mut ChaCha8Rng) -> Result<()> {
    let col = rng.gen_range(0..game.board().width()) as i64;
    let row = rng.gen_range(0..game.board().height()) as i64;
    let delta = match rng.gen_range(0..4) {
        0 => Vec2::X,
        1 => Vec2::NEG_X,
        2 => Vec2::Y,
        _ => Vec2::NEG_Y,
    };
    debug!(col, row, ?delta, "Generated swipe");
    game.handle_gesture(Gesture::PointerDown { col, row })?;
    game.handle_gesture(Gesture::PointerDrag { delta })?;
    game.handle_gesture(Gesture::PointerUp)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let layout = load_layout(&cli)?;
    let mut spawner = load_spawns(&cli, &layout)?;
    let mut game = Game::new(&layout, &mut spawner, config)?;
    let mut input = ChaCha8Rng::seed_from_u64(cli.input_seed);

    let mut wins = 0usize;
    let mut attacks = 0usize;
    for frame in 0..cli.frames {
        if cli.swipe_every > 0 && frame % cli.swipe_every == 0 {
            random_swipe(&mut game, &mut input)?;
        }
        game.update(FRAME)?;
        for event in game.take_events() {
            match event {
                GameEvent::Won => wins += 1,
                GameEvent::AttackIssued { .. } => attacks += 1,
                _ => {}
            }
            if cli.events {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }

    info!(frames = cli.frames, wins, attacks, level = %game.level_state(), "Run complete");
    println!("{}", serde_json::to_string_pretty(&game.snapshot())?);
    Ok(())
}
