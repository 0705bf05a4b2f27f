mod session;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use streetmachine_core::clock::{SimClock, SystemClock, format_millis};
use streetmachine_core::highscore::HighscoreStore;
use streetmachine_core::tilemap::TileMap;
use streetmachine_core::track::generate_circuit;
use streetmachine_race::RaceStateMachine;
use streetmachine_race::autopilot::Autopilot;
use streetmachine_race::config::RaceConfig;

use session::{Pacer, SessionOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run Street Machine headless with the autopilot at the wheel")]
struct Cli {
    /// Race configuration TOML (defaults to $STREETMACHINE_RACE_CONFIG or config/race.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tile map file (JSON array of rows or whitespace-separated text).
    #[arg(long)]
    map: Option<PathBuf>,
    /// Scenery seed for the generated demo circuit.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Maximum number of simulation ticks.
    #[arg(long, default_value_t = 200_000)]
    ticks: u64,
    /// Stop after this many finished races (0 = run until the tick limit).
    #[arg(long, default_value_t = 1)]
    races: u32,
    /// Name stored with submitted scores.
    #[arg(long, default_value = "AUTOPILOT")]
    name: String,
    /// High-score file.
    #[arg(long, default_value = "files/highscore.json")]
    scores: PathBuf,
    /// Enable debug controls and periodic state traces.
    #[arg(long)]
    debug: bool,
    /// Pace ticks against the wall clock instead of running flat out.
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RaceConfig::from_toml_file(path)?,
        None => RaceConfig::load(),
    };
    config.debug |= cli.debug;

    let map = match &cli.map {
        Some(path) => TileMap::load(path)?,
        None => {
            tracing::info!(seed = cli.seed, "Generating demo circuit");
            generate_circuit(cli.seed)
        },
    };

    let options = SessionOptions {
        max_ticks: cli.ticks,
        races: cli.races,
        name: cli.name.clone(),
        trace_every: if config.debug {
            u64::from(config.tick_rate)
        } else {
            0
        },
    };
    let mut store = HighscoreStore::open(&cli.scores);
    let mut pilot = Autopilot::for_demo_circuit();

    tracing::info!(
        ticks = cli.ticks,
        races = cli.races,
        realtime = cli.realtime,
        "Street Machine simulation starting"
    );

    let summary = if cli.realtime {
        let mut pacer = Pacer::new(config.tick_rate);
        let mut race = RaceStateMachine::new(map, SystemClock::new(), config)?;
        session::run(&mut race, &mut pilot, &mut store, &options, |_| pacer.wait())
    } else {
        let tick_rate = config.tick_rate;
        let mut race = RaceStateMachine::new(map, SimClock::new(tick_rate), config)?;
        session::run(
            &mut race,
            &mut pilot,
            &mut store,
            &options,
            SimClock::advance,
        )
    };

    for (rank, entry) in store.table().entries().iter().enumerate() {
        tracing::debug!(
            rank = rank + 1,
            name = %entry.name,
            time = %format_millis(entry.time_ms),
            "Highscore"
        );
    }

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
