use anyhow::{bail, Result};
use bayesrank_utils::simulator::{SimulatorConfig, SimulatorSource};
use bayesrank_utils::tournament::{run_tournament, TournamentConfig};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::path::Path;
use std::time::Instant;

mod cli;
mod io;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    // Set up logging level
    match args.verbosity {
        cli::LogLevel::Silent => {
            env_logger::Builder::from_env(Env::default().default_filter_or("off")).init();
        }
        cli::LogLevel::Normal => {
            env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
        }
        cli::LogLevel::Verbose => {
            env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();
        }
    }

    // Create output directory
    let out_path = Path::new(&args.out);
    if out_path.exists() {
        bail!("Output directory already exists: {}", out_path.display());
    }
    std::fs::create_dir_all(out_path)?;
    info!("Created output directory");

    tournament(&args)?;
    Ok(())
}

fn tournament(args: &cli::Cli) -> Result<()> {
    let global_timer = Instant::now();
    info!("Loading tournament from: {}", args.config);
    let config = TournamentConfig::from_path(Path::new(&args.config))?;
    info!("Loaded {} teams and {} rounds", config.teams.len(), config.rounds.len());

    let mut simulator = SimulatorConfig::new(&args.simulator, Path::new(&args.log_dir));
    simulator.fast_mode = args.fast_mode;
    simulator.max_replays = args.max_replays;

    let result = run_tournament(&config, &args.rank_config(), |left, right| {
        Ok(SimulatorSource::new(simulator.clone(), left.clone(), right.clone()))
    })?;

    io::write_tournament(Path::new(&args.out), &result)?;
    for (position, (name, points)) in result.overall.ranked().iter().enumerate() {
        println!("{:>3}. {:<20} {}", position + 1, name, points);
    }
    info!("Finished tournament in {:?}", global_timer.elapsed());
    Ok(())
}
