use anyhow::Result;
use bayesrank_utils::observation::BernoulliSource;
use bayesrank_utils::ranker::{rank, RankingVerdict};
use bayesrank_utils::simulator::{SimulatorConfig, SimulatorSource, Team};
use clap::Parser;
use env_logger::Env;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

mod cli;

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

    info!("Ranking {} against {}", args.left_name, args.right_name);
    let verdict = bayes_ranker(&args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("{}", verdict);
    }
    Ok(())
}

fn bayes_ranker(args: &cli::Cli) -> Result<RankingVerdict> {
    let config = args.rank_config();
    let verdict = match args.theta {
        Some(theta) => {
            let rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let source = BernoulliSource::new(theta, rng)?;
            rank(&config, &args.left_name, &args.right_name, source)?
        }
        None => {
            let mut simulator = SimulatorConfig::new(&args.simulator, Path::new(&args.log_dir));
            simulator.fast_mode = args.fast_mode;
            simulator.max_replays = args.max_replays;
            let source = SimulatorSource::new(
                simulator,
                Team::new(&args.left_name, &args.left),
                Team::new(&args.right_name, &args.right),
            );
            rank(&config, &args.left_name, &args.right_name, source)?
        }
    };
    Ok(verdict)
}
