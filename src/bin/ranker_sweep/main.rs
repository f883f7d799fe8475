use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;
use std::path::Path;
use std::time::Instant;

mod cli;
mod io;
mod sweep;

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

    ranker_sweep(&args)?;
    Ok(())
}

fn ranker_sweep(args: &cli::Cli) -> Result<()> {
    let global_timer = Instant::now();
    let config = args.rank_config();
    let thetas = sweep::theta_grid(args.step)?;

    let out_dir = Path::new(&args.out);
    std::fs::create_dir_all(out_dir)?;
    let out_path = out_dir.join(args.output_file_name());
    let mut writer = io::SweepWriter::new(&out_path)?;

    for (i, theta) in thetas.iter().enumerate() {
        info!("Testing theta: {:.6} ...", theta);
        let timer = Instant::now();
        let seed = args.seed.wrapping_add((i * args.nbt) as u64);
        let row = sweep::run_theta(&config, *theta, args.nbt, seed)?;
        info!(
            "theta {:.3}: A won {:.2}, B won {:.2}, {:.2} batches, A ranked first in {:.1}% ({:?})",
            row.theta,
            row.avg_wins_a,
            row.avg_wins_b,
            row.avg_iterations,
            row.ratio_a_winner,
            timer.elapsed()
        );
        writer.write_row(&row)?;
    }
    writer.flush()?;
    info!("Wrote {} in {:?}", out_path.display(), global_timer.elapsed());
    Ok(())
}
