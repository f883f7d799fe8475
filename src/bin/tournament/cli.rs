use bayesrank_utils::hdi::HdiMethod;
use bayesrank_utils::ranker::RankConfig;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "tournament",
    version,
    about = "Play a RoboCup Simulation 2D tournament, ranking each pair by Bayesian inference"
)]
pub struct Cli {
    #[arg(
        long,
        short,
        value_name = "CONFIG",
        help = "JSON file with teams, points and rounds"
    )]
    pub config: String,

    #[arg(
        long,
        short,
        default_value = "textres",
        value_name = "OUT",
        help = "Output directory for the standings"
    )]
    pub out: String,

    #[arg(long = "cm", default_value = "0.95", help = "Confidence mass")]
    pub confidence_mass: f64,

    #[arg(long = "pg", default_value = "10", help = "Number of prior games")]
    pub prior_games: u64,

    #[arg(
        long = "mt",
        default_value = "10",
        help = "Maximal number of tries, each playing --batch-size games (doesn't include prior games)"
    )]
    pub max_iterations: u64,

    #[arg(long, default_value = "10", help = "Number of games per try")]
    pub batch_size: u64,

    #[arg(long = "a", default_value = "2", help = "'a' parameter of the prior Beta distribution")]
    pub prior_a: f64,

    #[arg(long = "b", default_value = "2", help = "'b' parameter of the prior Beta distribution")]
    pub prior_b: f64,

    #[arg(long, default_value = "nelder-mead", help = "HDI search: nelder-mead or golden-section")]
    pub hdi_method: HdiMethod,

    #[arg(long, default_value = "rcssserver", help = "Simulator executable")]
    pub simulator: String,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, help = "Run the simulator in synchronous mode")]
    pub fast_mode: bool,

    #[arg(long, default_value = "logs", help = "Directory for the simulator's log files")]
    pub log_dir: String,

    #[arg(long, default_value = "10", help = "Replays allowed when a game ends in a draw")]
    pub max_replays: u32,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn rank_config(&self) -> RankConfig {
        RankConfig {
            prior_games: self.prior_games,
            max_iterations: self.max_iterations,
            batch_size: self.batch_size,
            confidence_mass: self.confidence_mass,
            prior_a: self.prior_a,
            prior_b: self.prior_b,
            hdi_method: self.hdi_method,
        }
    }
}

#[derive(Debug, clap::ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Normal,
    Silent,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Normal => write!(f, "normal"),
            LogLevel::Silent => write!(f, "silent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_config() {
        assert!(Cli::try_parse_from(["tournament"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["tournament", "--config", "tournaments/sample.json"]);
        let config = cli.rank_config();
        assert_eq!(config.prior_games, 10);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.batch_size, 10);
        assert_eq!(cli.out, "textres");
    }
}
