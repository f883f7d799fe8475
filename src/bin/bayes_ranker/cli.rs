use bayesrank_utils::hdi::HdiMethod;
use bayesrank_utils::ranker::RankConfig;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "bayes_ranker",
    version,
    about = "Rank 2 RoboCup Simulation 2D teams according to Bayesian inference"
)]
pub struct Cli {
    #[arg(long, default_value = "", help = "Path of the left team's script")]
    pub left: String,

    #[arg(long, default_value = "", help = "Path of the right team's script")]
    pub right: String,

    #[arg(long, default_value = "TeamA", help = "Name of the left team")]
    pub left_name: String,

    #[arg(long, default_value = "TeamB", help = "Name of the right team")]
    pub right_name: String,

    #[arg(long = "cm", default_value = "0.95", help = "Confidence mass")]
    pub confidence_mass: f64,

    #[arg(long = "pg", default_value = "1", help = "Number of prior games")]
    pub prior_games: u64,

    #[arg(
        long = "mg",
        default_value = "100",
        help = "Maximal number of additional batches (doesn't include prior games)"
    )]
    pub max_iterations: u64,

    #[arg(long, default_value = "1", help = "Number of games per additional batch")]
    pub batch_size: u64,

    #[arg(long = "a", default_value = "2", help = "'a' parameter of the prior Beta distribution")]
    pub prior_a: f64,

    #[arg(long = "b", default_value = "2", help = "'b' parameter of the prior Beta distribution")]
    pub prior_b: f64,

    #[arg(long, default_value = "nelder-mead", help = "HDI search: nelder-mead or golden-section")]
    pub hdi_method: HdiMethod,

    #[arg(
        long,
        help = "Win probability of the left team; draws random games instead of running the simulator"
    )]
    pub theta: Option<f64>,

    #[arg(long, help = "Seed for random games")]
    pub seed: Option<u64>,

    #[arg(long, default_value = "rcssserver", help = "Simulator executable")]
    pub simulator: String,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, help = "Run the simulator in synchronous mode")]
    pub fast_mode: bool,

    #[arg(long, default_value = "logs", help = "Directory for the simulator's log files")]
    pub log_dir: String,

    #[arg(long, default_value = "10", help = "Replays allowed when a game ends in a draw")]
    pub max_replays: u32,

    #[arg(long, help = "Print the verdict as JSON")]
    pub json: bool,

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
    fn test_defaults() {
        let cli = Cli::parse_from(["bayes_ranker"]);
        let config = cli.rank_config();
        assert_eq!(config.confidence_mass, 0.95);
        assert_eq!(config.prior_games, 1);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.batch_size, 1);
        assert_eq!((config.prior_a, config.prior_b), (2.0, 2.0));
        assert_eq!(config.hdi_method, HdiMethod::NelderMead);
        assert!(cli.fast_mode);
        assert_eq!(cli.verbosity, LogLevel::Normal);
    }

    #[test]
    fn test_random_games() {
        let cli = Cli::parse_from([
            "bayes_ranker",
            "--theta",
            "0.7",
            "--seed",
            "3",
            "--cm",
            "0.9",
            "--hdi-method",
            "golden-section",
            "--fast-mode",
            "false",
        ]);
        assert_eq!(cli.theta, Some(0.7));
        assert_eq!(cli.seed, Some(3));
        assert_eq!(cli.rank_config().hdi_method, HdiMethod::GoldenSection);
        assert!(!cli.fast_mode);
    }
}
