use bayesrank_utils::hdi::HdiMethod;
use bayesrank_utils::ranker::RankConfig;
use clap::Parser;

/// Monte-Carlo evaluation of the ranker against random games of known
/// win probability.
#[derive(Parser, Debug)]
#[command(
    name = "ranker_sweep",
    version,
    about = "Evaluate the Bayesian ranker over a range of win probabilities"
)]
pub struct Cli {
    #[arg(long = "cm", default_value = "0.95", help = "Confidence mass")]
    pub confidence_mass: f64,

    #[arg(long = "pg", default_value = "0", help = "Number of prior games")]
    pub prior_games: u64,

    #[arg(
        long = "mg",
        default_value = "100",
        help = "Maximal number of additional batches (doesn't include prior games)"
    )]
    pub max_iterations: u64,

    #[arg(long = "a", default_value = "2", help = "'a' parameter of the prior Beta distribution")]
    pub prior_a: f64,

    #[arg(long = "b", default_value = "2", help = "'b' parameter of the prior Beta distribution")]
    pub prior_b: f64,

    #[arg(long, default_value = "nelder-mead", help = "HDI search: nelder-mead or golden-section")]
    pub hdi_method: HdiMethod,

    #[arg(long, default_value = "100", help = "Number of test per theta")]
    pub nbt: usize,

    #[arg(long, default_value = "0.05", help = "Theta range's step")]
    pub step: f64,

    #[arg(long, default_value = "1", help = "Number of games generated at once")]
    pub nb_samples: u64,

    #[arg(long, default_value = "0", help = "Seed of the first ranking; later rankings use the following seeds")]
    pub seed: u64,

    #[arg(long, short, default_value = ".", value_name = "OUT", help = "Output directory")]
    pub out: String,

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
            batch_size: self.nb_samples,
            confidence_mass: self.confidence_mass,
            prior_a: self.prior_a,
            prior_b: self.prior_b,
            hdi_method: self.hdi_method,
        }
    }

    pub fn output_file_name(&self) -> String {
        format!(
            "B{}{}_{}_{}_{:.6}_{}_tests.csv",
            self.prior_a as i64, self.prior_b as i64, self.prior_games, self.nb_samples, self.step, self.nbt
        )
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
