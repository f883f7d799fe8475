use anyhow::{bail, Result};
use bayesrank_utils::observation::BernoulliSource;
use bayesrank_utils::ranker::{rank, RankConfig, Side};
use log::debug;
use serde::Serialize;

/// Averages over all rankings run at one theta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    #[serde(rename = "Theta")]
    pub theta: f64,
    #[serde(rename = "Avg. A")]
    pub avg_wins_a: f64,
    #[serde(rename = "Avg. B")]
    pub avg_wins_b: f64,
    #[serde(rename = "Avg. generation")]
    pub avg_iterations: f64,
    /// Percentage of rankings won by A.
    #[serde(rename = "Ratio A winner")]
    pub ratio_a_winner: f64,
}

/// `0, step, 2 * step, ..` up to and including 1.
pub fn theta_grid(step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0 && step <= 1.0) {
        bail!("Theta step must be in (0, 1], got {}", step);
    }
    let n_steps = (1.0 / step + 1e-9).floor() as usize;
    Ok((0..=n_steps).map(|i| (i as f64 * step).min(1.0)).collect())
}

pub fn run_theta(config: &RankConfig, theta: f64, n_tests: usize, seed: u64) -> Result<SweepRow> {
    if n_tests == 0 {
        bail!("Need at least one test per theta");
    }
    let mut wins_a = 0u64;
    let mut wins_b = 0u64;
    let mut iterations = 0u64;
    let mut a_winner = 0usize;

    for test in 0..n_tests {
        let source = BernoulliSource::seeded(theta, seed.wrapping_add(test as u64))?;
        let verdict = rank(config, "TeamA", "TeamB", source)?;
        debug!("theta {:.3} test {}: {:?}", theta, test, verdict.outcome);
        wins_a += verdict.wins_a;
        wins_b += verdict.wins_b;
        iterations += verdict.iterations;
        if verdict.winner() == Some(Side::A) {
            a_winner += 1;
        }
    }

    let n = n_tests as f64;
    Ok(SweepRow {
        theta,
        avg_wins_a: wins_a as f64 / n,
        avg_wins_b: wins_b as f64 / n,
        avg_iterations: iterations as f64 / n,
        ratio_a_winner: a_winner as f64 * 100.0 / n,
    })
}
