use anyhow::{bail, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Outcome of a batch of trials between competitors A and B. Every trial
/// has a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub trials: u64,
    pub wins_a: u64,
    pub wins_b: u64,
}

impl Observation {
    pub fn new(trials: u64, wins_a: u64) -> Result<Self> {
        if wins_a > trials {
            bail!("Cannot observe {} wins in {} trials", wins_a, trials);
        }
        Ok(Self {
            trials,
            wins_a,
            wins_b: trials - wins_a,
        })
    }

    pub fn is_consistent(&self) -> bool {
        self.wins_a.checked_add(self.wins_b) == Some(self.trials)
    }
}

/// Raw score of a single tie-break trial. Both sides may score the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub a: u64,
    pub b: u64,
}

impl From<Observation> for MatchScore {
    fn from(observation: Observation) -> Self {
        Self {
            a: observation.wins_a,
            b: observation.wins_b,
        }
    }
}

/// Produces trial outcomes for a pair of competitors.
pub trait ObservationSource {
    /// Play `batch_size` (>= 1) trials; `wins_a + wins_b` must equal
    /// `batch_size`.
    fn generate(&mut self, batch_size: u64) -> Result<Observation>;

    /// Play the single last-resort trial.
    fn tie_break(&mut self) -> Result<MatchScore> {
        Ok(self.generate(1)?.into())
    }
}

impl<S: ObservationSource + ?Sized> ObservationSource for &mut S {
    fn generate(&mut self, batch_size: u64) -> Result<Observation> {
        (**self).generate(batch_size)
    }

    fn tie_break(&mut self) -> Result<MatchScore> {
        (**self).tie_break()
    }
}

impl<S: ObservationSource + ?Sized> ObservationSource for Box<S> {
    fn generate(&mut self, batch_size: u64) -> Result<Observation> {
        (**self).generate(batch_size)
    }

    fn tie_break(&mut self) -> Result<MatchScore> {
        (**self).tie_break()
    }
}

/// Each trial is won by A with probability `theta`.
pub struct BernoulliSource {
    theta: f64,
    rng: StdRng,
}

impl BernoulliSource {
    pub fn new(theta: f64, rng: StdRng) -> Result<Self> {
        if !(0.0..=1.0).contains(&theta) {
            bail!("Win probability must be in [0, 1], got {}", theta);
        }
        Ok(Self { theta, rng })
    }

    pub fn seeded(theta: f64, seed: u64) -> Result<Self> {
        Self::new(theta, StdRng::seed_from_u64(seed))
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl ObservationSource for BernoulliSource {
    fn generate(&mut self, batch_size: u64) -> Result<Observation> {
        let wins_a = (0..batch_size)
            .filter(|_| self.rng.gen_bool(self.theta))
            .count() as u64;
        debug!("Bernoulli({}) batch: {} of {} won by A", self.theta, wins_a, batch_size);
        Observation::new(batch_size, wins_a)
    }
}
