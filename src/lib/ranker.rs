use crate::error::RankError;
use crate::hdi::{Hdi, HdiMethod};
use crate::model::{BetaModel, ConfidenceMass};
use crate::observation::{MatchScore, Observation, ObservationSource};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use strum_macros::Display;

/// Tunables of one ranking run. Nothing else is read by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankConfig {
    /// Trials observed in one batch before the first stopping check.
    pub prior_games: u64,
    /// Additional batches allowed before the tie-break trial.
    pub max_iterations: u64,
    /// Trials per additional batch.
    pub batch_size: u64,
    /// Raw HDI mass, rounded to two decimals on validation.
    pub confidence_mass: f64,
    pub prior_a: f64,
    pub prior_b: f64,
    pub hdi_method: HdiMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Winner(Side),
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Prior,
    Iterating,
    Decided,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingVerdict {
    pub id_a: String,
    pub id_b: String,
    pub outcome: Outcome,
    /// Score of the fallback trial, if the budget ran out.
    pub tie_break: Option<MatchScore>,
    pub prior_games: u64,
    pub iterations: u64,
    pub additional_trials: u64,
    pub wins_a: u64,
    pub wins_b: u64,
    pub hdi_a: Hdi,
    pub hdi_b: Hdi,
}

impl RankingVerdict {
    pub fn winner(&self) -> Option<Side> {
        match self.outcome {
            Outcome::Winner(side) => Some(side),
            Outcome::Tie => None,
        }
    }

    pub fn winner_id(&self) -> Option<&str> {
        self.winner().map(|side| match side {
            Side::A => self.id_a.as_str(),
            Side::B => self.id_b.as_str(),
        })
    }

    pub fn is_tie(&self) -> bool {
        self.outcome == Outcome::Tie
    }

    /// True when the HDIs never separated and the fallback trial decided.
    pub fn decided_by_tie_break(&self) -> bool {
        self.tie_break.is_some()
    }

    pub fn total_trials(&self) -> u64 {
        self.prior_games + self.additional_trials
    }
}

impl fmt::Display for RankingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.winner_id() {
            Some(id) => writeln!(f, "Winner: {}", id)?,
            None => writeln!(f, "Teams have equivalent performance")?,
        }
        writeln!(
            f,
            "Evaluated among {} prior games plus {} additional games",
            self.prior_games, self.additional_trials
        )?;
        write!(
            f,
            "{} won {}, {} won {} of {} games",
            self.id_a,
            self.wins_a,
            self.id_b,
            self.wins_b,
            self.total_trials()
        )
    }
}

/// Side whose HDI lies strictly above the other's, if any.
pub fn separation(a: &BetaModel, b: &BetaModel) -> Option<Side> {
    if a.low_bound() > b.up_bound() {
        Some(Side::A)
    } else if a.up_bound() < b.low_bound() {
        Some(Side::B)
    } else {
        None
    }
}

/// Step-wise sequential ranking of two competitors.
///
/// Each call to [`SequentialRanker::step`] performs exactly one transition
/// of the `Prior -> Iterating -> Decided` machine.
pub struct SequentialRanker<S: ObservationSource> {
    source: S,
    model_a: BetaModel,
    model_b: BetaModel,
    prior_games: u64,
    max_iterations: u64,
    batch_size: u64,
    iterations: u64,
    additional_trials: u64,
    phase: Phase,
    outcome: Option<Outcome>,
    tie_break: Option<MatchScore>,
}

impl<S: ObservationSource> SequentialRanker<S> {
    /// Validates the configuration and builds both priors. The source is not
    /// touched until the first step.
    pub fn new(config: &RankConfig, id_a: &str, id_b: &str, source: S) -> Result<Self, RankError> {
        let mass = ConfidenceMass::new(config.confidence_mass)?;
        if config.batch_size == 0 {
            return Err(RankError::InvalidBatchSize);
        }
        let model_a = BetaModel::with_method(config.prior_a, config.prior_b, mass, id_a, config.hdi_method)?;
        let model_b = BetaModel::with_method(config.prior_a, config.prior_b, mass, id_b, config.hdi_method)?;
        Ok(Self {
            source,
            model_a,
            model_b,
            prior_games: config.prior_games,
            max_iterations: config.max_iterations,
            batch_size: config.batch_size,
            iterations: 0,
            additional_trials: 0,
            phase: Phase::Prior,
            outcome: None,
            tie_break: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn model_a(&self) -> &BetaModel {
        &self.model_a
    }

    pub fn model_b(&self) -> &BetaModel {
        &self.model_b
    }

    pub fn step(&mut self) -> Result<Phase, RankError> {
        match self.phase {
            Phase::Prior => {
                let observation = if self.prior_games > 0 {
                    self.request(self.prior_games)?
                } else {
                    Observation {
                        trials: 0,
                        wins_a: 0,
                        wins_b: 0,
                    }
                };
                self.apply(observation)?;
                self.phase = Phase::Iterating;
            }
            Phase::Iterating => {
                if let Some(side) = separation(&self.model_a, &self.model_b) {
                    self.decide(Outcome::Winner(side));
                } else if self.iterations < self.max_iterations {
                    let observation = self.request(self.batch_size)?;
                    self.apply(observation)?;
                    self.iterations += 1;
                    self.additional_trials += observation.trials;
                    debug!(
                        "Iteration {}: {} [{:.4}, {:.4}] vs {} [{:.4}, {:.4}]",
                        self.iterations,
                        self.model_a.id(),
                        self.model_a.low_bound(),
                        self.model_a.up_bound(),
                        self.model_b.id(),
                        self.model_b.low_bound(),
                        self.model_b.up_bound()
                    );
                } else {
                    warn!(
                        "No separation between {} and {} after {} iterations, playing a tie-break",
                        self.model_a.id(),
                        self.model_b.id(),
                        self.iterations
                    );
                    let score = self.source.tie_break()?;
                    self.tie_break = Some(score);
                    let outcome = match score.a.cmp(&score.b) {
                        std::cmp::Ordering::Greater => Outcome::Winner(Side::A),
                        std::cmp::Ordering::Equal => Outcome::Tie,
                        std::cmp::Ordering::Less => Outcome::Winner(Side::B),
                    };
                    self.decide(outcome);
                }
            }
            Phase::Decided => {}
        }
        Ok(self.phase)
    }

    pub fn verdict(&self) -> Option<RankingVerdict> {
        let outcome = self.outcome?;
        Some(RankingVerdict {
            id_a: self.model_a.id().to_string(),
            id_b: self.model_b.id().to_string(),
            outcome,
            tie_break: self.tie_break,
            prior_games: self.prior_games,
            iterations: self.iterations,
            additional_trials: self.additional_trials,
            wins_a: self.model_a.wins(),
            wins_b: self.model_b.wins(),
            hdi_a: self.model_a.hdi(),
            hdi_b: self.model_b.hdi(),
        })
    }

    fn request(&mut self, batch_size: u64) -> Result<Observation, RankError> {
        let observation = self.source.generate(batch_size)?;
        if observation.trials != batch_size || !observation.is_consistent() {
            return Err(RankError::ContractViolation {
                requested: batch_size,
                wins_a: observation.wins_a,
                wins_b: observation.wins_b,
            });
        }
        Ok(observation)
    }

    fn apply(&mut self, observation: Observation) -> Result<(), RankError> {
        let model_a = self.model_a.update(observation.trials, observation.wins_a)?;
        let model_b = self.model_b.update(observation.trials, observation.wins_b)?;
        self.model_a = model_a;
        self.model_b = model_b;
        Ok(())
    }

    fn decide(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Winner(side) => {
                let winner = match side {
                    Side::A => self.model_a.id(),
                    Side::B => self.model_b.id(),
                };
                info!("{} ranked above its opponent after {} iterations", winner, self.iterations);
            }
            Outcome::Tie => info!(
                "{} and {} have equivalent performance",
                self.model_a.id(),
                self.model_b.id()
            ),
        }
        self.outcome = Some(outcome);
        self.phase = Phase::Decided;
    }
}

/// Runs a full ranking between `id_a` and `id_b`.
pub fn rank<S: ObservationSource>(
    config: &RankConfig,
    id_a: &str,
    id_b: &str,
    source: S,
) -> Result<RankingVerdict, RankError> {
    let mut ranker = SequentialRanker::new(config, id_a, id_b, source)?;
    loop {
        if let Some(verdict) = ranker.verdict() {
            return Ok(verdict);
        }
        ranker.step()?;
    }
}
