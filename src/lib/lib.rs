//! Sequential Bayesian ranking of two competitors from win/lose trials.
//!
//! Each competitor's win probability is a Beta posterior. Trials are
//! requested until the highest density intervals of the two posteriors
//! separate, or until the iteration budget runs out and a single tie-break
//! trial decides.

pub mod error;
pub mod hdi;
pub mod model;
pub mod observation;
pub mod ranker;
pub mod simulator;
pub mod tournament;

pub use error::RankError;
pub use model::{BetaModel, ConfidenceMass};
pub use observation::{MatchScore, Observation, ObservationSource};
pub use ranker::{rank, Outcome, RankConfig, RankingVerdict, SequentialRanker, Side};
