use thiserror::Error;

/// Failures of the ranking core.
///
/// A tie or a run without a winner is a verdict, not an error, so none of
/// these variants stand for an undecided match.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("Confidence mass must be strictly between 0 and 1 after rounding to two decimals, got {raw} (rounded: {rounded})")]
    InvalidConfidenceMass { raw: f64, rounded: f64 },

    #[error("A Beta distribution is only defined for parameters greater than 0, got a = {a}, b = {b}")]
    InvalidPrior { a: f64, b: f64 },

    #[error("Cannot observe {wins} wins in {trials} trials")]
    InvalidObservation { trials: u64, wins: u64 },

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Observation source returned {wins_a} + {wins_b} wins for a batch of {requested} trials")]
    ContractViolation {
        requested: u64,
        wins_a: u64,
        wins_b: u64,
    },

    #[error("HDI computation failed for Beta({a}, {b}) with mass {mass}: {reason}")]
    NumericFailure {
        a: f64,
        b: f64,
        mass: f64,
        reason: String,
    },

    #[error(transparent)]
    Observation(#[from] anyhow::Error),
}

impl RankError {
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RankError::InvalidConfidenceMass { .. }
                | RankError::InvalidPrior { .. }
                | RankError::InvalidObservation { .. }
                | RankError::InvalidBatchSize
        )
    }
}
