use crate::error::RankError;
use crate::hdi::{highest_density_interval, Hdi, HdiMethod};
use log::debug;
use statrs::distribution::Beta;

/// Target probability mass of the HDI.
///
/// The raw value is rounded to two decimals once; the Beta quantile can
/// fail on masses with long decimal tails.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ConfidenceMass(f64);

impl ConfidenceMass {
    pub fn new(raw: f64) -> Result<Self, RankError> {
        let rounded = (raw * 100.0).round() / 100.0;
        if !(rounded > 0.0 && rounded < 1.0) {
            return Err(RankError::InvalidConfidenceMass { raw, rounded });
        }
        Ok(Self(rounded))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Beta posterior over one competitor's win probability.
///
/// Values are immutable snapshots: `update` returns the next posterior and
/// leaves `self` untouched. The HDI is always derived from the current
/// shape parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaModel {
    id: String,
    prior_a: f64,
    prior_b: f64,
    a: f64,
    b: f64,
    wins: u64,
    trials: u64,
    confidence_mass: ConfidenceMass,
    method: HdiMethod,
    hdi: Hdi,
}

impl BetaModel {
    pub fn new(a: f64, b: f64, confidence_mass: ConfidenceMass, id: &str) -> Result<Self, RankError> {
        Self::with_method(a, b, confidence_mass, id, HdiMethod::default())
    }

    pub fn with_method(
        a: f64,
        b: f64,
        confidence_mass: ConfidenceMass,
        id: &str,
        method: HdiMethod,
    ) -> Result<Self, RankError> {
        if !(a > 0.0 && b > 0.0) || !a.is_finite() || !b.is_finite() {
            return Err(RankError::InvalidPrior { a, b });
        }
        let hdi = compute_hdi(a, b, confidence_mass, method)?;
        Ok(Self {
            id: id.to_string(),
            prior_a: a,
            prior_b: b,
            a,
            b,
            wins: 0,
            trials: 0,
            confidence_mass,
            method,
            hdi,
        })
    }

    /// Posterior after observing `wins` successes in `trials` trials.
    pub fn update(&self, trials: u64, wins: u64) -> Result<Self, RankError> {
        if wins > trials {
            return Err(RankError::InvalidObservation { trials, wins });
        }
        if trials == 0 {
            return Ok(self.clone());
        }
        let a = self.a + wins as f64;
        let b = self.b + (trials - wins) as f64;
        let hdi = compute_hdi(a, b, self.confidence_mass, self.method)?;
        debug!(
            "{}: Beta({}, {}) -> Beta({}, {}), HDI [{:.4}, {:.4}]",
            self.id, self.a, self.b, a, b, hdi.low, hdi.up
        );
        Ok(Self {
            a,
            b,
            wins: self.wins + wins,
            trials: self.trials + trials,
            hdi,
            ..self.clone()
        })
    }

    pub fn hdi(&self) -> Hdi {
        self.hdi
    }

    pub fn low_bound(&self) -> f64 {
        self.hdi.low
    }

    pub fn up_bound(&self) -> f64 {
        self.hdi.up
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wins observed since construction, i.e. `a - a0`.
    pub fn wins(&self) -> u64 {
        self.wins
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn prior(&self) -> (f64, f64) {
        (self.prior_a, self.prior_b)
    }

    pub fn confidence_mass(&self) -> ConfidenceMass {
        self.confidence_mass
    }

    pub fn mean(&self) -> f64 {
        self.a / (self.a + self.b)
    }
}

fn compute_hdi(a: f64, b: f64, mass: ConfidenceMass, method: HdiMethod) -> Result<Hdi, RankError> {
    let numeric_failure = |reason: String| RankError::NumericFailure {
        a,
        b,
        mass: mass.value(),
        reason,
    };
    let dist = Beta::new(a, b).map_err(|e| numeric_failure(e.to_string()))?;
    highest_density_interval(&dist, mass.value(), method.minimizer().as_ref())
        .map_err(|e| numeric_failure(e.to_string()))
}
