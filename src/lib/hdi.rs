use log::debug;
use serde::Serialize;
use statrs::distribution::ContinuousCDF;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Highest density interval `[low, up]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hdi {
    pub low: f64,
    pub up: f64,
}

impl Hdi {
    pub fn width(&self) -> f64 {
        self.up - self.low
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.low, self.up)
    }
}

#[derive(Debug, Error)]
pub enum MinimizeError {
    #[error("objective is not finite at the start point {0}")]
    NonFiniteStart(f64),
    #[error("no convergence after {0} iterations")]
    MaxIterations(usize),
}

#[derive(Debug, Error)]
pub enum HdiError {
    #[error("minimizer failed: {0}")]
    Minimizer(#[from] MinimizeError),
    #[error("objective is not finite at lower tail mass {0}")]
    NonFiniteWidth(f64),
    #[error("degenerate interval [{low}, {up}]")]
    InvalidInterval { low: f64, up: f64 },
}

/// One dimensional minimizer over a closed interval.
///
/// `f` may return `f64::INFINITY` to mark points that must not be chosen.
pub trait Minimizer {
    fn minimize(
        &self,
        f: &dyn Fn(f64) -> f64,
        lower: f64,
        upper: f64,
        start: f64,
    ) -> Result<f64, MinimizeError>;
}

/// Downhill simplex in one dimension.
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    pub xtol: f64,
    pub ftol: f64,
    pub max_iter: usize,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            xtol: 1e-4,
            ftol: 1e-8,
            max_iter: 400,
        }
    }
}

impl NelderMead {
    const REFLECT: f64 = 1.0;
    const EXPAND: f64 = 2.0;
    const CONTRACT: f64 = 0.5;
    const SHRINK: f64 = 0.5;
}

impl Minimizer for NelderMead {
    fn minimize(
        &self,
        f: &dyn Fn(f64) -> f64,
        lower: f64,
        upper: f64,
        start: f64,
    ) -> Result<f64, MinimizeError> {
        let bounded = |x: f64| {
            if x < lower || x > upper {
                f64::INFINITY
            } else {
                f(x)
            }
        };

        let f_start = bounded(start);
        if !f_start.is_finite() {
            return Err(MinimizeError::NonFiniteStart(start));
        }
        let second = if start != 0.0 { start * 1.05 } else { 0.00025 };
        // simplex[0] is always the best vertex
        let mut simplex = [(start, f_start), (second, bounded(second))];

        for iteration in 0..self.max_iter {
            if simplex[1].1 < simplex[0].1 {
                simplex.swap(0, 1);
            }
            let (best, f_best) = simplex[0];
            let (worst, f_worst) = simplex[1];

            if (worst - best).abs() <= self.xtol && (f_worst - f_best).abs() <= self.ftol {
                debug!("Nelder-Mead converged after {} iterations at {}", iteration, best);
                return Ok(best);
            }

            // With a single free parameter the centroid is the best vertex.
            let centroid = best;
            let reflected = centroid + Self::REFLECT * (centroid - worst);
            let f_reflected = bounded(reflected);

            if f_reflected < f_best {
                let expanded = centroid + Self::EXPAND * (reflected - centroid);
                let f_expanded = bounded(expanded);
                simplex[1] = if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                };
                continue;
            }

            let shrink = if f_reflected < f_worst {
                let contracted = centroid + Self::CONTRACT * (reflected - centroid);
                let f_contracted = bounded(contracted);
                if f_contracted <= f_reflected {
                    simplex[1] = (contracted, f_contracted);
                    false
                } else {
                    true
                }
            } else {
                let contracted = centroid + Self::CONTRACT * (worst - centroid);
                let f_contracted = bounded(contracted);
                if f_contracted < f_worst {
                    simplex[1] = (contracted, f_contracted);
                    false
                } else {
                    true
                }
            };

            if shrink {
                let shrunk = best + Self::SHRINK * (worst - best);
                simplex[1] = (shrunk, bounded(shrunk));
            }
        }
        Err(MinimizeError::MaxIterations(self.max_iter))
    }
}

/// Golden-section search. Ignores the start point and assumes `f` is
/// unimodal on `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct GoldenSection {
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for GoldenSection {
    fn default() -> Self {
        Self {
            tol: 1e-10,
            max_iter: 200,
        }
    }
}

impl Minimizer for GoldenSection {
    fn minimize(
        &self,
        f: &dyn Fn(f64) -> f64,
        lower: f64,
        upper: f64,
        _start: f64,
    ) -> Result<f64, MinimizeError> {
        let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
        let (mut lo, mut hi) = (lower, upper);
        let mut x1 = hi - inv_phi * (hi - lo);
        let mut x2 = lo + inv_phi * (hi - lo);
        let mut f1 = f(x1);
        let mut f2 = f(x2);

        for _ in 0..self.max_iter {
            if (hi - lo).abs() <= self.tol {
                return Ok((lo + hi) / 2.0);
            }
            if f1 <= f2 {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - inv_phi * (hi - lo);
                f1 = f(x1);
            } else {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + inv_phi * (hi - lo);
                f2 = f(x2);
            }
        }
        Err(MinimizeError::MaxIterations(self.max_iter))
    }
}

/// Built-in minimizers selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum HdiMethod {
    #[default]
    NelderMead,
    GoldenSection,
}

impl HdiMethod {
    pub fn minimizer(&self) -> Box<dyn Minimizer> {
        match self {
            HdiMethod::NelderMead => Box::new(NelderMead::default()),
            HdiMethod::GoldenSection => Box::new(GoldenSection::default()),
        }
    }
}

/// Narrowest interval holding `mass` of `dist`.
///
/// Candidate intervals are `[Q(t), Q(t + mass)]` for lower tail masses
/// `t` in `[0, 1 - mass]`. The minimizer starts at `t = 1 - mass`; both
/// endpoints are compared against its answer.
pub fn highest_density_interval<D>(
    dist: &D,
    mass: f64,
    minimizer: &dyn Minimizer,
) -> Result<Hdi, HdiError>
where
    D: ContinuousCDF<f64, f64>,
{
    let max_tail = 1.0 - mass;
    let interval = |tail: f64| {
        let low = dist.inverse_cdf(tail.clamp(0.0, 1.0));
        let up = dist.inverse_cdf((tail + mass).clamp(0.0, 1.0));
        (low, up)
    };
    let width = |tail: f64| {
        if !(0.0..=max_tail).contains(&tail) {
            return f64::INFINITY;
        }
        let (low, up) = interval(tail);
        up - low
    };

    let optimum = minimizer.minimize(&width, 0.0, max_tail, max_tail)?;

    let mut best_tail = optimum;
    let mut best_width = width(optimum);
    for candidate in [0.0, max_tail] {
        let candidate_width = width(candidate);
        if candidate_width < best_width {
            best_tail = candidate;
            best_width = candidate_width;
        }
    }
    if !best_width.is_finite() {
        return Err(HdiError::NonFiniteWidth(best_tail));
    }

    let (low, up) = interval(best_tail);
    if !(low.is_finite() && up.is_finite() && 0.0 <= low && low < up && up <= 1.0) {
        return Err(HdiError::InvalidInterval { low, up });
    }
    Ok(Hdi { low, up })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::Beta;

    fn naive_width(dist: &Beta, mass: f64) -> f64 {
        dist.inverse_cdf(mass) - dist.inverse_cdf(0.0)
    }

    #[test]
    fn test_nelder_mead_parabola() {
        let f = |x: f64| (x - 0.3).powi(2);
        let x = NelderMead::default().minimize(&f, 0.0, 1.0, 0.9).unwrap();
        assert!((x - 0.3).abs() < 1e-3, "got {}", x);
    }

    #[test]
    fn test_nelder_mead_respects_bounds() {
        // unconstrained minimum lies outside the interval
        let f = |x: f64| (x + 1.0).powi(2);
        let x = NelderMead::default().minimize(&f, 0.0, 0.5, 0.5).unwrap();
        assert!((0.0..=0.5).contains(&x));
        assert!(x < 1e-3, "got {}", x);
    }

    #[test]
    fn test_nelder_mead_rejects_infeasible_start() {
        let f = |x: f64| x;
        let result = NelderMead::default().minimize(&f, 0.0, 1.0, 2.0);
        assert!(matches!(result, Err(MinimizeError::NonFiniteStart(_))));
    }

    #[test]
    fn test_nelder_mead_max_iterations() {
        let nm = NelderMead {
            xtol: 0.0,
            ftol: 0.0,
            max_iter: 3,
        };
        let f = |x: f64| (x - 0.3).powi(2);
        let result = nm.minimize(&f, 0.0, 1.0, 0.9);
        assert!(matches!(result, Err(MinimizeError::MaxIterations(3))));
    }

    #[test]
    fn test_golden_section_parabola() {
        let f = |x: f64| (x - 0.7).powi(2);
        let x = GoldenSection::default().minimize(&f, 0.0, 1.0, 0.0).unwrap();
        assert!((x - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_beta_hdi_is_central() {
        let dist = Beta::new(10.0, 10.0).unwrap();
        let hdi = highest_density_interval(&dist, 0.95, &NelderMead::default()).unwrap();
        let central_low = dist.inverse_cdf(0.025);
        let central_up = dist.inverse_cdf(0.975);
        assert!((hdi.low - central_low).abs() < 1e-3);
        assert!((hdi.up - central_up).abs() < 1e-3);
        assert!((hdi.low + hdi.up - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_hdi_holds_requested_mass() {
        let dist = Beta::new(7.0, 3.0).unwrap();
        let hdi = highest_density_interval(&dist, 0.9, &NelderMead::default()).unwrap();
        let covered = dist.cdf(hdi.up) - dist.cdf(hdi.low);
        assert!((covered - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_hdi_no_wider_than_naive_interval() {
        for (a, b) in [(2.0, 2.0), (7.0, 3.0), (2.0, 30.0), (0.5, 0.5), (1.0, 4.0), (50.0, 2.0)] {
            let dist = Beta::new(a, b).unwrap();
            for mass in [0.5, 0.8, 0.95, 0.99] {
                let hdi = highest_density_interval(&dist, mass, &NelderMead::default()).unwrap();
                assert!(hdi.low < hdi.up);
                assert!(0.0 <= hdi.low && hdi.up <= 1.0);
                assert!(
                    hdi.width() <= naive_width(&dist, mass) + 1e-12,
                    "Beta({}, {}) mass {}",
                    a,
                    b,
                    mass
                );
            }
        }
    }

    #[test]
    fn test_hdi_endpoints_match_density() {
        // at the optimum the density is equal on both ends
        let dist = Beta::new(4.0, 9.0).unwrap();
        let hdi = highest_density_interval(&dist, 0.95, &NelderMead::default()).unwrap();
        use statrs::distribution::Continuous;
        let ratio = dist.pdf(hdi.low) / dist.pdf(hdi.up);
        assert!((ratio - 1.0).abs() < 0.1, "density ratio {}", ratio);
    }

    #[test]
    fn test_methods_agree() {
        let dist = Beta::new(12.0, 5.0).unwrap();
        let nm = highest_density_interval(&dist, 0.95, HdiMethod::NelderMead.minimizer().as_ref()).unwrap();
        let gs = highest_density_interval(&dist, 0.95, HdiMethod::GoldenSection.minimizer().as_ref()).unwrap();
        assert!((nm.low - gs.low).abs() < 1e-3);
        assert!((nm.up - gs.up).abs() < 1e-3);
    }

    #[test]
    fn test_hdi_method_from_str() {
        assert_eq!("nelder-mead".parse::<HdiMethod>().unwrap(), HdiMethod::NelderMead);
        assert_eq!("golden-section".parse::<HdiMethod>().unwrap(), HdiMethod::GoldenSection);
        assert!("simplex".parse::<HdiMethod>().is_err());
        assert_eq!(HdiMethod::GoldenSection.to_string(), "golden-section");
    }

    struct Failing;
    impl Minimizer for Failing {
        fn minimize(&self, _: &dyn Fn(f64) -> f64, _: f64, _: f64, _: f64) -> Result<f64, MinimizeError> {
            Err(MinimizeError::MaxIterations(0))
        }
    }

    #[test]
    fn test_minimizer_failure_is_surfaced() {
        let dist = Beta::new(2.0, 2.0).unwrap();
        let result = highest_density_interval(&dist, 0.95, &Failing);
        assert!(matches!(result, Err(HdiError::Minimizer(_))));
    }
}
