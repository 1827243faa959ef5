use log::debug;

use super::{
    described, load_settings, require_finite_sample, require_univariate, scalar_moments,
    DistributionFactoryImplementation,
};
use crate::config::NumericalSettings;
use crate::distribution::{Distribution, DistributionImplementation, TruncatedNormal};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::types::{Point, Sample};

/// Largest number of step halvings in one damped Newton iteration.
const MAX_HALVINGS: usize = 30;

/// Residual norm under which the moment equations count as solved.
const RESIDUAL_TOLERANCE: f64 = 1e-10;

/// Method of moments for [`TruncatedNormal`].
///
/// The bounds are the sample extremes widened by `range/(n + 1)` on each
/// side. The data are mapped onto `[-1, 1]` and `(μ, ln σ)` is found by a
/// damped Newton iteration on the mean and standard deviation equations,
/// with a central finite-difference Jacobian.
#[derive(Debug, Clone, Default)]
pub struct TruncatedNormalFactory {
    settings: NumericalSettings,
}

/// Mean and standard deviation of `TN(μ, e^τ, a, b)`, or `None` outside the
/// family's domain.
fn truncated_moments(mu: f64, tau: f64, a: f64, b: f64) -> Option<(f64, f64)> {
    let candidate = TruncatedNormal::new(mu, tau.exp(), a, b).ok()?;
    let mean = candidate.compute_mean().ok()?[0];
    let variance = candidate.compute_covariance().ok()?.get(0, 0);
    (variance > 0.0 && mean.is_finite()).then(|| (mean, variance.sqrt()))
}

impl TruncatedNormalFactory {
    /// Fit a truncated normal distribution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate, constant or too small
    /// sample and `NumericalConvergence` if the moment equations cannot be
    /// solved.
    pub fn build_as_truncated_normal(&self, sample: &Sample) -> Result<TruncatedNormal> {
        require_univariate(sample, 2, "TruncatedNormal")?;
        require_finite_sample(sample, "TruncatedNormal")?;
        let x_min = sample.min()?[0];
        let x_max = sample.max()?[0];
        if x_max <= x_min {
            return Err(Error::invalid_argument(
                "cannot build a TruncatedNormal distribution from a constant sample",
            ));
        }
        // y = scale·x - shift maps [x_min, x_max] onto [-1, 1]
        let scale = 2.0 / (x_max - x_min);
        let shift = (x_min + x_max) / (x_max - x_min);
        let (mean, sd, _) = scalar_moments(sample)?;
        let (target_mean, target_sd) = (scale * mean - shift, scale * sd);
        let margin = 2.0 / (sample.size() as f64 + 1.0);
        let (a, b) = (-1.0 - margin, 1.0 + margin);

        let residual = |mu: f64, tau: f64| {
            truncated_moments(mu, tau, a, b).map(|(m, s)| [m - target_mean, s - target_sd])
        };
        let norm = |r: [f64; 2]| r[0].hypot(r[1]);

        let (mut mu, mut tau) = (target_mean, target_sd.ln());
        let mut current = residual(mu, tau).ok_or_else(|| {
            Error::invalid_argument("sample moments give an invalid starting point")
        })?;
        let max_iterations = self.settings.quantile_iterations;
        let mut iteration = 0;
        while norm(current) > RESIDUAL_TOLERANCE {
            if iteration == max_iterations {
                return Err(Error::convergence(
                    "TruncatedNormalFactory",
                    iteration,
                    format!("moment residual {:e} after the iteration cap", norm(current)),
                ));
            }
            iteration += 1;
            let h = 1e-6;
            let jacobian_column = |dmu: f64, dtau: f64| -> Result<[f64; 2]> {
                let plus = residual(mu + dmu, tau + dtau);
                let minus = residual(mu - dmu, tau - dtau);
                match (plus, minus) {
                    (Some(p), Some(m)) => Ok([(p[0] - m[0]) / (2.0 * h), (p[1] - m[1]) / (2.0 * h)]),
                    _ => Err(Error::convergence(
                        "TruncatedNormalFactory",
                        iteration,
                        "moments undefined near the current iterate",
                    )),
                }
            };
            let d_mu = jacobian_column(h, 0.0)?;
            let d_tau = jacobian_column(0.0, h)?;
            let det = d_mu[0] * d_tau[1] - d_tau[0] * d_mu[1];
            if det == 0.0 || !det.is_finite() {
                return Err(Error::convergence(
                    "TruncatedNormalFactory",
                    iteration,
                    "singular Jacobian",
                ));
            }
            let step_mu = (current[0] * d_tau[1] - d_tau[0] * current[1]) / det;
            let step_tau = (d_mu[0] * current[1] - current[0] * d_mu[1]) / det;

            let mut damping = 1.0;
            let mut accepted = None;
            for _ in 0..=MAX_HALVINGS {
                let (next_mu, next_tau) = (mu - damping * step_mu, tau - damping * step_tau);
                if let Some(next) = residual(next_mu, next_tau) {
                    if norm(next) < norm(current) {
                        accepted = Some((next_mu, next_tau, next));
                        break;
                    }
                }
                damping *= 0.5;
            }
            let Some((next_mu, next_tau, next)) = accepted else {
                return Err(Error::convergence(
                    "TruncatedNormalFactory",
                    iteration,
                    format!("no descent step from residual {:e}", norm(current)),
                ));
            };
            debug!(
                "TruncatedNormal Newton iteration {iteration}: damping {damping}, residual {:e}",
                norm(next)
            );
            mu = next_mu;
            tau = next_tau;
            current = next;
        }

        let truncated = TruncatedNormal::new(
            (mu + shift) / scale,
            tau.exp() / scale,
            (a + shift) / scale,
            (b + shift) / scale,
        )
        .map_err(|_| {
            Error::invalid_argument("the estimated TruncatedNormal parameters are not valid")
        })?;
        described(truncated, sample)
    }

    /// Build from `[μ, σ, a, b]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for invalid values.
    pub fn build_as_truncated_normal_from_parameters(
        &self,
        parameter: &Point,
    ) -> Result<TruncatedNormal> {
        TruncatedNormal::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for TruncatedNormalFactory {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn DistributionFactoryImplementation> {
        Box::new(self.clone())
    }

    fn settings(&self) -> &NumericalSettings {
        &self.settings
    }

    fn set_settings(&mut self, settings: NumericalSettings) {
        self.settings = settings;
    }

    fn build(&self, sample: &Sample) -> Result<Distribution> {
        self.build_as_truncated_normal(sample)
            .map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_truncated_normal_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(TruncatedNormal::default())
    }
}

impl PersistentObject for TruncatedNormalFactory {
    const CLASS_NAME: &'static str = "TruncatedNormalFactory";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionFactoryImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        Ok(Self {
            settings: load_settings(advocate, Self::CLASS_NAME)?,
        })
    }
}
