use log::debug;

use super::{
    described, load_settings, require_finite_sample, require_size,
    DistributionFactoryImplementation,
};
use crate::config::NumericalSettings;
use crate::distribution::{Dirichlet, Distribution};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::special::{digamma, inverse_digamma};
use crate::types::{Point, Sample};

/// Iteration cap of the fixed point.
const MAX_ITERATIONS: usize = 10_000;

/// Relative change of `θ` under which the fixed point has converged.
const RELATIVE_TOLERANCE: f64 = 1e-10;

/// Maximum likelihood for [`Dirichlet`] by Minka's fixed point
/// `θₖ ← ψ⁻¹(ψ(Σθ) + mean ln xₖ)`, started from the moment estimate.
///
/// The sample holds the first `d` coordinates of each observation; the last
/// one is `1 - Σxᵢ`.
#[derive(Debug, Clone, Default)]
pub struct DirichletFactory {
    settings: NumericalSettings,
}

impl DirichletFactory {
    /// Fit a Dirichlet distribution of the sample's dimension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for fewer than two points or a point outside
    /// the open simplex, and `NumericalConvergence` if the fixed point does
    /// not converge.
    pub fn build_as_dirichlet(&self, sample: &Sample) -> Result<Dirichlet> {
        require_size(sample, 2, "Dirichlet")?;
        require_finite_sample(sample, "Dirichlet")?;
        let d = sample.dimension();
        let n = sample.size() as f64;
        // mean log of the d + 1 coordinates, first and second raw moment of x₀
        let mut mean_log = vec![0.0; d + 1];
        let mut mean = vec![0.0; d + 1];
        let mut second_moment = 0.0;
        for point in sample.points() {
            let last = 1.0 - point.iter().sum::<f64>();
            if point.iter().any(|&x| x <= 0.0) || last <= 0.0 {
                return Err(Error::invalid_argument(format!(
                    "can build a Dirichlet distribution only from points of the open simplex, got {point}"
                )));
            }
            for (k, x) in point.iter().copied().chain(std::iter::once(last)).enumerate() {
                mean_log[k] += x.ln() / n;
                mean[k] += x / n;
            }
            second_moment += point[0] * point[0] / n;
        }

        // E[x₀²] - m₀² = m₀(1 - m₀)/(s + 1)
        let spread = second_moment - mean[0] * mean[0];
        let precision = if spread > 0.0 {
            mean[0] * (1.0 - mean[0]) / spread - 1.0
        } else {
            0.0
        };
        let precision = if precision.is_finite() && precision > 0.0 {
            precision
        } else {
            (d + 1) as f64
        };
        let mut theta: Vec<f64> = mean.iter().map(|m| precision * m).collect();

        let mut iteration = 0;
        loop {
            if iteration == MAX_ITERATIONS {
                return Err(Error::convergence(
                    "DirichletFactory",
                    iteration,
                    "fixed point did not converge",
                ));
            }
            iteration += 1;
            let psi_total = digamma(theta.iter().sum());
            let mut change: f64 = 0.0;
            for (t, log_mean) in theta.iter_mut().zip(&mean_log) {
                let next = inverse_digamma(psi_total + log_mean);
                change = change.max(((next - *t) / *t).abs());
                *t = next;
            }
            if !change.is_finite() {
                return Err(Error::convergence(
                    "DirichletFactory",
                    iteration,
                    "fixed point diverged",
                ));
            }
            if change < RELATIVE_TOLERANCE {
                break;
            }
        }
        debug!("Dirichlet fixed point converged after {iteration} iterations");
        described(Dirichlet::new(Point::from_vec(theta))?, sample)
    }

    /// Build from the `d + 1` concentration parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless there are at least two positive
    /// parameters.
    pub fn build_as_dirichlet_from_parameters(&self, parameter: &Point) -> Result<Dirichlet> {
        Dirichlet::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for DirichletFactory {
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
        self.build_as_dirichlet(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_dirichlet_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(Dirichlet::default())
    }
}

impl PersistentObject for DirichletFactory {
    const CLASS_NAME: &'static str = "DirichletFactory";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionFactoryImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        Ok(Self {
            settings: load_settings(advocate, Self::CLASS_NAME)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionImplementation;
    use crate::random::RandomGenerator;

    #[test]
    fn test_consistency() {
        let source = Dirichlet::new(Point::from_vec(vec![2.0, 3.0, 5.0])).unwrap();
        let mut rng = RandomGenerator::with_seed(13);
        let sample = source.get_sample(10_000, &mut rng).unwrap();
        let fitted = DirichletFactory::default().build_as_dirichlet(&sample).unwrap();
        assert_eq!(fitted.dimension(), 2);
        for (estimate, exact) in fitted.theta().iter().zip([2.0, 3.0, 5.0]) {
            assert!((estimate - exact).abs() < 0.1 * exact, "{estimate} vs {exact}");
        }
    }

    #[test]
    fn test_likelihood_equations_hold() {
        let sample = Sample::from_rows(&[
            vec![0.2, 0.3],
            vec![0.1, 0.6],
            vec![0.4, 0.4],
            vec![0.3, 0.2],
            vec![0.25, 0.5],
        ])
        .unwrap();
        let fitted = DirichletFactory::default().build_as_dirichlet(&sample).unwrap();
        let theta = fitted.theta();
        let psi_total = digamma(theta.iter().sum());
        let mean_log_x0 = sample.column(0).iter().map(|x| x.ln()).sum::<f64>() / 5.0;
        assert!((digamma(theta[0]) - psi_total - mean_log_x0).abs() < 1e-8);
    }

    #[test]
    fn test_rejects_points_outside_simplex() {
        let sample = Sample::from_rows(&[vec![0.5, 0.6], vec![0.1, 0.2]]).unwrap();
        assert!(DirichletFactory::default()
            .build(&sample)
            .unwrap_err()
            .is_invalid_argument());
    }
}
