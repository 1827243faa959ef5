use std::f64::consts::FRAC_PI_2;

use super::{
    described, load_settings, require_finite_sample, require_size,
    DistributionFactoryImplementation,
};
use crate::config::NumericalSettings;
use crate::distribution::{Distribution, NormalCopula};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::types::{Point, Sample};

/// Kendall tau inversion for [`NormalCopula`]: `Rᵢⱼ = sin(π τᵢⱼ / 2)`.
///
/// Only the ranks of the sample matter, so any marginal transform of the
/// data gives the same estimate.
#[derive(Debug, Clone, Default)]
pub struct NormalCopulaFactory {
    settings: NumericalSettings,
}

impl NormalCopulaFactory {
    /// Fit a normal copula of the sample's dimension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for fewer than two points or an estimated
    /// correlation matrix that is not positive definite.
    pub fn build_as_normal_copula(&self, sample: &Sample) -> Result<NormalCopula> {
        require_size(sample, 2, "NormalCopula")?;
        require_finite_sample(sample, "NormalCopula")?;
        let d = sample.dimension();
        let mut correlation = sample.compute_kendall_tau()?;
        for i in 0..d {
            for j in 0..i {
                correlation.set(i, j, (FRAC_PI_2 * correlation.get(i, j)).sin());
            }
        }
        let copula = NormalCopula::new(correlation).map_err(|error| {
            Error::invalid_argument(format!(
                "the Kendall tau estimate does not give a valid correlation matrix: {error}"
            ))
        })?;
        described(copula, sample)
    }

    /// Build from the lower triangle of the correlation matrix.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the length matches no dimension or the
    /// matrix is not positive definite.
    pub fn build_as_normal_copula_from_parameters(
        &self,
        parameter: &Point,
    ) -> Result<NormalCopula> {
        NormalCopula::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for NormalCopulaFactory {
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
        self.build_as_normal_copula(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_normal_copula_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(NormalCopula::default())
    }
}

impl PersistentObject for NormalCopulaFactory {
    const CLASS_NAME: &'static str = "NormalCopulaFactory";

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
    use crate::types::CovarianceMatrix;

    #[test]
    fn test_consistency() {
        let correlation = CovarianceMatrix::from_rows(&[
            vec![1.0, 0.5, -0.2],
            vec![0.5, 1.0, 0.1],
            vec![-0.2, 0.1, 1.0],
        ])
        .unwrap();
        let source = NormalCopula::new(correlation).unwrap();
        let mut rng = RandomGenerator::with_seed(14);
        let sample = source.get_sample(5000, &mut rng).unwrap();
        let fitted = NormalCopulaFactory::default()
            .build_as_normal_copula(&sample)
            .unwrap();
        for (estimate, exact) in fitted.parameter().iter().zip(source.parameter().iter()) {
            assert!((estimate - exact).abs() < 0.06, "{estimate} vs {exact}");
        }
    }

    #[test]
    fn test_invariant_under_monotone_transform() {
        let sample = Sample::from_rows(&[
            vec![0.1, 0.3],
            vec![0.4, 0.2],
            vec![0.5, 0.9],
            vec![0.8, 0.7],
        ])
        .unwrap();
        let transformed = Sample::from_rows(&[
            vec![0.1f64.exp(), 0.3f64.powi(3)],
            vec![0.4f64.exp(), 0.2f64.powi(3)],
            vec![0.5f64.exp(), 0.9f64.powi(3)],
            vec![0.8f64.exp(), 0.7f64.powi(3)],
        ])
        .unwrap();
        let factory = NormalCopulaFactory::default();
        let a = factory.build(&sample).unwrap();
        let b = factory.build(&transformed).unwrap();
        assert_eq!(a.parameter(), b.parameter());
        // τ = (4 - 2)/6, so R = sin(π/6)
        assert!((a.parameter()[0] - 0.5).abs() < 1e-12);
    }
}
