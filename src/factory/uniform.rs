use super::{
    described, load_settings, require_finite_sample, require_univariate, scalar_moments,
    DistributionFactoryImplementation,
};
use crate::config::NumericalSettings;
use crate::distribution::{Distribution, Uniform};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::types::{Point, Sample};

/// Method of moments for [`Uniform`]: `a, b = mean ∓ √3·sd`.
#[derive(Debug, Clone, Default)]
pub struct UniformFactory {
    settings: NumericalSettings,
}

impl UniformFactory {
    /// Fit a uniform distribution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate sample, fewer than two
    /// points or a constant sample.
    pub fn build_as_uniform(&self, sample: &Sample) -> Result<Uniform> {
        require_univariate(sample, 2, "Uniform")?;
        require_finite_sample(sample, "Uniform")?;
        let (mean, sd, _) = scalar_moments(sample)?;
        if sd <= 0.0 {
            return Err(Error::invalid_argument(
                "cannot build a Uniform distribution from a constant sample",
            ));
        }
        let half_width = 3.0f64.sqrt() * sd;
        described(Uniform::new(mean - half_width, mean + half_width)?, sample)
    }

    /// Build from `[a, b]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless `a < b`.
    pub fn build_as_uniform_from_parameters(&self, parameter: &Point) -> Result<Uniform> {
        Uniform::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for UniformFactory {
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
        self.build_as_uniform(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_uniform_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(Uniform::default())
    }
}

impl PersistentObject for UniformFactory {
    const CLASS_NAME: &'static str = "UniformFactory";

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

    #[test]
    fn test_moments_are_matched() {
        // mean 2, unbiased variance 10/4 → half width √(3 · 2.5) = √7.5
        let sample = Sample::from_scalars(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let u = UniformFactory::default().build_as_uniform(&sample).unwrap();
        assert!((u.a() - (2.0 - 7.5f64.sqrt())).abs() < 1e-12);
        assert!((u.b() - (2.0 + 7.5f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_samples() {
        let factory = UniformFactory::default();
        assert!(factory.build(&Sample::from_scalars(&[1.0, 1.0, 1.0])).is_err());
        assert!(factory.build(&Sample::from_scalars(&[1.0])).is_err());
        assert!(factory.build(&Sample::new(4, 2)).is_err());
    }

    #[test]
    fn test_build_from_parameters() {
        let factory = UniformFactory::default();
        let u = factory
            .build_from_parameters(&Point::from_vec(vec![-2.0, 5.0]))
            .unwrap();
        assert_eq!(u.parameter(), Point::from_vec(vec![-2.0, 5.0]));
        assert!(factory
            .build_from_parameters(&Point::from_vec(vec![5.0, -2.0]))
            .is_err());
        assert_eq!(factory.build_default().class_name(), "Uniform");
    }
}
