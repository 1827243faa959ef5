use super::{
    described, load_settings, require_finite_sample, require_univariate, scalar_moments,
    DistributionFactoryImplementation,
};
use crate::config::NumericalSettings;
use crate::distribution::{Distribution, Exponential};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::types::{Point, Sample};

/// Method of moments for [`Exponential`]: `λ = 1/sd`, `γ = mean - sd`.
#[derive(Debug, Clone, Default)]
pub struct ExponentialFactory {
    settings: NumericalSettings,
}

impl ExponentialFactory {
    /// Fit an exponential distribution with location.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate sample, fewer than two
    /// points or a constant sample.
    pub fn build_as_exponential(&self, sample: &Sample) -> Result<Exponential> {
        require_univariate(sample, 2, "Exponential")?;
        require_finite_sample(sample, "Exponential")?;
        let (mean, sd, _) = scalar_moments(sample)?;
        if sd <= 0.0 {
            return Err(Error::invalid_argument(
                "cannot build an Exponential distribution from a constant sample",
            ));
        }
        described(Exponential::new(1.0 / sd, mean - sd)?, sample)
    }

    /// Build from `[λ, γ]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless `λ > 0`.
    pub fn build_as_exponential_from_parameters(&self, parameter: &Point) -> Result<Exponential> {
        Exponential::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for ExponentialFactory {
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
        self.build_as_exponential(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_exponential_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(Exponential::default())
    }
}

impl PersistentObject for ExponentialFactory {
    const CLASS_NAME: &'static str = "ExponentialFactory";

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
        let source = Exponential::new(0.5, 3.0).unwrap();
        let mut rng = RandomGenerator::with_seed(9);
        let sample = source.get_sample(20_000, &mut rng).unwrap();
        let fitted = ExponentialFactory::default()
            .build_as_exponential(&sample)
            .unwrap();
        assert!((fitted.lambda() - 0.5).abs() < 0.02);
        assert!((fitted.gamma() - 3.0).abs() < 0.1);
    }

    #[test]
    fn test_keeps_sample_description() {
        let mut sample = Sample::from_scalars(&[1.0, 2.0, 4.0]);
        sample
            .set_description(crate::types::Description::from(vec!["load"]))
            .unwrap();
        let fitted = ExponentialFactory::default().build(&sample).unwrap();
        assert_eq!(&fitted.description()[0], "load");
    }
}
