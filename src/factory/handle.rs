use std::fmt;
use std::sync::Arc;

use super::{
    BinomialFactory, DirichletFactory, DistributionFactoryImplementation, ExponentialFactory,
    GammaFactory, LogNormalFactory, NormalCopulaFactory, NormalFactory, ParameterEstimate,
    TruncatedNormalFactory, UniformFactory,
};
use crate::config::NumericalSettings;
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{Point, Sample};

/// Shared handle on a factory implementation.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let factory = DistributionFactory::from(ExponentialFactory::default());
/// let sample = Sample::from_scalars(&[0.5, 1.5, 2.0, 4.0, 7.0]);
/// let fitted = factory.build(&sample).unwrap();
/// assert_eq!(fitted.class_name(), "Exponential");
/// ```
#[derive(Clone)]
pub struct DistributionFactory {
    implementation: Arc<dyn DistributionFactoryImplementation>,
}

impl DistributionFactory {
    /// Wrap an implementation.
    #[must_use]
    pub fn new<F: DistributionFactoryImplementation + 'static>(implementation: F) -> Self {
        Self {
            implementation: Arc::new(implementation),
        }
    }

    /// The underlying implementation.
    #[must_use]
    pub fn implementation(&self) -> &dyn DistributionFactoryImplementation {
        self.implementation.as_ref()
    }

    /// Class tag.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.implementation.class_name()
    }

    /// Class tag of the distributions built.
    #[must_use]
    pub fn distribution_class_name(&self) -> &'static str {
        self.implementation.distribution_class_name()
    }

    /// Settings of the estimators.
    #[must_use]
    pub fn settings(&self) -> &NumericalSettings {
        self.implementation.settings()
    }

    /// Replace the settings, copying a shared implementation first.
    pub fn set_settings(&mut self, settings: NumericalSettings) {
        if Arc::get_mut(&mut self.implementation).is_none() {
            self.implementation = Arc::from(self.implementation.clone_box());
        }
        if let Some(implementation) = Arc::get_mut(&mut self.implementation) {
            implementation.set_settings(settings);
        }
    }

    /// Fit a distribution to `sample`.
    ///
    /// # Errors
    ///
    /// See [`DistributionFactoryImplementation::build`].
    pub fn build(&self, sample: &Sample) -> Result<Distribution> {
        self.implementation.build(sample)
    }

    /// Build from a flat parameter vector.
    ///
    /// # Errors
    ///
    /// See [`DistributionFactoryImplementation::build_from_parameters`].
    pub fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.implementation.build_from_parameters(parameter)
    }

    /// The family's default instance.
    #[must_use]
    pub fn build_default(&self) -> Distribution {
        self.implementation.build_default()
    }

    /// Fit with parameter covariance, using the process-wide generator.
    ///
    /// # Errors
    ///
    /// See [`DistributionFactoryImplementation::build_estimate_with`].
    pub fn build_estimate(&self, sample: &Sample) -> Result<ParameterEstimate> {
        self.implementation.build_estimate(sample)
    }

    /// Fit with parameter covariance, using `rng` for resampling.
    ///
    /// # Errors
    ///
    /// See [`DistributionFactoryImplementation::build_estimate_with`].
    pub fn build_estimate_with(
        &self,
        sample: &Sample,
        rng: &mut RandomGenerator,
    ) -> Result<ParameterEstimate> {
        self.implementation.build_estimate_with(sample, rng)
    }

    /// Save into a new advocate tagged with the class name.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be serialized.
    pub fn to_advocate(&self) -> Result<Advocate> {
        let mut advocate = Advocate::new(self.class_name());
        self.implementation.save(&mut advocate)?;
        Ok(advocate)
    }

    /// Rebuild a factory of any known class from its record.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error for an unknown class tag or a malformed
    /// record.
    pub fn load(advocate: &Advocate) -> Result<Self> {
        Ok(match advocate.class_name() {
            UniformFactory::CLASS_NAME => Self::new(UniformFactory::load(advocate)?),
            NormalFactory::CLASS_NAME => Self::new(NormalFactory::load(advocate)?),
            LogNormalFactory::CLASS_NAME => Self::new(LogNormalFactory::load(advocate)?),
            GammaFactory::CLASS_NAME => Self::new(GammaFactory::load(advocate)?),
            ExponentialFactory::CLASS_NAME => Self::new(ExponentialFactory::load(advocate)?),
            BinomialFactory::CLASS_NAME => Self::new(BinomialFactory::load(advocate)?),
            TruncatedNormalFactory::CLASS_NAME => {
                Self::new(TruncatedNormalFactory::load(advocate)?)
            }
            DirichletFactory::CLASS_NAME => Self::new(DirichletFactory::load(advocate)?),
            NormalCopulaFactory::CLASS_NAME => Self::new(NormalCopulaFactory::load(advocate)?),
            other => {
                return Err(Error::persistence(format!(
                    "unknown factory class '{other}'"
                )))
            }
        })
    }
}

impl<F: DistributionFactoryImplementation + 'static> From<F> for DistributionFactory {
    fn from(implementation: F) -> Self {
        Self::new(implementation)
    }
}

impl fmt::Debug for DistributionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.implementation.fmt(f)
    }
}

impl fmt::Display for DistributionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.implementation.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_settings() {
        let mut factory = DistributionFactory::from(GammaFactory::default());
        factory.set_settings(NumericalSettings::default().with_bootstrap_size(7));
        let json = factory.to_advocate().unwrap().to_json().unwrap();
        let restored = DistributionFactory::load(&Advocate::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.class_name(), "GammaFactory");
        assert_eq!(restored.settings().bootstrap_size, 7);
        assert_eq!(restored.to_string(), factory.to_string());
    }

    #[test]
    fn test_set_settings_copies_shared_implementation() {
        let a = DistributionFactory::from(NormalFactory::default());
        let mut b = a.clone();
        b.set_settings(NumericalSettings::default().with_bootstrap_size(3));
        assert_eq!(a.settings().bootstrap_size, 100);
        assert_eq!(b.settings().bootstrap_size, 3);
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let err = DistributionFactory::load(&Advocate::new("WeibullFactory")).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    #[test]
    fn test_distribution_class_name() {
        let factory = DistributionFactory::from(DirichletFactory::default());
        assert_eq!(factory.distribution_class_name(), "Dirichlet");
    }
}
