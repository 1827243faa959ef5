use super::{
    described, load_settings, require_finite_sample, require_univariate, scalar_moments,
    DistributionFactoryImplementation,
};
use crate::config::NumericalSettings;
use crate::distribution::{Distribution, Gamma};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::types::{Point, Sample};

/// Method of moments for [`Gamma`]: `k = 4/skewness²`, `λ = √k/sd`,
/// `γ = mean - k/λ`.
#[derive(Debug, Clone, Default)]
pub struct GammaFactory {
    settings: NumericalSettings,
}

impl GammaFactory {
    /// Fit a three-parameter gamma distribution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-univariate sample, fewer than three
    /// points or a sample without positive skewness.
    pub fn build_as_gamma(&self, sample: &Sample) -> Result<Gamma> {
        require_univariate(sample, 3, "Gamma")?;
        require_finite_sample(sample, "Gamma")?;
        let (mean, sd, skewness) = scalar_moments(sample)?;
        let skewness = match skewness {
            Some(s) if s > 0.0 => s,
            _ => {
                return Err(Error::invalid_argument(
                    "cannot build a Gamma distribution from a sample without positive skewness",
                ))
            }
        };
        let k = 4.0 / (skewness * skewness);
        let lambda = k.sqrt() / sd;
        described(Gamma::new(k, lambda, mean - k / lambda)?, sample)
    }

    /// Build from `[k, λ, γ]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless `k > 0` and `λ > 0`.
    pub fn build_as_gamma_from_parameters(&self, parameter: &Point) -> Result<Gamma> {
        Gamma::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for GammaFactory {
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
        self.build_as_gamma(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_gamma_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(Gamma::default())
    }
}

impl PersistentObject for GammaFactory {
    const CLASS_NAME: &'static str = "GammaFactory";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionFactoryImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        Ok(Self {
            settings: load_settings(advocate, Self::CLASS_NAME)?,
        })
    }
}
