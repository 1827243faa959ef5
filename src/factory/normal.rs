use super::{
    described, load_settings, require_finite_sample, require_size,
    DistributionFactoryImplementation, ParameterEstimate,
};
use crate::config::NumericalSettings;
use crate::distribution::{Distribution, DistributionImplementation, Normal};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{CovarianceMatrix, Point, Sample};

/// Method of moments for [`Normal`]: sample mean, unbiased standard
/// deviations and the Pearson correlation.
#[derive(Debug, Clone, Default)]
pub struct NormalFactory {
    settings: NumericalSettings,
}

impl NormalFactory {
    /// Fit a normal distribution of the sample's dimension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for fewer than two points, a constant
    /// component or a singular correlation estimate.
    pub fn build_as_normal(&self, sample: &Sample) -> Result<Normal> {
        require_size(sample, 2, "Normal")?;
        require_finite_sample(sample, "Normal")?;
        let covariance = sample.compute_covariance()?;
        let sigma = Point::from_iter(covariance.diagonal().iter().map(|v| v.sqrt()));
        if let Some(i) = (0..sigma.dimension()).find(|&i| sigma[i] <= 0.0) {
            return Err(Error::invalid_argument(format!(
                "cannot build a Normal distribution: component {i} of the sample is constant"
            )));
        }
        let correlation = covariance.to_correlation()?;
        let normal = Normal::multivariate(sample.compute_mean()?, sigma, correlation)?;
        described(normal, sample)
    }

    /// Build from `[μ…, σ…, R…]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the length matches no dimension or a
    /// value is invalid.
    pub fn build_as_normal_from_parameters(&self, parameter: &Point) -> Result<Normal> {
        Normal::from_parameter(parameter)
    }
}

impl DistributionFactoryImplementation for NormalFactory {
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
        self.build_as_normal(sample).map(Distribution::from)
    }

    fn build_from_parameters(&self, parameter: &Point) -> Result<Distribution> {
        self.build_as_normal_from_parameters(parameter)
            .map(Distribution::from)
    }

    fn build_default(&self) -> Distribution {
        Distribution::from(Normal::standard(1))
    }

    /// Asymptotic covariance of the estimators: `σᵢ²/n` for the means,
    /// `σᵢ²/(2n)` for the standard deviations and `(1 - ρ²)²/n` for the
    /// correlations, cross terms neglected.
    fn build_estimate_with(
        &self,
        sample: &Sample,
        _rng: &mut RandomGenerator,
    ) -> Result<ParameterEstimate> {
        let normal = self.build_as_normal(sample)?;
        let n = sample.size() as f64;
        let variances = normal.sigma().iter().map(|s| s * s);
        let mut diagonal: Vec<f64> = variances.clone().map(|v| v / n).collect();
        diagonal.extend(variances.map(|v| v / (2.0 * n)));
        let correlations = diagonal.len();
        diagonal.extend(normal.parameter().iter().skip(correlations).map(|rho| {
            let r = 1.0 - rho * rho;
            r * r / n
        }));
        let covariance = CovarianceMatrix::from_diagonal(&Point::from_vec(diagonal));
        ParameterEstimate::new(Distribution::from(normal), covariance)
    }
}

impl PersistentObject for NormalFactory {
    const CLASS_NAME: &'static str = "NormalFactory";

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
    fn test_univariate_fit() {
        let sample = Sample::from_scalars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let normal = NormalFactory::default().build_as_normal(&sample).unwrap();
        assert!((normal.mu()[0] - 3.0).abs() < 1e-14);
        assert!((normal.sigma()[0] - 2.5f64.sqrt()).abs() < 1e-14);
    }

    #[test]
    fn test_multivariate_consistency() {
        let correlation =
            CovarianceMatrix::from_rows(&[vec![1.0, 0.6], vec![0.6, 1.0]]).unwrap();
        let source = Normal::multivariate(
            Point::from_vec(vec![1.0, -2.0]),
            Point::from_vec(vec![2.0, 0.5]),
            correlation,
        )
        .unwrap();
        let mut rng = RandomGenerator::with_seed(11);
        let sample = source.get_sample(20_000, &mut rng).unwrap();
        let fitted = NormalFactory::default().build_as_normal(&sample).unwrap();
        for (estimate, exact) in fitted.parameter().iter().zip(source.parameter().iter()) {
            assert!((estimate - exact).abs() < 0.05, "{estimate} vs {exact}");
        }
    }

    #[test]
    fn test_asymptotic_estimate() {
        let sample = Sample::from_scalars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut rng = RandomGenerator::with_seed(0);
        let estimate = NormalFactory::default()
            .build_estimate_with(&sample, &mut rng)
            .unwrap();
        let covariance = estimate.parameter_covariance();
        assert!((covariance.get(0, 0) - 0.5).abs() < 1e-14);
        assert!((covariance.get(1, 1) - 0.25).abs() < 1e-14);
        assert_eq!(covariance.get(0, 1), 0.0);
    }

    #[test]
    fn test_constant_component_is_rejected() {
        let sample = Sample::from_rows(&[vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 3.0]]).unwrap();
        assert!(NormalFactory::default().build(&sample).unwrap_err().is_invalid_argument());
    }
}
