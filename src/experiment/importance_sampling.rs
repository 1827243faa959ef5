use super::{require_positive_size, ExperimentImplementation};
use crate::distribution::Distribution;
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{Point, Sample};

/// Draws from an instrumental distribution `g`, weighted towards a target `f`.
///
/// The weight of point `x` is `f(x) / (N·g(x))`, so weighted sums estimate
/// expectations under `f`.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let target = Normal::new(0.0, 1.0).unwrap();
/// let instrumental = Normal::new(0.5, 2.0).unwrap();
/// let experiment = ImportanceSamplingExperiment::new(target, instrumental, 4000).unwrap();
///
/// let mut rng = RandomGenerator::with_seed(3);
/// let (sample, weights) = experiment.generate_with_weights_from(&mut rng).unwrap();
/// let mean: f64 = sample.column(0).iter().zip(weights.iter()).map(|(x, w)| x * w).sum();
/// assert!(mean.abs() < 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceSamplingExperiment {
    target: Distribution,
    instrumental: Distribution,
    size: usize,
}

impl ImportanceSamplingExperiment {
    /// `size` draws from `instrumental` per run, weighted towards `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `size` is 0 and `DimensionMismatch` if
    /// the two distributions have different dimensions.
    pub fn new(
        target: impl Into<Distribution>,
        instrumental: impl Into<Distribution>,
        size: usize,
    ) -> Result<Self> {
        require_positive_size(size, Self::CLASS_NAME)?;
        let target = target.into();
        let instrumental = instrumental.into();
        check_dimension(target.dimension(), instrumental.dimension())?;
        Ok(Self {
            target,
            instrumental,
            size,
        })
    }

    /// The distribution the weights correct towards.
    #[must_use]
    pub fn target(&self) -> &Distribution {
        &self.target
    }

    /// The distribution the points are drawn from.
    #[must_use]
    pub fn instrumental(&self) -> &Distribution {
        &self.instrumental
    }
}

impl ExperimentImplementation for ImportanceSamplingExperiment {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn ExperimentImplementation> {
        Box::new(self.clone())
    }

    fn dimension(&self) -> usize {
        self.target.dimension()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn generate_from(&self, rng: &mut RandomGenerator) -> Result<Sample> {
        self.instrumental.get_sample_with(self.size, rng)
    }

    fn generate_with_weights_from(&self, rng: &mut RandomGenerator) -> Result<(Sample, Point)> {
        let sample = self.generate_from(rng)?;
        let n = self.size as f64;
        let weights = sample
            .points()
            .map(|x| {
                let g = self.instrumental.compute_pdf(&x)?;
                if g <= 0.0 {
                    return Err(Error::domain(format!(
                        "the instrumental density vanishes at the drawn point {x}"
                    )));
                }
                Ok(self.target.compute_pdf(&x)? / (n * g))
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok((sample, Point::from_vec(weights)))
    }

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_record("target", &self.target.to_advocate()?)?;
        advocate.save_record("instrumental", &self.instrumental.to_advocate()?)?;
        advocate.save_attribute("size", &self.size)
    }

    fn repr(&self) -> String {
        format!(
            "class={} target={} instrumental={} size={}",
            Self::CLASS_NAME,
            self.target,
            self.instrumental,
            self.size
        )
    }
}

impl PersistentObject for ImportanceSamplingExperiment {
    const CLASS_NAME: &'static str = "ImportanceSamplingExperiment";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        ExperimentImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        Self::new(
            Distribution::load(&advocate.load_record("target")?)?,
            Distribution::load(&advocate.load_record("instrumental")?)?,
            advocate.load_attribute("size")?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Exponential, Normal, Uniform};

    #[test]
    fn test_weights_are_density_ratios() {
        let target = Distribution::from(Normal::new(1.0, 1.0).unwrap());
        let instrumental = Distribution::from(Uniform::new(-3.0, 5.0).unwrap());
        let experiment =
            ImportanceSamplingExperiment::new(target.clone(), instrumental, 10).unwrap();
        let mut rng = RandomGenerator::with_seed(12);
        let (sample, weights) = experiment.generate_with_weights_from(&mut rng).unwrap();
        for (x, w) in sample.points().zip(weights.iter()) {
            let expected = target.compute_pdf(&x).unwrap() * 8.0 / 10.0;
            assert!((w - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_weighted_mean_estimates_target_mean() {
        let experiment = ImportanceSamplingExperiment::new(
            Exponential::new(1.0, 0.0).unwrap(),
            Exponential::new(0.5, 0.0).unwrap(),
            20_000,
        )
        .unwrap();
        let mut rng = RandomGenerator::with_seed(40);
        let (sample, weights) = experiment.generate_with_weights_from(&mut rng).unwrap();
        let mean: f64 = sample
            .column(0)
            .iter()
            .zip(weights.iter())
            .map(|(x, w)| x * w)
            .sum();
        assert!((mean - 1.0).abs() < 0.05, "{mean}");
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = ImportanceSamplingExperiment::new(Normal::standard(2), Normal::standard(1), 5)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_persistence() {
        let experiment =
            ImportanceSamplingExperiment::new(Normal::standard(1), Uniform::new(-4.0, 4.0).unwrap(), 7)
                .unwrap();
        let restored =
            ImportanceSamplingExperiment::load(&experiment.to_advocate().unwrap()).unwrap();
        assert_eq!(restored, experiment);
    }
}
