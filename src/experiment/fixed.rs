use super::{uniform_weights, ExperimentImplementation};
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{Point, Sample};

/// A stored sample returned as is, with one weight per point.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedExperiment {
    sample: Sample,
    weights: Point,
}

impl FixedExperiment {
    /// Experiment returning `sample` with uniform weights.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the sample is empty.
    pub fn new(sample: Sample) -> Result<Self> {
        let weights = uniform_weights(sample.size());
        Self::with_weights(sample, weights)
    }

    /// Experiment returning `sample` with the given weights.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the sample is empty or a weight is
    /// negative or non-finite, and `DimensionMismatch` if the number of
    /// weights differs from the sample size.
    pub fn with_weights(sample: Sample, weights: Point) -> Result<Self> {
        if sample.is_empty() {
            return Err(Error::invalid_argument(
                "a fixed experiment needs a non-empty sample",
            ));
        }
        check_dimension(sample.size(), weights.dimension())?;
        if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(Error::invalid_argument(format!(
                "weights must be non-negative and finite, got {w}"
            )));
        }
        Ok(Self { sample, weights })
    }

    /// The stored sample.
    #[must_use]
    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// The stored weights.
    #[must_use]
    pub fn weights(&self) -> &Point {
        &self.weights
    }
}

impl ExperimentImplementation for FixedExperiment {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn ExperimentImplementation> {
        Box::new(self.clone())
    }

    fn dimension(&self) -> usize {
        self.sample.dimension()
    }

    fn size(&self) -> usize {
        self.sample.size()
    }

    fn is_random(&self) -> bool {
        false
    }

    fn generate_from(&self, _rng: &mut RandomGenerator) -> Result<Sample> {
        Ok(self.sample.clone())
    }

    fn generate_with_weights_from(&self, _rng: &mut RandomGenerator) -> Result<(Sample, Point)> {
        Ok((self.sample.clone(), self.weights.clone()))
    }

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_attribute("sample", &self.sample)?;
        advocate.save_attribute("weights", &self.weights)
    }

    fn repr(&self) -> String {
        format!(
            "class={} size={} dimension={}",
            Self::CLASS_NAME,
            self.sample.size(),
            self.sample.dimension()
        )
    }
}

impl PersistentObject for FixedExperiment {
    const CLASS_NAME: &'static str = "FixedExperiment";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        ExperimentImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        Self::with_weights(
            advocate.load_attribute("sample")?,
            advocate.load_attribute("weights")?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_stored_sample() {
        let sample = Sample::from_scalars(&[3.0, 1.0, 2.0, 5.0]);
        let experiment = FixedExperiment::new(sample.clone()).unwrap();
        let (generated, weights) = experiment.generate_with_weights().unwrap();
        assert_eq!(generated, sample);
        assert_eq!(weights, Point::filled(4, 0.25));
    }

    #[test]
    fn test_custom_weights() {
        let sample = Sample::from_scalars(&[1.0, 2.0]);
        let weights = Point::from_vec(vec![0.9, 0.1]);
        let experiment = FixedExperiment::with_weights(sample, weights.clone()).unwrap();
        let mut rng = RandomGenerator::with_seed(0);
        assert_eq!(experiment.generate_with_weights_from(&mut rng).unwrap().1, weights);
    }

    #[test]
    fn test_validation() {
        let sample = Sample::from_scalars(&[1.0, 2.0]);
        assert!(FixedExperiment::new(Sample::empty(1)).is_err());
        assert!(FixedExperiment::with_weights(sample.clone(), Point::filled(3, 1.0)).is_err());
        assert!(
            FixedExperiment::with_weights(sample, Point::from_vec(vec![1.0, -0.5]))
                .unwrap_err()
                .is_invalid_argument()
        );
    }
}
