use std::fmt;
use std::sync::Arc;

use super::{
    Bootstrap, Composite, ExperimentImplementation, Factorial, FixedExperiment,
    ImportanceSamplingExperiment, LHSExperiment, MonteCarloExperiment,
};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{Point, Sample};

/// Shared handle on an experiment implementation.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let experiments = vec![
///     Experiment::from(Composite::centered(2, Point::from_vec(vec![1.0])).unwrap()),
///     Experiment::from(MonteCarloExperiment::new(Normal::standard(2), 3).unwrap()),
/// ];
/// let mut rng = RandomGenerator::with_seed(0);
/// for experiment in &experiments {
///     let sample = experiment.generate_from(&mut rng).unwrap();
///     assert_eq!(sample.size(), experiment.size());
/// }
/// ```
#[derive(Clone)]
pub struct Experiment {
    implementation: Arc<dyn ExperimentImplementation>,
}

impl Experiment {
    /// Wrap an implementation.
    #[must_use]
    pub fn new<E: ExperimentImplementation + 'static>(implementation: E) -> Self {
        Self {
            implementation: Arc::new(implementation),
        }
    }

    /// The underlying implementation.
    #[must_use]
    pub fn implementation(&self) -> &dyn ExperimentImplementation {
        self.implementation.as_ref()
    }

    /// Class tag.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.implementation.class_name()
    }

    /// Dimension of the generated points.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.implementation.dimension()
    }

    /// Number of points one run generates.
    #[must_use]
    pub fn size(&self) -> usize {
        self.implementation.size()
    }

    /// Whether generation consumes random numbers.
    #[must_use]
    pub fn is_random(&self) -> bool {
        self.implementation.is_random()
    }

    /// Generate with the process-wide generator.
    ///
    /// # Errors
    ///
    /// See [`ExperimentImplementation::generate_from`].
    pub fn generate(&self) -> Result<Sample> {
        self.implementation.generate()
    }

    /// Generate with `rng`.
    ///
    /// # Errors
    ///
    /// See [`ExperimentImplementation::generate_from`].
    pub fn generate_from(&self, rng: &mut RandomGenerator) -> Result<Sample> {
        self.implementation.generate_from(rng)
    }

    /// Generate points and weights with the process-wide generator.
    ///
    /// # Errors
    ///
    /// See [`ExperimentImplementation::generate_from`].
    pub fn generate_with_weights(&self) -> Result<(Sample, Point)> {
        self.implementation.generate_with_weights()
    }

    /// Generate points and weights with `rng`.
    ///
    /// # Errors
    ///
    /// See [`ExperimentImplementation::generate_from`].
    pub fn generate_with_weights_from(&self, rng: &mut RandomGenerator) -> Result<(Sample, Point)> {
        self.implementation.generate_with_weights_from(rng)
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

    /// Rebuild an experiment of any known class from its record.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error for an unknown class tag or a malformed
    /// record.
    pub fn load(advocate: &Advocate) -> Result<Self> {
        Ok(match advocate.class_name() {
            Composite::CLASS_NAME => Self::new(Composite::load(advocate)?),
            Factorial::CLASS_NAME => Self::new(Factorial::load(advocate)?),
            Bootstrap::CLASS_NAME => Self::new(Bootstrap::load(advocate)?),
            FixedExperiment::CLASS_NAME => Self::new(FixedExperiment::load(advocate)?),
            MonteCarloExperiment::CLASS_NAME => Self::new(MonteCarloExperiment::load(advocate)?),
            LHSExperiment::CLASS_NAME => Self::new(LHSExperiment::load(advocate)?),
            ImportanceSamplingExperiment::CLASS_NAME => {
                Self::new(ImportanceSamplingExperiment::load(advocate)?)
            }
            other => {
                return Err(Error::persistence(format!(
                    "unknown experiment class '{other}'"
                )))
            }
        })
    }
}

impl<E: ExperimentImplementation + 'static> From<E> for Experiment {
    fn from(implementation: E) -> Self {
        Self::new(implementation)
    }
}

impl fmt::Debug for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.implementation.fmt(f)
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.implementation.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Normal, Uniform};

    fn all_experiments() -> Vec<Experiment> {
        let levels = Point::from_vec(vec![1.0, 2.0]);
        vec![
            Composite::centered(2, levels.clone()).unwrap().into(),
            Factorial::centered(2, levels).unwrap().into(),
            Bootstrap::new(Sample::from_scalars(&[1.0, 2.0, 3.0])).unwrap().into(),
            FixedExperiment::new(Sample::from_scalars(&[4.0, 5.0])).unwrap().into(),
            MonteCarloExperiment::new(Normal::standard(2), 4).unwrap().into(),
            LHSExperiment::new(Uniform::new(0.0, 2.0).unwrap(), 4).unwrap().into(),
            ImportanceSamplingExperiment::new(Normal::standard(1), Normal::new(0.0, 2.0).unwrap(), 4)
                .unwrap()
                .into(),
        ]
    }

    #[test]
    fn test_round_trip_every_class() {
        for experiment in all_experiments() {
            let json = experiment.to_advocate().unwrap().to_json().unwrap();
            let restored = Experiment::load(&Advocate::from_json(&json).unwrap()).unwrap();
            assert_eq!(restored.class_name(), experiment.class_name());
            assert_eq!(restored.to_string(), experiment.to_string());
        }
    }

    #[test]
    fn test_size_matches_generated_sample() {
        let mut rng = RandomGenerator::with_seed(17);
        for experiment in all_experiments() {
            let (sample, weights) = experiment.generate_with_weights_from(&mut rng).unwrap();
            assert_eq!(sample.size(), experiment.size(), "{experiment}");
            assert_eq!(sample.dimension(), experiment.dimension(), "{experiment}");
            if experiment.class_name() != "Bootstrap" {
                assert_eq!(weights.dimension(), sample.size(), "{experiment}");
            }
        }
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let err = Experiment::load(&Advocate::new("SobolSequence")).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }
}
