use super::{require_positive_size, ExperimentImplementation};
use crate::distribution::Distribution;
use crate::error::Result;
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::Sample;

/// Independent realizations of a distribution, with weights `1/N`.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let experiment = MonteCarloExperiment::new(Normal::standard(2), 100).unwrap();
/// let mut rng = RandomGenerator::with_seed(1);
/// let sample = experiment.generate_from(&mut rng).unwrap();
/// assert_eq!((sample.size(), sample.dimension()), (100, 2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloExperiment {
    distribution: Distribution,
    size: usize,
}

impl MonteCarloExperiment {
    /// `size` realizations of `distribution` per run.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `size` is 0.
    pub fn new(distribution: impl Into<Distribution>, size: usize) -> Result<Self> {
        require_positive_size(size, Self::CLASS_NAME)?;
        Ok(Self {
            distribution: distribution.into(),
            size,
        })
    }

    /// The sampled distribution.
    #[must_use]
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }
}

impl ExperimentImplementation for MonteCarloExperiment {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn ExperimentImplementation> {
        Box::new(self.clone())
    }

    fn dimension(&self) -> usize {
        self.distribution.dimension()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn generate_from(&self, rng: &mut RandomGenerator) -> Result<Sample> {
        self.distribution.get_sample_with(self.size, rng)
    }

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_record("distribution", &self.distribution.to_advocate()?)?;
        advocate.save_attribute("size", &self.size)
    }

    fn repr(&self) -> String {
        format!(
            "class={} distribution={} size={}",
            Self::CLASS_NAME,
            self.distribution,
            self.size
        )
    }
}

impl PersistentObject for MonteCarloExperiment {
    const CLASS_NAME: &'static str = "MonteCarloExperiment";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        ExperimentImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        Self::new(
            Distribution::load(&advocate.load_record("distribution")?)?,
            advocate.load_attribute("size")?,
        )
    }
}
