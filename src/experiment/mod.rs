//! Sampling plans.
//!
//! An experiment generates a [`Sample`] of design points, optionally with one
//! weight per point. Stratified designs ([`Composite`], [`Factorial`]) are
//! deterministic functions of a center and a list of levels; the others draw
//! from a random generator. Generating never changes the configuration, so
//! an experiment can be run any number of times.
//!
//! | Experiment | Points | Weights |
//! |------------|--------|---------|
//! | [`Composite`] | `2·d·L` axial points | `1/N` |
//! | [`Factorial`] | `2^d·L` corners | `1/N` |
//! | [`Bootstrap`] | resample with replacement | empty |
//! | [`FixedExperiment`] | the stored sample | stored weights |
//! | [`MonteCarloExperiment`] | i.i.d. realizations | `1/N` |
//! | [`LHSExperiment`] | Latin hypercube | `1/N` |
//! | [`ImportanceSamplingExperiment`] | draws from an instrumental law | `f/(N·g)` |
//!
//! # Example
//!
//! ```
//! use uqcore::prelude::*;
//!
//! let design = Composite::new(Point::new(2), Point::from_vec(vec![1.0, 2.0])).unwrap();
//! let sample = design.generate().unwrap();
//! assert_eq!(sample.size(), 8);
//! assert_eq!(sample.row(0), Point::from_vec(vec![1.0, 0.0]));
//! assert_eq!(sample.row(1), Point::from_vec(vec![-1.0, 0.0]));
//! ```

mod bootstrap;
mod composite;
mod factorial;
mod fixed;
mod handle;
mod importance_sampling;
mod lhs;
mod monte_carlo;
mod stratified;

pub use bootstrap::Bootstrap;
pub use composite::Composite;
pub use factorial::Factorial;
pub use fixed::FixedExperiment;
pub use handle::Experiment;
pub use importance_sampling::ImportanceSamplingExperiment;
pub use lhs::LHSExperiment;
pub use monte_carlo::MonteCarloExperiment;
pub use stratified::StratifiedDesign;

use std::fmt;

use crate::error::{Error, Result};
use crate::persistence::Advocate;
use crate::random::{self, RandomGenerator};
use crate::types::{Point, Sample};

/// Trait implemented by every experiment.
pub trait ExperimentImplementation: Send + Sync + fmt::Debug {
    /// Class tag, also used for persistence.
    fn class_name(&self) -> &'static str;

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn ExperimentImplementation>;

    /// Dimension of the generated points.
    fn dimension(&self) -> usize;

    /// Number of points one run generates.
    fn size(&self) -> usize;

    /// Whether generation consumes random numbers.
    fn is_random(&self) -> bool {
        true
    }

    /// Generate the design points, drawing from `rng` if needed.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying distribution for sampling-based
    /// experiments.
    fn generate_from(&self, rng: &mut RandomGenerator) -> Result<Sample>;

    /// Generate the design points and their weights.
    ///
    /// The default weights are uniform, `1/N` per point.
    ///
    /// # Errors
    ///
    /// Same as [`ExperimentImplementation::generate_from`].
    fn generate_with_weights_from(&self, rng: &mut RandomGenerator) -> Result<(Sample, Point)> {
        let sample = self.generate_from(rng)?;
        let weights = uniform_weights(sample.size());
        Ok((sample, weights))
    }

    /// [`ExperimentImplementation::generate_from`] with the process-wide
    /// generator.
    ///
    /// # Errors
    ///
    /// Same as [`ExperimentImplementation::generate_from`].
    fn generate(&self) -> Result<Sample> {
        let mut rng = random::global();
        self.generate_from(&mut rng)
    }

    /// [`ExperimentImplementation::generate_with_weights_from`] with the
    /// process-wide generator.
    ///
    /// # Errors
    ///
    /// Same as [`ExperimentImplementation::generate_from`].
    fn generate_with_weights(&self) -> Result<(Sample, Point)> {
        let mut rng = random::global();
        self.generate_with_weights_from(&mut rng)
    }

    /// Write the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be serialized.
    fn save(&self, advocate: &mut Advocate) -> Result<()>;

    /// Text representation.
    fn repr(&self) -> String;
}

/// `size` weights equal to `1/size`.
pub(crate) fn uniform_weights(size: usize) -> Point {
    if size == 0 {
        return Point::new(0);
    }
    Point::filled(size, 1.0 / size as f64)
}

/// Fail unless `size` is positive.
pub(crate) fn require_positive_size(size: usize, class_name: &str) -> Result<()> {
    if size == 0 {
        return Err(Error::invalid_argument(format!(
            "{class_name} needs a positive size"
        )));
    }
    Ok(())
}
