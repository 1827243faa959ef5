//! Batch evaluation of distributions over samples using Rayon.
//!
//! Enable with the `parallel` feature flag. Each function evaluates one
//! point per task and returns the same values as its sequential counterpart
//! on [`Distribution`], in the same order. Evaluation is pure: nothing here
//! touches a random generator.
//!
//! # Usage
//!
//! ```ignore
//! use uqcore::parallel::par_compute_cdf;
//! use uqcore::prelude::*;
//!
//! let gamma = Distribution::from(Gamma::new(2.0, 1.0, 0.0).unwrap());
//! let x = Sample::from_scalars(&[0.5, 1.0, 2.0, 4.0]);
//! let cdf = par_compute_cdf(&gamma, &x).unwrap();
//! assert_eq!(cdf, gamma.compute_cdf_sample(&x).unwrap());
//! ```
//!
//! # Performance
//!
//! Parallel evaluation pays off when a single evaluation is expensive:
//! - CDFs computed by numerical integration
//! - Quantiles solved by root finding
//! - Multivariate families in high dimension
//!
//! Closed-form densities are usually faster sequentially.

use rayon::prelude::*;

use crate::distribution::Distribution;
use crate::error::{check_dimension, Result};
use crate::types::{Point, Sample};

/// Densities at every point of `sample`.
///
/// # Errors
///
/// Returns `DimensionMismatch` if the sample has the wrong dimension, or the
/// first evaluation error encountered.
pub fn par_compute_pdf(distribution: &Distribution, sample: &Sample) -> Result<Point> {
    check_dimension(distribution.dimension(), sample.dimension())?;
    let values = (0..sample.size())
        .into_par_iter()
        .map(|i| distribution.compute_pdf(&sample.row(i)))
        .collect::<Result<Vec<f64>>>()?;
    Ok(Point::from_vec(values))
}

/// CDF values at every point of `sample`.
///
/// # Errors
///
/// Same as [`par_compute_pdf`]; a numerical CDF may also fail with
/// `NumericalConvergence`.
pub fn par_compute_cdf(distribution: &Distribution, sample: &Sample) -> Result<Point> {
    check_dimension(distribution.dimension(), sample.dimension())?;
    let values = (0..sample.size())
        .into_par_iter()
        .map(|i| distribution.compute_cdf(&sample.row(i)))
        .collect::<Result<Vec<f64>>>()?;
    Ok(Point::from_vec(values))
}

/// Quantiles at several probabilities, one row each.
///
/// # Errors
///
/// Returns `InvalidArgument` if a probability is outside `[0, 1]`, or the
/// error of a failed quantile solve.
pub fn par_compute_quantile(distribution: &Distribution, probabilities: &[f64]) -> Result<Sample> {
    let points = probabilities
        .par_iter()
        .map(|&p| distribution.compute_quantile(p))
        .collect::<Result<Vec<Point>>>()?;
    if points.is_empty() {
        return Ok(Sample::empty(distribution.dimension()));
    }
    Sample::from_points(&points)
}
