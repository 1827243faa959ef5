//! Numeric container types.
//!
//! This module provides the value types every other module exchanges:
//!
//! - [`Point`]: a fixed-length vector of reals
//! - [`Sample`]: a collection of equal-dimension points (rows) with column names
//! - [`Description`]: component names
//! - [`CovarianceMatrix`]: a symmetric matrix with a Cholesky factorization
//! - [`Interval`]: an axis-aligned box, possibly with infinite sides
//!
//! ## Notation
//!
//! A sample of size N and dimension d is an N×d matrix; row i is the i-th
//! observation and column j holds the j-th component of every observation.

mod description;
mod interval;
mod matrix;
mod point;
mod sample;

pub use description::Description;
pub use interval::Interval;
pub use matrix::{CholeskyFactor, CovarianceMatrix};
pub use point::Point;
pub use sample::Sample;
