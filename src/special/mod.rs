//! Special mathematical functions.
//!
//! Numerical approximations of the functions the distribution families and
//! the statistical tests are built on:
//!
//! - [`gamma`]: log-gamma and the regularized incomplete gamma functions
//! - [`normal`]: error function and standard normal PDF, CDF and quantile
//! - [`beta`]: log-beta and the regularized incomplete beta function
//! - [`digamma`]: digamma, trigamma and the inverse digamma
//! - [`bivariate_normal`]: CDF of the standard bivariate normal

pub mod beta;
pub mod bivariate_normal;
pub mod digamma;
pub mod gamma;
pub mod normal;

pub use beta::{ln_beta, regularized_incomplete_beta};
pub use bivariate_normal::bivariate_normal_cdf;
pub use digamma::{digamma, inverse_digamma, trigamma};
pub use gamma::{
    inverse_regularized_lower_gamma, ln_gamma, regularized_lower_gamma,
    regularized_upper_gamma,
};
pub use normal::{
    erf, erfc, standard_normal_cdf, standard_normal_complementary_cdf, standard_normal_pdf,
    standard_normal_quantile,
};

/// Relative precision of the series and continued fractions.
pub(crate) const SERIES_EPSILON: f64 = 1e-15;

/// Floor used by the modified Lentz algorithm.
pub(crate) const LENTZ_TINY: f64 = 1e-300;
