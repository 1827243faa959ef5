//! Numerical algorithms backing the distribution fallbacks.
//!
//! - [`gauss_legendre`]: Gauss-Legendre rules and tensor-product integration
//! - [`gauss_kronrod`]: adaptive G7/K15 integration of univariate functions
//! - [`brent`]: bracketed root finding

pub mod brent;
pub mod gauss_kronrod;
pub mod gauss_legendre;

pub use brent::Brent;
pub use gauss_kronrod::GaussKronrod;
pub use gauss_legendre::GaussLegendre;
