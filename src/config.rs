//! Numerical settings shared by the distribution fallbacks and the factories.
//!
//! Every distribution carries a copy of [`NumericalSettings`]; the defaults
//! are the library-wide tolerances and iteration caps.

use serde::{Deserialize, Serialize};

/// Tolerances and iteration caps for the numerical fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalSettings {
    /// Relative tolerance of the quadrature fallbacks (default: 1e-7).
    pub integration_tolerance: f64,
    /// Maximum number of interval bisections of the adaptive integrator (default: 200).
    pub integration_max_subdivisions: usize,
    /// Nodes per axis of the tensor Gauss rule used in dimension ≥ 2 (default: 48).
    pub integration_nodes: usize,
    /// Absolute tolerance on the abscissa of the quantile solver (default: 1e-12).
    pub quantile_epsilon: f64,
    /// Tail probability used to cut unbounded supports into a numerical range (default: 1e-14).
    pub cdf_epsilon: f64,
    /// Maximum number of Brent iterations for quantiles (default: 100).
    pub quantile_iterations: usize,
    /// Distance under which a value counts as an integer support point (default: 1e-14).
    pub support_epsilon: f64,
    /// Number of resamples used for bootstrap parameter covariance (default: 100).
    pub bootstrap_size: usize,
    /// Largest dimension handled by the tensor quadrature fallback (default: 3).
    pub max_fallback_dimension: usize,
}

impl Default for NumericalSettings {
    fn default() -> Self {
        Self {
            integration_tolerance: 1e-7,
            integration_max_subdivisions: 200,
            integration_nodes: 48,
            quantile_epsilon: 1e-12,
            cdf_epsilon: 1e-14,
            quantile_iterations: 100,
            support_epsilon: 1e-14,
            bootstrap_size: 100,
            max_fallback_dimension: 3,
        }
    }
}

impl NumericalSettings {
    /// Set the quadrature tolerance.
    #[must_use]
    pub fn with_integration_tolerance(mut self, tolerance: f64) -> Self {
        self.integration_tolerance = tolerance;
        self
    }

    /// Set the number of tensor Gauss nodes per axis.
    #[must_use]
    pub fn with_integration_nodes(mut self, nodes: usize) -> Self {
        self.integration_nodes = nodes;
        self
    }

    /// Set the quantile solver iteration cap.
    #[must_use]
    pub fn with_quantile_iterations(mut self, iterations: usize) -> Self {
        self.quantile_iterations = iterations;
        self
    }

    /// Set the number of bootstrap resamples.
    #[must_use]
    pub fn with_bootstrap_size(mut self, size: usize) -> Self {
        self.bootstrap_size = size;
        self
    }
}
