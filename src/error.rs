//! Error types for the uqcore library.
//!
//! This module provides error handling using the `thiserror` crate, with
//! variants for argument validation, evaluation domains, convergence of the
//! numerical fallbacks, optional capabilities and persistence.

use thiserror::Error;

/// The main error type for the uqcore library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Argument Errors ============
    /// Malformed input: out-of-domain parameter, probability outside [0, 1],
    /// insufficient or degenerate sample.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of what is invalid.
        message: String,
    },

    /// A point or sample does not have the expected dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    // ============ Evaluation Errors ============
    /// Evaluation requested outside the domain where it is defined.
    #[error("domain error: {message}")]
    Domain {
        /// Description of the domain violation.
        message: String,
    },

    /// A bounded iterative algorithm did not reach its tolerance.
    #[error("{algorithm} did not converge after {iterations} iterations: {message}")]
    NumericalConvergence {
        /// Name of the algorithm that failed.
        algorithm: &'static str,
        /// Number of iterations performed.
        iterations: usize,
        /// Additional detail (last error estimate, bracket, ...).
        message: String,
    },

    /// An optional capability is not provided by this class.
    #[error("{method} is not implemented for {class_name}")]
    NotImplemented {
        /// Class that lacks the capability.
        class_name: &'static str,
        /// Name of the missing method.
        method: &'static str,
    },

    // ============ Persistence Errors ============
    /// A persisted record could not be turned back into an object.
    #[error("persistence error: {message}")]
    Persistence {
        /// Description of the failure.
        message: String,
    },
}

/// A specialized `Result` type for uqcore operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new `Domain` error.
    #[must_use]
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Create a new `NumericalConvergence` error.
    #[must_use]
    pub fn convergence(
        algorithm: &'static str,
        iterations: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::NumericalConvergence {
            algorithm,
            iterations,
            message: message.into(),
        }
    }

    /// Create a new `NotImplemented` error.
    #[must_use]
    pub fn not_implemented(class_name: &'static str, method: &'static str) -> Self {
        Self::NotImplemented { class_name, method }
    }

    /// Create a new `Persistence` error.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Whether this error reports malformed input (including dimension errors).
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::DimensionMismatch { .. }
        )
    }
}

/// Check that a point dimension matches the expected one.
pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(err.to_string())
    }
}
