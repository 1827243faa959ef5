//! Goodness-of-fit tests.
//!
//! A test compares a sample against a hypothesis and produces a
//! [`TestResult`]: the statistic, its p-value and the decision at the
//! requested confidence level. The hypothesis is accepted when the p-value
//! exceeds `1 - level`.
//!
//! # Example
//!
//! ```
//! use uqcore::prelude::*;
//!
//! let mut rng = RandomGenerator::with_seed(11);
//! let sample = Exponential::new(1.0, 0.0)
//!     .unwrap()
//!     .get_sample(500, &mut rng)
//!     .unwrap();
//! let result = NormalityTest::anderson_darling_normal(&sample, 0.95).unwrap();
//! assert!(!result.binary_quality_measure());
//! ```

mod normality;

pub use normality::NormalityTest;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Outcome of a hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    test_type: String,
    binary_quality_measure: bool,
    p_value: f64,
    threshold: f64,
    statistic: f64,
}

impl TestResult {
    /// Record a test outcome; the hypothesis is accepted iff
    /// `p_value > threshold`.
    #[must_use]
    pub fn new(test_type: impl Into<String>, p_value: f64, threshold: f64, statistic: f64) -> Self {
        Self {
            test_type: test_type.into(),
            binary_quality_measure: p_value > threshold,
            p_value,
            threshold,
            statistic,
        }
    }

    /// Name of the test.
    #[must_use]
    pub fn test_type(&self) -> &str {
        &self.test_type
    }

    /// Whether the hypothesis is accepted.
    #[must_use]
    pub fn binary_quality_measure(&self) -> bool {
        self.binary_quality_measure
    }

    /// Probability of a statistic at least as extreme under the hypothesis.
    #[must_use]
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    /// Rejection threshold on the p-value, `1 - level`.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Value of the test statistic.
    #[must_use]
    pub fn statistic(&self) -> f64 {
        self.statistic
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class=TestResult name={} binaryQualityMeasure={} p-value threshold={} p-value={} statistic={}",
            self.test_type, self.binary_quality_measure, self.threshold, self.p_value, self.statistic
        )
    }
}

/// Fail unless `level` lies in the open interval (0, 1).
pub(crate) fn check_level(level: f64) -> Result<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "the test level must be in (0, 1), got {level}"
        )))
    }
}
