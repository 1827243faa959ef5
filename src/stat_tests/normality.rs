use log::debug;

use super::{check_level, TestResult};
use crate::error::{Error, Result};
use crate::special::{standard_normal_cdf, standard_normal_complementary_cdf};
use crate::types::Sample;

/// Smallest sample the normality tests accept.
const MIN_SIZE: usize = 8;

/// Tests of normality with estimated mean and standard deviation.
///
/// The normal distribution is fitted by the sample mean and the unbiased
/// standard deviation, so the statistics are modified and the p-values come
/// from the Stephens approximations for the composite hypothesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalityTest;

impl NormalityTest {
    /// Anderson-Darling test of normality.
    ///
    /// The statistic `A²` is scaled by `1 + 0.75/n + 2.25/n²`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a sample that is not univariate, has
    /// fewer than 8 points, is constant or holds non-finite values, and for a
    /// level outside (0, 1).
    pub fn anderson_darling_normal(sample: &Sample, level: f64) -> Result<TestResult> {
        let z = standardized_order_statistics(sample, level)?;
        let n = z.len() as f64;
        let sum: f64 = z
            .iter()
            .zip(z.iter().rev())
            .enumerate()
            .map(|(i, (low, high))| {
                let weight = (2 * i + 1) as f64;
                weight * (standard_normal_cdf(*low).ln() + standard_normal_complementary_cdf(*high).ln())
            })
            .sum();
        let statistic = (-n - sum / n) * (1.0 + 0.75 / n + 2.25 / (n * n));
        let p_value = anderson_darling_p_value(statistic);
        debug!("Anderson-Darling normality: A* = {statistic}, p = {p_value}");
        Ok(TestResult::new("AndersonDarlingNormal", p_value, 1.0 - level, statistic))
    }

    /// Cramér-von Mises test of normality.
    ///
    /// The statistic `W²` is scaled by `1 + 0.5/n`.
    ///
    /// # Errors
    ///
    /// Same as [`NormalityTest::anderson_darling_normal`].
    pub fn cramer_von_mises_normal(sample: &Sample, level: f64) -> Result<TestResult> {
        let z = standardized_order_statistics(sample, level)?;
        let n = z.len() as f64;
        let sum: f64 = z
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let expected = (2 * i + 1) as f64 / (2.0 * n);
                (standard_normal_cdf(*y) - expected).powi(2)
            })
            .sum();
        let statistic = (1.0 / (12.0 * n) + sum) * (1.0 + 0.5 / n);
        let p_value = cramer_von_mises_p_value(statistic);
        debug!("Cramer-von Mises normality: W* = {statistic}, p = {p_value}");
        Ok(TestResult::new("CramerVonMisesNormal", p_value, 1.0 - level, statistic))
    }
}

/// Sorted values of `sample` centered by the mean and scaled by the unbiased
/// standard deviation.
fn standardized_order_statistics(sample: &Sample, level: f64) -> Result<Vec<f64>> {
    check_level(level)?;
    if sample.dimension() != 1 {
        return Err(Error::invalid_argument(format!(
            "a normality test needs a sample of dimension 1, got dimension {}",
            sample.dimension()
        )));
    }
    if sample.size() < MIN_SIZE {
        return Err(Error::invalid_argument(format!(
            "a normality test needs at least {MIN_SIZE} points, got {}",
            sample.size()
        )));
    }
    if sample.data().iter().any(|x| !x.is_finite()) {
        return Err(Error::invalid_argument(
            "a normality test needs finite values",
        ));
    }
    let mean = sample.compute_mean()?[0];
    let sd = sample.compute_standard_deviation()?[0];
    if sd <= 0.0 {
        return Err(Error::invalid_argument(
            "a normality test needs a non-constant sample",
        ));
    }
    Ok(sample
        .sort_column(0)
        .into_iter()
        .map(|x| (x - mean) / sd)
        .collect())
}

/// Stephens' p-value of the modified Anderson-Darling statistic.
fn anderson_darling_p_value(a: f64) -> f64 {
    let p = if a < 0.2 {
        1.0 - (-13.436 + 101.14 * a - 223.73 * a * a).exp()
    } else if a < 0.34 {
        1.0 - (-8.318 + 42.796 * a - 59.938 * a * a).exp()
    } else if a < 0.6 {
        (0.9177 - 4.279 * a - 1.38 * a * a).exp()
    } else if a < 13.0 {
        (1.2937 - 5.709 * a + 0.0186 * a * a).exp()
    } else {
        0.0
    };
    p.clamp(0.0, 1.0)
}

/// Stephens' p-value of the modified Cramér-von Mises statistic.
fn cramer_von_mises_p_value(w: f64) -> f64 {
    let p = if w < 0.0275 {
        1.0 - (-13.953 + 775.5 * w - 12542.61 * w * w).exp()
    } else if w < 0.051 {
        1.0 - (-5.903 + 179.546 * w - 1515.29 * w * w).exp()
    } else if w < 0.092 {
        (0.886 - 31.62 * w + 10.897 * w * w).exp()
    } else if w < 1.1 {
        (1.111 - 34.242 * w + 12.832 * w * w).exp()
    } else {
        0.0
    };
    p.clamp(0.0, 1.0)
}
