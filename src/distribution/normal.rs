use std::f64::consts::PI;

use super::{
    fallback, load_into, require_finite, require_positive, Distribution, DistributionBase,
    DistributionImplementation,
};
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::special::{
    bivariate_normal_cdf, standard_normal_cdf, standard_normal_complementary_cdf,
    standard_normal_quantile,
};
use crate::types::{CholeskyFactor, CovarianceMatrix, Description, Interval, Point};

/// Names `R_i_j` (i > j) of the strict lower triangle of a correlation matrix.
pub(super) fn correlation_description(dimension: usize) -> Vec<String> {
    (1..dimension)
        .flat_map(|i| (0..i).map(move |j| format!("R_{i}_{j}")))
        .collect()
}

/// Strict lower triangle of `correlation`, row by row.
pub(super) fn pack_correlation(correlation: &CovarianceMatrix) -> Vec<f64> {
    let d = correlation.dimension();
    (1..d)
        .flat_map(|i| (0..i).map(move |j| correlation.get(i, j)))
        .collect()
}

/// Rebuild a correlation matrix from its strict lower triangle and factor it.
pub(super) fn unpack_correlation(
    dimension: usize,
    values: &[f64],
) -> Result<(CovarianceMatrix, CholeskyFactor)> {
    check_dimension(dimension * (dimension - 1) / 2, values.len())?;
    let mut correlation = CovarianceMatrix::identity(dimension);
    let mut k = 0;
    for i in 1..dimension {
        for j in 0..i {
            let r = values[k];
            if !(-1.0..=1.0).contains(&r) {
                return Err(Error::invalid_argument(format!(
                    "correlation R_{i}_{j} = {r} is outside [-1, 1]"
                )));
            }
            correlation.set(i, j, r);
            k += 1;
        }
    }
    let cholesky = correlation.cholesky()?;
    Ok((correlation, cholesky))
}

/// Dimension `d` of a correlation matrix with `count = d(d-1)/2` free entries.
pub(super) fn dimension_from_correlation_count(count: usize) -> Result<usize> {
    let mut d = 1;
    while d * (d - 1) / 2 < count {
        d += 1;
    }
    if d * (d - 1) / 2 == count {
        Ok(d)
    } else {
        Err(Error::invalid_argument(format!(
            "{count} values do not form the lower triangle of a correlation matrix"
        )))
    }
}

/// Multivariate normal distribution with means `μ`, standard deviations `σ`
/// and correlation matrix `R`.
///
/// The flat parameter is `[μ₀…μ_{d-1}, σ₀…σ_{d-1}, R_1_0, R_2_0, R_2_1, …]`.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let normal = Normal::new(1.0, 2.0).unwrap();
/// let p = normal.compute_cdf(&Point::scalar(1.0)).unwrap();
/// assert!((p - 0.5).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct Normal {
    base: DistributionBase,
    mu: Point,
    sigma: Point,
    correlation: CovarianceMatrix,
    cholesky: CholeskyFactor,
    log_normalization: f64,
}

impl Normal {
    /// Univariate normal distribution.
    ///
    /// # Errors
    ///
    /// Returns an error unless `mu` is finite and `sigma > 0`.
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        Self::multivariate(
            Point::scalar(mu),
            Point::scalar(sigma),
            CovarianceMatrix::identity(1),
        )
    }

    /// Multivariate normal distribution.
    ///
    /// # Errors
    ///
    /// Returns an error on inconsistent dimensions, non-positive `sigma`, or
    /// a correlation matrix that is not a positive definite unit-diagonal
    /// matrix.
    pub fn multivariate(mu: Point, sigma: Point, correlation: CovarianceMatrix) -> Result<Self> {
        let dimension = mu.dimension();
        if dimension == 0 {
            return Err(Error::invalid_argument("a normal distribution needs dimension ≥ 1"));
        }
        check_dimension(dimension, sigma.dimension())?;
        check_dimension(dimension, correlation.dimension())?;
        if let Some(i) = (0..dimension).find(|&i| correlation.get(i, i) != 1.0) {
            return Err(Error::invalid_argument(format!(
                "correlation matrix has diagonal entry {} at {i}",
                correlation.get(i, i)
            )));
        }
        let mut parameter = mu.into_vec();
        parameter.extend(sigma.iter());
        parameter.extend(pack_correlation(&correlation));
        let mut normal = Self::standard(dimension);
        normal.set_parameter(&Point::from_vec(parameter))?;
        Ok(normal)
    }

    /// Standard normal distribution in dimension `d ≥ 1`.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is 0.
    #[must_use]
    pub fn standard(dimension: usize) -> Self {
        assert!(dimension > 0, "a normal distribution needs dimension ≥ 1");
        let correlation = CovarianceMatrix::identity(dimension);
        let cholesky = match correlation.cholesky() {
            Ok(cholesky) => cholesky,
            Err(_) => unreachable!("the identity matrix is positive definite"),
        };
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, dimension),
            mu: Point::new(dimension),
            sigma: Point::filled(dimension, 1.0),
            correlation,
            cholesky,
            log_normalization: -0.5 * dimension as f64 * (2.0 * PI).ln(),
        }
    }

    /// Create from the flat parameter vector, inferring the dimension from
    /// its length `2d + d(d-1)/2`.
    ///
    /// # Errors
    ///
    /// Returns an error if the length matches no dimension or a value is
    /// invalid.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        let length = parameter.dimension();
        let dimension = (1..=length)
            .find(|&d| 2 * d + d * (d - 1) / 2 >= length)
            .filter(|&d| 2 * d + d * (d - 1) / 2 == length)
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "{length} values do not form a normal parameter vector"
                ))
            })?;
        let mut normal = Self::standard(dimension);
        normal.set_parameter(parameter)?;
        Ok(normal)
    }

    /// Means.
    #[must_use]
    pub fn mu(&self) -> &Point {
        &self.mu
    }

    /// Standard deviations.
    #[must_use]
    pub fn sigma(&self) -> &Point {
        &self.sigma
    }

    /// Correlation matrix.
    #[must_use]
    pub fn correlation(&self) -> &CovarianceMatrix {
        &self.correlation
    }

    fn standardize(&self, x: &Point) -> Vec<f64> {
        x.iter()
            .zip(self.mu.iter().zip(self.sigma.iter()))
            .map(|(xi, (m, s))| (xi - m) / s)
            .collect()
    }

    fn tail_radius(&self) -> f64 {
        -standard_normal_quantile(self.base.settings().cdf_epsilon)
    }
}

impl Default for Normal {
    fn default() -> Self {
        Self::standard(1)
    }
}

impl DistributionImplementation for Normal {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn base(&self) -> &DistributionBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DistributionBase {
        &mut self.base
    }

    fn clone_box(&self) -> Box<dyn DistributionImplementation> {
        Box::new(self.clone())
    }

    fn is_elliptical(&self) -> bool {
        true
    }

    fn has_independent_copula(&self) -> bool {
        self.correlation.is_diagonal()
    }

    fn parameter(&self) -> Point {
        let mut values = self.mu.as_slice().to_vec();
        values.extend(self.sigma.iter());
        values.extend(pack_correlation(&self.correlation));
        Point::from_vec(values)
    }

    fn parameter_description(&self) -> Description {
        let d = self.dimension();
        if d == 1 {
            return Description::from(vec!["mu", "sigma"]);
        }
        let mut names: Vec<String> = (0..d).map(|i| format!("mu_{i}")).collect();
        names.extend((0..d).map(|i| format!("sigma_{i}")));
        names.extend(correlation_description(d));
        Description::new(names)
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        let d = self.dimension();
        check_dimension(2 * d + d * (d - 1) / 2, parameter.dimension())?;
        let values = parameter.as_slice();
        for (i, &m) in values[..d].iter().enumerate() {
            require_finite(&format!("mu_{i}"), m)?;
        }
        for (i, &s) in values[d..2 * d].iter().enumerate() {
            require_positive(&format!("sigma_{i}"), s)?;
        }
        let (correlation, cholesky) = unpack_correlation(d, &values[2 * d..])?;

        self.mu = Point::from(&values[..d]);
        self.sigma = Point::from(&values[d..2 * d]);
        self.log_normalization = -0.5 * d as f64 * (2.0 * PI).ln()
            - self.sigma.iter().map(|s| s.ln()).sum::<f64>()
            - 0.5 * cholesky.log_determinant();
        self.correlation = correlation;
        self.cholesky = cholesky;
        self.base.invalidate_moments();
        Ok(())
    }

    fn range(&self) -> Interval {
        let radius = self.tail_radius();
        let lower = self
            .mu
            .iter()
            .zip(self.sigma.iter())
            .map(|(m, s)| m - radius * s)
            .collect();
        let upper = self
            .mu
            .iter()
            .zip(self.sigma.iter())
            .map(|(m, s)| m + radius * s)
            .collect();
        let d = self.dimension();
        match Interval::with_finiteness(lower, upper, vec![false; d], vec![false; d]) {
            Ok(range) => range,
            Err(_) => unreachable!("bounds share the distribution dimension"),
        }
    }

    fn compute_pdf(&self, x: &Point) -> Result<f64> {
        Ok(self.compute_log_pdf(x)?.exp())
    }

    fn compute_log_pdf(&self, x: &Point) -> Result<f64> {
        check_dimension(self.dimension(), x.dimension())?;
        let y = self.cholesky.solve_lower(&self.standardize(x));
        let quadratic: f64 = y.iter().map(|v| v * v).sum();
        Ok(self.log_normalization - 0.5 * quadratic)
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(self.dimension(), x.dimension())?;
        let z = self.standardize(x);
        match z.as_slice() {
            [z0] => Ok(standard_normal_cdf(*z0)),
            [z0, z1] => Ok(bivariate_normal_cdf(*z0, *z1, self.correlation.get(1, 0))),
            _ if self.correlation.is_diagonal() => {
                Ok(z.iter().map(|zi| standard_normal_cdf(*zi)).product())
            }
            _ => fallback::multivariate_cdf(self, x),
        }
    }

    fn compute_complementary_cdf(&self, x: &Point) -> Result<f64> {
        if self.dimension() == 1 {
            check_dimension(1, x.dimension())?;
            return Ok(standard_normal_complementary_cdf(self.standardize(x)[0]));
        }
        Ok(0.5 + (0.5 - self.compute_cdf(x)?))
    }

    fn compute_survival_function(&self, x: &Point) -> Result<f64> {
        check_dimension(self.dimension(), x.dimension())?;
        // P(X > x) = P(-X < -x) and -X has the same correlation
        let reflected: Point = x
            .iter()
            .zip(self.mu.iter())
            .map(|(xi, m)| 2.0 * m - xi)
            .collect();
        self.compute_cdf(&reflected)
    }

    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        Ok(self.mu[0] + self.sigma[0] * standard_normal_quantile(q))
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        let z: Vec<f64> = (0..self.dimension()).map(|_| rng.standard_normal()).collect();
        Ok(self
            .cholesky
            .mul(&z)
            .iter()
            .zip(self.mu.iter().zip(self.sigma.iter()))
            .map(|(y, (m, s))| m + s * y)
            .collect())
    }

    fn compute_mean(&self) -> Result<Point> {
        Ok(self.mu.clone())
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        let d = self.dimension();
        let mut covariance = CovarianceMatrix::identity(d);
        for i in 0..d {
            for j in 0..=i {
                covariance.set(i, j, self.sigma[i] * self.sigma[j] * self.correlation.get(i, j));
            }
        }
        Ok(covariance)
    }

    fn get_standard_deviation(&self) -> Result<Point> {
        Ok(self.sigma.clone())
    }

    fn compute_skewness(&self) -> Result<Point> {
        Ok(Point::new(self.dimension()))
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        Ok(Point::filled(self.dimension(), 3.0))
    }

    fn marginal(&self, i: usize) -> Result<Distribution> {
        self.marginal_subset(&[i])
    }

    fn marginal_subset(&self, indices: &[usize]) -> Result<Distribution> {
        let d = self.dimension();
        if let Some(&i) = indices.iter().find(|&&i| i >= d) {
            return Err(Error::invalid_argument(format!(
                "marginal index {i} is out of bounds for dimension {d}"
            )));
        }
        let mu = indices.iter().map(|&i| self.mu[i]).collect();
        let sigma = indices.iter().map(|&i| self.sigma[i]).collect();
        let mut marginal = Self::multivariate(mu, sigma, self.correlation.select(indices))?;
        marginal
            .base
            .set_description(self.base.description().select(indices))?;
        marginal.base.set_settings(self.base.settings().clone());
        Ok(Distribution::from(marginal))
    }
}

impl PersistentObject for Normal {
    const CLASS_NAME: &'static str = "Normal";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        let dimension: usize = advocate.load_attribute("dimension")?;
        if dimension == 0 {
            return Err(Error::persistence("Normal record has dimension 0"));
        }
        let mut normal = Self::standard(dimension);
        load_into(&mut normal, advocate)?;
        Ok(normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated() -> Normal {
        let r = CovarianceMatrix::from_rows(&[vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        Normal::multivariate(
            Point::from_vec(vec![1.0, -1.0]),
            Point::from_vec(vec![2.0, 0.5]),
            r,
        )
        .unwrap()
    }

    #[test]
    fn test_univariate_values() {
        let n = Normal::new(1.0, 2.0).unwrap();
        let pdf = n.compute_pdf(&Point::scalar(1.0)).unwrap();
        assert!((pdf - 1.0 / (2.0 * (2.0 * PI).sqrt())).abs() < 1e-15);
        let x = n.compute_quantile(0.975, false).unwrap()[0];
        assert!((x - (1.0 + 2.0 * 1.959_963_984_540_054)).abs() < 1e-9);
        let p = n.compute_complementary_cdf(&Point::scalar(x)).unwrap();
        assert!((p - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_layout() {
        let n = correlated();
        assert_eq!(
            n.parameter(),
            Point::from_vec(vec![1.0, -1.0, 2.0, 0.5, 0.5])
        );
        let description = n.parameter_description();
        let names: Vec<&str> = description.iter().collect();
        assert_eq!(names, vec!["mu_0", "mu_1", "sigma_0", "sigma_1", "R_1_0"]);
        let rebuilt = Normal::from_parameter(&n.parameter()).unwrap();
        assert_eq!(rebuilt.repr(), n.repr());
        assert!(Normal::from_parameter(&Point::new(3)).is_err());
    }

    #[test]
    fn test_covariance() {
        let c = correlated().get_covariance().unwrap();
        assert!((c.get(0, 0) - 4.0).abs() < 1e-15);
        assert!((c.get(1, 1) - 0.25).abs() < 1e-15);
        assert!((c.get(0, 1) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_bivariate_cdf_at_mean() {
        // P(Z1 ≤ 0, Z2 ≤ 0) = 1/4 + asin(ρ)/(2π)
        let n = correlated();
        let p = n.compute_cdf(&Point::from_vec(vec![1.0, -1.0])).unwrap();
        let expected = 0.25 + 0.5f64.asin() / (2.0 * PI);
        assert!((p - expected).abs() < 1e-10);
        let s = n
            .compute_survival_function(&Point::from_vec(vec![1.0, -1.0]))
            .unwrap();
        assert!((s - expected).abs() < 1e-10);
    }

    #[test]
    fn test_trivariate_fallback_cdf() {
        let r = CovarianceMatrix::from_rows(&[
            vec![1.0, 0.3, 0.0],
            vec![0.3, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let n = Normal::multivariate(Point::new(3), Point::filled(3, 1.0), r).unwrap();
        let p = n.compute_cdf(&Point::new(3)).unwrap();
        let expected = (0.25 + 0.3f64.asin() / (2.0 * PI)) * 0.5;
        assert!((p - expected).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid_correlation() {
        let r = CovarianceMatrix::from_rows(&[vec![1.0, 1.5], vec![1.5, 1.0]]).unwrap();
        assert!(Normal::multivariate(Point::new(2), Point::filled(2, 1.0), r).is_err());
        let mut n = correlated();
        let before = n.parameter();
        let bad = Point::from_vec(vec![0.0, 0.0, 1.0, -1.0, 0.0]);
        assert!(n.set_parameter(&bad).is_err());
        assert_eq!(n.parameter(), before);
    }

    #[test]
    fn test_marginal() {
        let m = correlated().marginal(1).unwrap();
        assert_eq!(m.dimension(), 1);
        assert_eq!(m.parameter(), Point::from_vec(vec![-1.0, 0.5]));
        assert_eq!(&m.description()[0], "X1");
    }

    #[test]
    fn test_sample_moments() {
        let n = correlated();
        let mut rng = RandomGenerator::with_seed(11);
        let sample = n.get_sample(20_000, &mut rng).unwrap();
        let mean = sample.compute_mean().unwrap();
        assert!((mean[0] - 1.0).abs() < 0.06);
        assert!((mean[1] + 1.0).abs() < 0.015);
        let cov = sample.compute_covariance().unwrap();
        assert!((cov.get(0, 1) - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_persistence() {
        let n = correlated();
        let restored = Normal::load(&n.to_advocate().unwrap()).unwrap();
        assert_eq!(restored.repr(), n.repr());
    }
}
