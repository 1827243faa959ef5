use std::f64::consts::PI;

use super::normal::{
    correlation_description, dimension_from_correlation_count, pack_correlation,
    unpack_correlation,
};
use super::{load_into, Distribution, DistributionBase, DistributionImplementation, Normal, Uniform};
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::special::{bivariate_normal_cdf, standard_normal_cdf, standard_normal_quantile};
use crate::types::{CholeskyFactor, CovarianceMatrix, Description, Interval, Point};

/// Gaussian copula with correlation matrix `R`: the law of
/// `(Φ(Z₀), …, Φ(Z_{d-1}))` for `Z ~ N(0, R)`.
///
/// The flat parameter is the strict lower triangle of `R`, row by row.
#[derive(Debug, Clone)]
pub struct NormalCopula {
    base: DistributionBase,
    correlation: CovarianceMatrix,
    cholesky: CholeskyFactor,
}

impl NormalCopula {
    /// Create a normal copula.
    ///
    /// # Errors
    ///
    /// Returns an error unless `correlation` is a positive definite matrix
    /// with unit diagonal.
    pub fn new(correlation: CovarianceMatrix) -> Result<Self> {
        let d = correlation.dimension();
        if d == 0 {
            return Err(Error::invalid_argument("a copula needs dimension ≥ 1"));
        }
        if let Some(i) = (0..d).find(|&i| correlation.get(i, i) != 1.0) {
            return Err(Error::invalid_argument(format!(
                "correlation matrix has diagonal entry {} at {i}",
                correlation.get(i, i)
            )));
        }
        let mut copula = Self::independent(d);
        copula.set_parameter(&Point::from_vec(pack_correlation(&correlation)))?;
        Ok(copula)
    }

    /// Independent copula of dimension `d ≥ 1`.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is 0.
    #[must_use]
    pub fn independent(dimension: usize) -> Self {
        assert!(dimension > 0, "a copula needs dimension ≥ 1");
        let correlation = CovarianceMatrix::identity(dimension);
        let cholesky = match correlation.cholesky() {
            Ok(cholesky) => cholesky,
            Err(_) => unreachable!("the identity matrix is positive definite"),
        };
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, dimension),
            correlation,
            cholesky,
        }
    }

    /// Create from the lower triangle of the correlation matrix, inferring
    /// the dimension from its length `d(d-1)/2`.
    ///
    /// # Errors
    ///
    /// Returns an error if the length matches no dimension or the matrix is
    /// not positive definite.
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        let d = dimension_from_correlation_count(parameter.dimension())?;
        let mut copula = Self::independent(d);
        copula.set_parameter(parameter)?;
        Ok(copula)
    }

    /// Correlation matrix of the underlying normal.
    #[must_use]
    pub fn correlation(&self) -> &CovarianceMatrix {
        &self.correlation
    }

    /// CDF of `N(0, R_S)` at `z`, where `S` selects the components.
    fn normal_cdf(&self, indices: &[usize], z: &[f64]) -> Result<f64> {
        match z {
            [] => Ok(1.0),
            [z0] => Ok(standard_normal_cdf(*z0)),
            [z0, z1] => Ok(bivariate_normal_cdf(
                *z0,
                *z1,
                self.correlation.get(indices[0], indices[1]),
            )),
            _ => {
                let correlation = self.correlation.select(indices);
                if correlation.is_diagonal() {
                    return Ok(z.iter().map(|zi| standard_normal_cdf(*zi)).product());
                }
                let k = indices.len();
                let mut normal = Normal::multivariate(Point::new(k), Point::filled(k, 1.0), correlation)?;
                normal.base_mut().set_settings(self.base.settings().clone());
                normal.compute_cdf(&Point::from(z))
            }
        }
    }
}

impl Default for NormalCopula {
    fn default() -> Self {
        Self::independent(2)
    }
}

impl DistributionImplementation for NormalCopula {
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

    fn is_copula(&self) -> bool {
        true
    }

    fn has_independent_copula(&self) -> bool {
        self.correlation.is_diagonal()
    }

    fn parameter(&self) -> Point {
        Point::from_vec(pack_correlation(&self.correlation))
    }

    fn parameter_description(&self) -> Description {
        Description::new(correlation_description(self.dimension()))
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        let (correlation, cholesky) = unpack_correlation(self.dimension(), parameter.as_slice())?;
        self.correlation = correlation;
        self.cholesky = cholesky;
        self.base.invalidate_moments();
        Ok(())
    }

    fn range(&self) -> Interval {
        let d = self.dimension();
        match Interval::new(Point::new(d), Point::filled(d, 1.0)) {
            Ok(range) => range,
            Err(_) => unreachable!("bounds share the distribution dimension"),
        }
    }

    fn compute_pdf(&self, u: &Point) -> Result<f64> {
        check_dimension(self.dimension(), u.dimension())?;
        if u.iter().any(|&ui| ui <= 0.0 || ui >= 1.0) {
            return Ok(0.0);
        }
        let z: Vec<f64> = u.iter().map(|&ui| standard_normal_quantile(ui)).collect();
        let y = self.cholesky.solve_lower(&z);
        // zᵀ R⁻¹ z - zᵀ z
        let quadratic: f64 = y.iter().map(|v| v * v).sum::<f64>() - z.iter().map(|v| v * v).sum::<f64>();
        Ok((-0.5 * quadratic - 0.5 * self.cholesky.log_determinant()).exp())
    }

    fn compute_cdf(&self, u: &Point) -> Result<f64> {
        check_dimension(self.dimension(), u.dimension())?;
        if u.iter().any(|&ui| ui <= 0.0) {
            return Ok(0.0);
        }
        // components at their upper bound drop out
        let indices: Vec<usize> = (0..self.dimension()).filter(|&i| u[i] < 1.0).collect();
        let z: Vec<f64> = indices
            .iter()
            .map(|&i| standard_normal_quantile(u[i]))
            .collect();
        self.normal_cdf(&indices, &z)
    }

    fn compute_scalar_quantile(&self, q: f64) -> Result<f64> {
        Ok(q)
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        let z: Vec<f64> = (0..self.dimension()).map(|_| rng.standard_normal()).collect();
        Ok(self
            .cholesky
            .mul(&z)
            .into_iter()
            .map(standard_normal_cdf)
            .collect())
    }

    fn compute_mean(&self) -> Result<Point> {
        Ok(Point::filled(self.dimension(), 0.5))
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        // Spearman's rho of the Gaussian copula is (6/π) asin(ρ/2)
        let d = self.dimension();
        let mut covariance = CovarianceMatrix::identity(d);
        for i in 0..d {
            covariance.set(i, i, 1.0 / 12.0);
            for j in 0..i {
                let rho = self.correlation.get(i, j);
                covariance.set(i, j, (6.0 / PI) * (0.5 * rho).asin() / 12.0);
            }
        }
        Ok(covariance)
    }

    fn compute_skewness(&self) -> Result<Point> {
        Ok(Point::new(self.dimension()))
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        Ok(Point::filled(self.dimension(), 1.8))
    }

    fn marginal(&self, i: usize) -> Result<Distribution> {
        if i >= self.dimension() {
            return Err(Error::invalid_argument(format!(
                "marginal index {i} is out of bounds for dimension {}",
                self.dimension()
            )));
        }
        let mut uniform = Uniform::new(0.0, 1.0)?;
        uniform
            .base_mut()
            .set_description(self.base.description().select(&[i]))?;
        Ok(Distribution::from(uniform))
    }

    fn marginal_subset(&self, indices: &[usize]) -> Result<Distribution> {
        if let [i] = indices {
            return self.marginal(*i);
        }
        let d = self.dimension();
        if let Some(&i) = indices.iter().find(|&&i| i >= d) {
            return Err(Error::invalid_argument(format!(
                "marginal index {i} is out of bounds for dimension {d}"
            )));
        }
        let mut copula = Self::new(self.correlation.select(indices))?;
        copula
            .base
            .set_description(self.base.description().select(indices))?;
        copula.base.set_settings(self.base.settings().clone());
        Ok(Distribution::from(copula))
    }
}

impl PersistentObject for NormalCopula {
    const CLASS_NAME: &'static str = "NormalCopula";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        let dimension: usize = advocate.load_attribute("dimension")?;
        if dimension == 0 {
            return Err(Error::persistence("NormalCopula record has dimension 0"));
        }
        let mut copula = Self::independent(dimension);
        load_into(&mut copula, advocate)?;
        Ok(copula)
    }
}
