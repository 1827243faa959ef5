use super::{
    load_into, require_positive, Distribution, DistributionBase, DistributionImplementation,
    LOG_PDF_FLOOR,
};
use crate::algo::GaussKronrod;
use crate::config::NumericalSettings;
use crate::error::{check_dimension, Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::special::{ln_beta, ln_gamma, regularized_incomplete_beta};
use crate::types::{CovarianceMatrix, Description, Interval, Point};

/// `P(X ≤ x)` for `X ~ Dirichlet(theta)`, by conditioning on the first
/// component: given `X₀ = u`, the rest scaled by `1/(1 - u)` is
/// `Dirichlet(theta[1..])`.
fn dirichlet_cdf(theta: &[f64], x: &[f64], settings: &NumericalSettings) -> Result<f64> {
    if x.iter().any(|&xi| xi <= 0.0) {
        return Ok(0.0);
    }
    let rest: f64 = theta[1..].iter().sum();
    if x.len() == 1 {
        return Ok(regularized_incomplete_beta(x[0].min(1.0), theta[0], rest));
    }
    let upper = x[0].min(1.0);
    let ln_norm = ln_beta(theta[0], rest);
    let integrand = |u: f64| -> Result<f64> {
        let density = ((theta[0] - 1.0) * u.ln() + (rest - 1.0) * (-u).ln_1p() - ln_norm).exp();
        let scaled: Vec<f64> = x[1..].iter().map(|xi| xi / (1.0 - u)).collect();
        Ok(density * dirichlet_cdf(&theta[1..], &scaled, settings)?)
    };

    // the conditional CDF has a kink wherever a scaled bound crosses 1
    let mut breaks: Vec<f64> = x[1..]
        .iter()
        .map(|xi| 1.0 - xi)
        .filter(|&b| b > 0.0 && b < upper)
        .collect();
    breaks.sort_by(f64::total_cmp);
    let integrator = GaussKronrod::new(
        settings.integration_max_subdivisions,
        settings.integration_tolerance,
    );
    let mut value = 0.0;
    let mut left = 0.0;
    for right in breaks.into_iter().chain(std::iter::once(upper)) {
        value += integrator.try_integrate(&integrand, left, right)?;
        left = right;
    }
    if value.is_nan() || value > 1.0 + settings.integration_tolerance {
        return Err(Error::convergence(
            "GaussKronrod",
            0,
            format!("integrated Dirichlet probability {value} is outside [0, 1]"),
        ));
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Dirichlet distribution on the open simplex `{x : xᵢ > 0, Σxᵢ < 1}` of
/// dimension `d`, with `d + 1` concentration parameters `θ`.
///
/// Its marginals are beta distributions, represented as one-dimensional
/// Dirichlet distributions.
#[derive(Debug, Clone)]
pub struct Dirichlet {
    base: DistributionBase,
    theta: Point,
    log_normalization: f64,
}

impl Dirichlet {
    /// Create a Dirichlet distribution of dimension `theta.dimension() - 1`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `theta` has at least two components, all
    /// positive and finite.
    pub fn new(theta: Point) -> Result<Self> {
        if theta.dimension() < 2 {
            return Err(Error::invalid_argument(format!(
                "a Dirichlet distribution needs at least 2 parameters, got {}",
                theta.dimension()
            )));
        }
        let mut dirichlet = Self::with_dimension(theta.dimension() - 1);
        dirichlet.set_parameter(&theta)?;
        Ok(dirichlet)
    }

    /// Alias of [`Dirichlet::new`] matching the other families.
    ///
    /// # Errors
    ///
    /// Same as [`Dirichlet::new`].
    pub fn from_parameter(parameter: &Point) -> Result<Self> {
        Self::new(parameter.clone())
    }

    /// Flat Dirichlet distribution (all `θᵢ = 1`) of the given dimension.
    fn with_dimension(dimension: usize) -> Self {
        let theta = Point::filled(dimension + 1, 1.0);
        Self {
            base: DistributionBase::new(Self::CLASS_NAME, dimension),
            log_normalization: ln_gamma(dimension as f64 + 1.0),
            theta,
        }
    }

    /// Concentration parameters.
    #[must_use]
    pub fn theta(&self) -> &Point {
        &self.theta
    }

    fn theta_sum(&self) -> f64 {
        self.theta.iter().sum()
    }

    /// Beta parameters `(θᵢ, Σθ - θᵢ)` of marginal `i`.
    fn marginal_beta(&self, i: usize) -> (f64, f64) {
        (self.theta[i], self.theta_sum() - self.theta[i])
    }
}

impl Default for Dirichlet {
    fn default() -> Self {
        Self::with_dimension(1)
    }
}

impl DistributionImplementation for Dirichlet {
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

    fn parameter(&self) -> Point {
        self.theta.clone()
    }

    fn parameter_description(&self) -> Description {
        Description::with_prefix("theta_", self.theta.dimension())
    }

    fn set_parameter(&mut self, parameter: &Point) -> Result<()> {
        check_dimension(self.dimension() + 1, parameter.dimension())?;
        for (i, &t) in parameter.iter().enumerate() {
            require_positive(&format!("theta_{i}"), t)?;
        }
        let sum: f64 = parameter.iter().sum();
        self.log_normalization =
            ln_gamma(sum) - parameter.iter().map(|&t| ln_gamma(t)).sum::<f64>();
        self.theta = parameter.clone();
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

    fn compute_pdf(&self, x: &Point) -> Result<f64> {
        let log_pdf = self.compute_log_pdf(x)?;
        Ok(if log_pdf == LOG_PDF_FLOOR { 0.0 } else { log_pdf.exp() })
    }

    fn compute_log_pdf(&self, x: &Point) -> Result<f64> {
        let d = self.dimension();
        check_dimension(d, x.dimension())?;
        let remainder = 1.0 - x.iter().sum::<f64>();
        if remainder <= 0.0 || x.iter().any(|&xi| xi <= 0.0) {
            return Ok(LOG_PDF_FLOOR);
        }
        let interior: f64 = x
            .iter()
            .zip(self.theta.iter())
            .map(|(xi, t)| (t - 1.0) * xi.ln())
            .sum();
        Ok(self.log_normalization + interior + (self.theta[d] - 1.0) * remainder.ln())
    }

    fn compute_cdf(&self, x: &Point) -> Result<f64> {
        check_dimension(self.dimension(), x.dimension())?;
        dirichlet_cdf(self.theta.as_slice(), x.as_slice(), self.base.settings())
    }

    fn get_realization(&self, rng: &mut RandomGenerator) -> Result<Point> {
        let draws = self
            .theta
            .iter()
            .map(|&t| rng.standard_gamma(t))
            .collect::<Result<Vec<f64>>>()?;
        let total: f64 = draws.iter().sum();
        Ok(draws[..self.dimension()].iter().map(|g| g / total).collect())
    }

    fn compute_mean(&self) -> Result<Point> {
        let sum = self.theta_sum();
        Ok(self.theta.iter().take(self.dimension()).map(|t| t / sum).collect())
    }

    fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        let d = self.dimension();
        let sum = self.theta_sum();
        let scale = sum * sum * (sum + 1.0);
        let mut covariance = CovarianceMatrix::identity(d);
        for i in 0..d {
            covariance.set(i, i, self.theta[i] * (sum - self.theta[i]) / scale);
            for j in 0..i {
                covariance.set(i, j, -self.theta[i] * self.theta[j] / scale);
            }
        }
        Ok(covariance)
    }

    fn compute_skewness(&self) -> Result<Point> {
        Ok((0..self.dimension())
            .map(|i| {
                let (a, b) = self.marginal_beta(i);
                2.0 * (b - a) * (a + b + 1.0).sqrt() / ((a + b + 2.0) * (a * b).sqrt())
            })
            .collect())
    }

    fn compute_kurtosis(&self) -> Result<Point> {
        Ok((0..self.dimension())
            .map(|i| {
                let (a, b) = self.marginal_beta(i);
                let excess = 6.0 * ((a - b).powi(2) * (a + b + 1.0) - a * b * (a + b + 2.0))
                    / (a * b * (a + b + 2.0) * (a + b + 3.0));
                3.0 + excess
            })
            .collect())
    }

    fn marginal(&self, i: usize) -> Result<Distribution> {
        self.marginal_subset(&[i])
    }

    fn marginal_subset(&self, indices: &[usize]) -> Result<Distribution> {
        let d = self.dimension();
        if indices.is_empty() {
            return Err(Error::invalid_argument("marginal indices must not be empty"));
        }
        for (k, &i) in indices.iter().enumerate() {
            if i >= d {
                return Err(Error::invalid_argument(format!(
                    "marginal index {i} is out of bounds for dimension {d}"
                )));
            }
            if indices[..k].contains(&i) {
                return Err(Error::invalid_argument(format!(
                    "marginal index {i} is repeated"
                )));
            }
        }
        // aggregation property: the dropped components merge into the last one
        let mut theta: Vec<f64> = indices.iter().map(|&i| self.theta[i]).collect();
        let kept: f64 = theta.iter().sum();
        theta.push(self.theta_sum() - kept);
        let mut marginal = Self::new(Point::from_vec(theta))?;
        marginal
            .base
            .set_description(self.base.description().select(indices))?;
        marginal.base.set_settings(self.base.settings().clone());
        Ok(Distribution::from(marginal))
    }
}

impl PersistentObject for Dirichlet {
    const CLASS_NAME: &'static str = "Dirichlet";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        DistributionImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        let dimension: usize = advocate.load_attribute("dimension")?;
        if dimension == 0 {
            return Err(Error::persistence("Dirichlet record has dimension 0"));
        }
        let mut dirichlet = Self::with_dimension(dimension);
        load_into(&mut dirichlet, advocate)?;
        Ok(dirichlet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_density() {
        // uniform on the triangle: density 2
        let d = Dirichlet::new(Point::from_vec(vec![1.0, 1.0, 1.0])).unwrap();
        let pdf = d.compute_pdf(&Point::from_vec(vec![0.2, 0.3])).unwrap();
        assert!((pdf - 2.0).abs() < 1e-12);
        assert_eq!(d.compute_pdf(&Point::from_vec(vec![0.6, 0.6])).unwrap(), 0.0);
    }

    #[test]
    fn test_flat_cdf() {
        // area of {x ≤ a, y ≤ b, x + y < 1} times 2
        let d = Dirichlet::new(Point::from_vec(vec![1.0, 1.0, 1.0])).unwrap();
        let p = d.compute_cdf(&Point::from_vec(vec![0.5, 0.5])).unwrap();
        assert!((p - 0.5).abs() < 1e-7);
        let p = d.compute_cdf(&Point::from_vec(vec![0.7, 0.6])).unwrap();
        let area = 0.7 * 0.6 - 0.5 * 0.3 * 0.3;
        assert!((p - 2.0 * area).abs() < 1e-7);
        let p = d.compute_cdf(&Point::from_vec(vec![1.0, 1.0])).unwrap();
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_beta_marginal() {
        let d = Dirichlet::new(Point::from_vec(vec![2.0, 3.0, 5.0])).unwrap();
        let m = d.marginal(1).unwrap();
        assert_eq!(m.parameter(), Point::from_vec(vec![3.0, 7.0]));
        let mean = m.get_mean().unwrap()[0];
        assert!((mean - 0.3).abs() < 1e-15);
        let p = m.compute_cdf(&Point::scalar(0.3)).unwrap();
        let q = m.compute_quantile(p).unwrap()[0];
        assert!((q - 0.3).abs() < 1e-9);
        assert!(d.marginal_subset(&[1, 1]).is_err());
    }

    #[test]
    fn test_moments_against_sample() {
        let d = Dirichlet::new(Point::from_vec(vec![2.0, 3.0, 5.0])).unwrap();
        let mut rng = RandomGenerator::with_seed(21);
        let sample = d.get_sample(20_000, &mut rng).unwrap();
        let mean = sample.compute_mean().unwrap();
        assert!((mean[0] - 0.2).abs() < 0.005);
        assert!((mean[1] - 0.3).abs() < 0.005);
        let cov = sample.compute_covariance().unwrap();
        let exact = d.get_covariance().unwrap();
        assert!((cov.get(0, 1) - exact.get(0, 1)).abs() < 0.001);
        assert!(sample.points().all(|x| x[0] + x[1] < 1.0));
    }

    #[test]
    fn test_skewness_matches_quadrature() {
        let d = Dirichlet::new(Point::from_vec(vec![2.0, 4.0])).unwrap();
        let closed = d.compute_skewness().unwrap()[0];
        let mean = d.get_mean().unwrap()[0];
        let sd = d.get_standard_deviation().unwrap()[0];
        let numeric = GaussKronrod::default()
            .integrate(
                |x| ((x - mean) / sd).powi(3) * d.compute_pdf(&Point::scalar(x)).unwrap_or(0.0),
                0.0,
                1.0,
            )
            .unwrap();
        assert!((closed - numeric).abs() < 1e-7);
    }

    #[test]
    fn test_persistence() {
        let d = Dirichlet::new(Point::from_vec(vec![0.5, 1.5, 2.5])).unwrap();
        let restored = Dirichlet::load(&d.to_advocate().unwrap()).unwrap();
        assert_eq!(restored.repr(), d.repr());
        assert_eq!(restored.dimension(), 2);
    }
}
