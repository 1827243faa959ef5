//! Central numerical fallbacks behind the default trait methods.

use log::debug;

use super::DistributionImplementation;
use crate::algo::{Brent, GaussKronrod, GaussLegendre};
use crate::config::NumericalSettings;
use crate::error::{Error, Result};
use crate::types::{CovarianceMatrix, Interval, Point};

fn integrator(settings: &NumericalSettings) -> GaussKronrod {
    GaussKronrod::new(
        settings.integration_max_subdivisions,
        settings.integration_tolerance,
    )
}

fn quantile_solver(settings: &NumericalSettings) -> Brent {
    Brent::new(settings.quantile_epsilon, settings.quantile_iterations)
}

/// Accept a quadrature result as a probability, clamping rounding noise.
fn check_probability(value: f64, tolerance: f64, algorithm: &'static str) -> Result<f64> {
    if value.is_nan() || value < -tolerance || value > 1.0 + tolerance {
        return Err(Error::convergence(
            algorithm,
            0,
            format!("integrated probability {value} is outside [0, 1]"),
        ));
    }
    Ok(value.clamp(0.0, 1.0))
}

fn univariate_bounds<D>(dist: &D) -> (f64, f64)
where
    D: DistributionImplementation + ?Sized,
{
    let range = dist.range();
    (range.lower_bound()[0], range.upper_bound()[0])
}

pub(super) fn univariate_cdf<D>(dist: &D, x: f64) -> Result<f64>
where
    D: DistributionImplementation + ?Sized,
{
    let (lower, upper) = univariate_bounds(dist);
    if x <= lower {
        return Ok(0.0);
    }
    if x >= upper {
        return Ok(1.0);
    }
    let settings = dist.settings();
    let pdf = |t: f64| dist.compute_pdf(&Point::scalar(t));
    // integrate over the shorter side of x
    let value = if x - lower <= upper - x {
        integrator(settings).try_integrate(pdf, lower, x)?
    } else {
        1.0 - integrator(settings).try_integrate(pdf, x, upper)?
    };
    check_probability(value, settings.integration_tolerance, "GaussKronrod")
}

pub(super) fn discrete_cdf<D>(dist: &D, x: f64) -> Result<f64>
where
    D: DistributionImplementation + ?Sized,
{
    let epsilon = dist.settings().support_epsilon;
    let support = dist.support()?;
    let mut cdf = 0.0;
    for point in support.points() {
        if point[0] > x + epsilon {
            break;
        }
        cdf += dist.compute_pdf(&point)?;
    }
    Ok(cdf.min(1.0))
}

pub(super) fn multivariate_cdf<D>(dist: &D, x: &Point) -> Result<f64>
where
    D: DistributionImplementation + ?Sized,
{
    let settings = dist.settings();
    let dimension = dist.dimension();
    if dimension > settings.max_fallback_dimension {
        return Err(Error::not_implemented(dist.class_name(), "compute_cdf"));
    }
    let range = dist.range();
    let lower = range.lower_bound().as_slice();
    if x.iter().zip(lower).any(|(xi, lo)| xi <= lo) {
        return Ok(0.0);
    }
    let upper: Vec<f64> = x
        .iter()
        .zip(range.upper_bound().iter())
        .map(|(xi, hi)| xi.min(*hi))
        .collect();
    let pdf = |y: &[f64]| dist.compute_pdf(&Point::from(y));
    let nodes = settings.integration_nodes;
    let coarse = GaussLegendre::new(nodes)?.integrate_box(pdf, lower, &upper)?;
    let fine = GaussLegendre::new(2 * nodes)?.integrate_box(pdf, lower, &upper)?;
    debug!(
        "{}: tensor Gauss-Legendre CDF at {x}: {coarse} ({nodes} nodes), {fine} ({} nodes)",
        dist.class_name(),
        2 * nodes
    );
    if (fine - coarse).abs() > settings.integration_tolerance {
        return Err(Error::convergence(
            "GaussLegendre",
            2 * nodes,
            format!(
                "tensor rules disagree by {:e} at {x}",
                (fine - coarse).abs()
            ),
        ));
    }
    check_probability(fine, settings.integration_tolerance, "GaussLegendre")
}

pub(super) fn probability<D>(dist: &D, interval: &Interval) -> Result<f64>
where
    D: DistributionImplementation + ?Sized,
{
    let range = dist.range();
    let lower: Vec<f64> = interval
        .lower_bound()
        .iter()
        .zip(range.lower_bound().iter())
        .map(|(a, lo)| a.max(*lo))
        .collect();
    let upper: Vec<f64> = interval
        .upper_bound()
        .iter()
        .zip(range.upper_bound().iter())
        .map(|(b, hi)| b.min(*hi))
        .collect();
    if lower.iter().zip(&upper).any(|(a, b)| a > b) {
        return Ok(0.0);
    }
    let dimension = dist.dimension();
    if dist.is_discrete() && dimension == 1 {
        let epsilon = dist.settings().support_epsilon;
        let mut total = 0.0;
        for point in dist.support()?.points() {
            if point[0] >= lower[0] - epsilon && point[0] <= upper[0] + epsilon {
                total += dist.compute_pdf(&point)?;
            }
        }
        return Ok(total.min(1.0));
    }
    // inclusion-exclusion over the corners of the box
    let mut total = 0.0;
    for mask in 0..(1usize << dimension) {
        let corner: Point = (0..dimension)
            .map(|i| if (mask >> i) & 1 == 1 { lower[i] } else { upper[i] })
            .collect();
        let sign = if mask.count_ones() % 2 == 0 { 1.0 } else { -1.0 };
        total += sign * dist.compute_cdf(&corner)?;
    }
    Ok(total.clamp(0.0, 1.0))
}

pub(super) fn univariate_quantile<D>(dist: &D, q: f64) -> Result<f64>
where
    D: DistributionImplementation + ?Sized,
{
    let (lower, upper) = univariate_bounds(dist);
    let cdf = |x: f64| dist.compute_cdf(&Point::scalar(x));
    let f_lower = cdf(lower)? - q;
    if f_lower >= 0.0 {
        return Ok(lower);
    }
    let f_upper = cdf(upper)? - q;
    if f_upper <= 0.0 {
        return Ok(upper);
    }
    debug!(
        "{}: solving CDF(x) = {q} on [{lower}, {upper}]",
        dist.class_name()
    );
    quantile_solver(dist.settings()).solve_bracketed(
        |x| Ok(cdf(x)? - q),
        lower,
        upper,
        f_lower,
        f_upper,
    )
}

pub(super) fn discrete_quantile<D>(dist: &D, q: f64) -> Result<f64>
where
    D: DistributionImplementation + ?Sized,
{
    let epsilon = dist.settings().support_epsilon;
    let support = dist.support()?;
    let mut cdf = 0.0;
    let mut last = dist.range().upper_bound()[0];
    for point in support.points() {
        cdf += dist.compute_pdf(&point)?;
        last = point[0];
        if cdf >= q - epsilon {
            return Ok(last);
        }
    }
    Ok(last)
}

pub(super) fn diagonal_quantile<D>(dist: &D, q: f64) -> Result<Point>
where
    D: DistributionImplementation + ?Sized,
{
    let dimension = dist.dimension();
    let marginals = (0..dimension)
        .map(|i| dist.marginal(i))
        .collect::<Result<Vec<_>>>()?;
    let curve = |tau: f64| -> Result<Point> {
        marginals
            .iter()
            .map(|m| m.compute_scalar_quantile(tau))
            .collect()
    };
    let objective = |tau: f64| -> Result<f64> { Ok(dist.compute_cdf(&curve(tau)?)? - q) };

    // Fréchet bounds: C(τ,…,τ) ≤ τ and C(τ,…,τ) ≥ 1 - d(1 - τ)
    let a = q;
    let b = 1.0 - (1.0 - q) / dimension as f64;
    let fa = objective(a)?;
    if fa >= 0.0 {
        return curve(a);
    }
    let fb = objective(b)?;
    if fb <= 0.0 {
        return curve(b);
    }
    debug!(
        "{}: solving the diagonal quantile equation for q = {q} on [{a}, {b}]",
        dist.class_name()
    );
    let tau = quantile_solver(dist.settings()).solve_bracketed(objective, a, b, fa, fb)?;
    curve(tau)
}

/// `E[(X - center)^order]` of a univariate distribution.
pub(super) fn univariate_moment<D>(dist: &D, order: i32, center: f64) -> Result<f64>
where
    D: DistributionImplementation + ?Sized,
{
    if dist.is_discrete() {
        let mut moment = 0.0;
        for point in dist.support()?.points() {
            moment += (point[0] - center).powi(order) * dist.compute_pdf(&point)?;
        }
        return Ok(moment);
    }
    let (lower, upper) = univariate_bounds(dist);
    integrator(dist.settings()).try_integrate(
        |x| Ok((x - center).powi(order) * dist.compute_pdf(&Point::scalar(x))?),
        lower,
        upper,
    )
}

pub(super) fn multivariate_mean<D>(dist: &D) -> Result<Point>
where
    D: DistributionImplementation + ?Sized,
{
    (0..dist.dimension())
        .map(|i| Ok(dist.marginal(i)?.get_mean()?[0]))
        .collect()
}

pub(super) fn multivariate_covariance<D>(dist: &D) -> Result<CovarianceMatrix>
where
    D: DistributionImplementation + ?Sized,
{
    let dimension = dist.dimension();
    let mean = dist.get_mean()?;
    let range = dist.range();
    let (lower, upper) = (range.lower_bound(), range.upper_bound());
    let rule = GaussLegendre::new(dist.settings().integration_nodes)?;
    let mut covariance = CovarianceMatrix::identity(dimension);
    for i in 0..dimension {
        let variance = dist.marginal(i)?.get_covariance()?.get(0, 0);
        covariance.set(i, i, variance);
        for j in 0..i {
            let pair = dist.marginal_subset(&[j, i])?;
            let value = rule.integrate_box(
                |x| Ok((x[0] - mean[j]) * (x[1] - mean[i]) * pair.compute_pdf(&Point::from(x))?),
                &[lower[j], lower[i]],
                &[upper[j], upper[i]],
            )?;
            covariance.set(i, j, value);
        }
    }
    Ok(covariance)
}

/// Componentwise `E[(X - μ)^order] / σ^order`.
pub(super) fn standardized_moments<D>(dist: &D, order: i32) -> Result<Point>
where
    D: DistributionImplementation + ?Sized,
{
    if dist.dimension() == 1 {
        let mean = dist.get_mean()?[0];
        let sigma = dist.get_standard_deviation()?[0];
        let moment = univariate_moment(dist, order, mean)?;
        return Ok(Point::scalar(moment / sigma.powi(order)));
    }
    (0..dist.dimension())
        .map(|i| {
            let marginal = dist.marginal(i)?;
            let moments = if order == 3 {
                marginal.get_skewness()?
            } else {
                marginal.get_kurtosis()?
            };
            Ok(moments[0])
        })
        .collect()
}
