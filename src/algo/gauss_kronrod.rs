//! Adaptive Gauss-Kronrod integration.

use log::debug;

use crate::error::{Error, Result};

#[allow(clippy::unreadable_literal, clippy::excessive_precision)]
const KRONROD_NODES: [f64; 8] = [
    0.991455371120812639206854697526329,
    0.949107912342758524526189684047851,
    0.864864423359769072789712788640926,
    0.741531185599394439863864773280788,
    0.586087235467691130294144845693013,
    0.405845151377397166906606412076961,
    0.207784955007898467600689403773245,
    0.0,
];

#[allow(clippy::unreadable_literal, clippy::excessive_precision)]
const KRONROD_WEIGHTS: [f64; 8] = [
    0.022935322010529224963732008058970,
    0.063092092629978553290700663189204,
    0.104790010322250183839876322541518,
    0.140653259715525918745189590510238,
    0.169004726639267902826583426598550,
    0.190350578064785409913256402421014,
    0.204432940075298892414161999234649,
    0.209482141084727828012999174891714,
];

// Gauss weights for the Kronrod nodes of odd index 1, 3, 5, 7
#[allow(clippy::unreadable_literal, clippy::excessive_precision)]
const GAUSS_WEIGHTS: [f64; 4] = [
    0.129484966168869693270611432679082,
    0.279705391489276667901467771423780,
    0.381830050505118944950369775488975,
    0.417959183673469387755102040816327,
];

/// One subinterval with its local estimate.
#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// Adaptive G7/K15 integrator.
///
/// The subinterval with the largest error estimate is bisected until the
/// total error estimate is below `max(absolute, relative · |integral|)` or
/// the subdivision budget is exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussKronrod {
    /// Maximum number of bisections.
    pub max_subdivisions: usize,
    /// Absolute error target.
    pub absolute_tolerance: f64,
    /// Relative error target.
    pub relative_tolerance: f64,
}

impl Default for GaussKronrod {
    fn default() -> Self {
        Self {
            max_subdivisions: 200,
            absolute_tolerance: 1e-12,
            relative_tolerance: 1e-7,
        }
    }
}

impl GaussKronrod {
    /// Create an integrator with the given budget and relative tolerance.
    #[must_use]
    pub fn new(max_subdivisions: usize, relative_tolerance: f64) -> Self {
        Self {
            max_subdivisions,
            relative_tolerance,
            ..Self::default()
        }
    }

    /// Integrate `f` over the finite interval `[a, b]`.
    ///
    /// # Errors
    ///
    /// Returns `NumericalConvergence` if the error target is not met within
    /// the subdivision budget, and `InvalidArgument` if a bound is not finite.
    pub fn integrate<F>(&self, f: F, a: f64, b: f64) -> Result<f64>
    where
        F: Fn(f64) -> f64,
    {
        self.try_integrate(|x| Ok(f(x)), a, b)
    }

    /// Integrate a fallible function over the finite interval `[a, b]`.
    ///
    /// # Errors
    ///
    /// Propagates the first error of `f`; otherwise as [`GaussKronrod::integrate`].
    pub fn try_integrate<F>(&self, f: F, a: f64, b: f64) -> Result<f64>
    where
        F: Fn(f64) -> Result<f64>,
    {
        if !a.is_finite() || !b.is_finite() {
            return Err(Error::invalid_argument(format!(
                "integration bounds must be finite, got [{a}, {b}]"
            )));
        }
        if a == b {
            return Ok(0.0);
        }
        let mut segments = vec![kronrod_segment(&f, a, b)?];
        let mut subdivisions = 0;
        loop {
            let value: f64 = segments.iter().map(|s| s.value).sum();
            let error: f64 = segments.iter().map(|s| s.error).sum();
            let target = self
                .absolute_tolerance
                .max(self.relative_tolerance * value.abs());
            if error <= target {
                debug!(
                    "Gauss-Kronrod converged on [{a}, {b}] with {} segments, error {error:e}",
                    segments.len()
                );
                return Ok(value);
            }
            if subdivisions == self.max_subdivisions {
                return Err(Error::convergence(
                    "GaussKronrod",
                    subdivisions,
                    format!("error estimate {error:e} above target {target:e} on [{a}, {b}]"),
                ));
            }
            subdivisions += 1;
            let worst = segments
                .iter()
                .enumerate()
                .max_by(|(_, s), (_, t)| s.error.total_cmp(&t.error))
                .map_or(0, |(i, _)| i);
            let segment = segments.swap_remove(worst);
            let mid = 0.5 * (segment.a + segment.b);
            segments.push(kronrod_segment(&f, segment.a, mid)?);
            segments.push(kronrod_segment(&f, mid, segment.b)?);
        }
    }
}

fn kronrod_segment<F>(f: &F, a: f64, b: f64) -> Result<Segment>
where
    F: Fn(f64) -> Result<f64>,
{
    let half = 0.5 * (b - a);
    let mid = 0.5 * (a + b);
    let center = f(mid)?;
    let mut kronrod = KRONROD_WEIGHTS[7] * center;
    let mut gauss = GAUSS_WEIGHTS[3] * center;
    for (j, (&node, &weight)) in KRONROD_NODES[..7]
        .iter()
        .zip(&KRONROD_WEIGHTS[..7])
        .enumerate()
    {
        let sum = f(mid - half * node)? + f(mid + half * node)?;
        kronrod += weight * sum;
        if j % 2 == 1 {
            gauss += GAUSS_WEIGHTS[j / 2] * sum;
        }
    }
    Ok(Segment {
        a,
        b,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_integral() {
        let gk = GaussKronrod::default();
        let value = gk.integrate(f64::sin, 0.0, std::f64::consts::PI).unwrap();
        assert!((value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_bounds() {
        let gk = GaussKronrod::default();
        let value = gk.integrate(|x| x * x, 1.0, 0.0).unwrap();
        assert!((value + 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_peaked_integrand_subdivides() {
        let gk = GaussKronrod::default();
        let value = gk.integrate(|x| (-1e4 * x * x).exp(), -1.0, 1.0).unwrap();
        let expected = (std::f64::consts::PI / 1e4).sqrt();
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn test_budget_exhaustion() {
        let gk = GaussKronrod::new(2, 1e-15);
        let err = gk.integrate(|x| x.abs().sqrt().recip().min(1e8), -1.0, 1.0);
        assert!(matches!(err, Err(Error::NumericalConvergence { .. })));
    }

    #[test]
    fn test_infinite_bounds_rejected() {
        let gk = GaussKronrod::default();
        assert!(gk.integrate(|x| x, 0.0, f64::INFINITY).is_err());
    }
}
