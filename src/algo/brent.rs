//! Brent's bracketed root finder.

use log::debug;

use crate::error::{Error, Result};

/// Brent solver combining bisection, secant and inverse quadratic steps.
///
/// Reference: Brent (1973), *Algorithms for Minimization without
/// Derivatives*, chapter 4.
#[derive(Debug, Clone, PartialEq)]
pub struct Brent {
    /// Absolute tolerance on the root.
    pub absolute_error: f64,
    /// Relative tolerance on the root.
    pub relative_error: f64,
    /// Tolerance on the residual `|f(x)|`.
    pub residual_error: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for Brent {
    fn default() -> Self {
        Self {
            absolute_error: 1e-12,
            relative_error: 1e-12,
            residual_error: 0.0,
            max_iterations: 100,
        }
    }
}

impl Brent {
    /// Create a solver with the given absolute tolerance and iteration cap.
    #[must_use]
    pub fn new(absolute_error: f64, max_iterations: usize) -> Self {
        Self {
            absolute_error,
            max_iterations,
            ..Self::default()
        }
    }

    /// Find `x` in `[a, b]` with `f(x) = value`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `f(a) - value` and `f(b) - value` have the
    /// same strict sign, and `NumericalConvergence` if the iteration cap is hit.
    pub fn solve<F>(&self, f: F, value: f64, a: f64, b: f64) -> Result<f64>
    where
        F: Fn(f64) -> Result<f64>,
    {
        let fa = f(a)? - value;
        let fb = f(b)? - value;
        self.solve_bracketed(|x| Ok(f(x)? - value), a, b, fa, fb)
    }

    /// Find a root of `f` in `[a, b]` given the end-point values.
    ///
    /// # Errors
    ///
    /// Same as [`Brent::solve`].
    pub fn solve_bracketed<F>(
        &self,
        f: F,
        mut a: f64,
        mut b: f64,
        mut fa: f64,
        mut fb: f64,
    ) -> Result<f64>
    where
        F: Fn(f64) -> Result<f64>,
    {
        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(Error::invalid_argument(format!(
                "Brent needs a sign change on [{a}, {b}], got f(a)={fa} and f(b)={fb}"
            )));
        }
        let mut c = a;
        let mut fc = fa;
        let mut d = b - a;
        let mut e = d;
        for iteration in 0..self.max_iterations {
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }
            let tolerance = 2.0 * f64::EPSILON * b.abs()
                + 0.5 * self.absolute_error.max(self.relative_error * b.abs());
            let m = 0.5 * (c - b);
            if fb.abs() <= self.residual_error || m.abs() <= tolerance || fb == 0.0 {
                debug!("Brent converged to {b} after {iteration} iterations");
                return Ok(b);
            }
            if e.abs() >= tolerance && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    (2.0 * m * s, 1.0 - s)
                } else {
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                } else {
                    p = -p;
                }
                if 2.0 * p < (3.0 * m * q - (tolerance * q).abs()).min((e * q).abs()) {
                    e = d;
                    d = p / q;
                } else {
                    d = m;
                    e = m;
                }
            } else {
                d = m;
                e = m;
            }
            a = b;
            fa = fb;
            b += if d.abs() > tolerance {
                d
            } else {
                tolerance.copysign(m)
            };
            fb = f(b)?;
        }
        Err(Error::convergence(
            "Brent",
            self.max_iterations,
            format!("bracket [{b}, {c}] still wider than the tolerance"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_cubic() {
        let brent = Brent::default();
        let root = brent.solve(|x| Ok(x * x * x), 8.0, 0.0, 5.0).unwrap();
        assert!((root - 2.0).abs() < 1e-11);
    }

    #[test]
    fn test_solve_transcendental() {
        let brent = Brent::new(1e-14, 100);
        let root = brent.solve(|x| Ok(x.cos() - x), 0.0, 0.0, 1.0).unwrap();
        assert!((root.cos() - root).abs() < 1e-13);
    }

    #[test]
    fn test_no_sign_change() {
        let brent = Brent::default();
        let err = brent.solve(|x| Ok(x * x + 1.0), 0.0, -1.0, 1.0).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_iteration_cap() {
        let brent = Brent::new(0.0, 3);
        let result = brent.solve(|x| Ok(x.exp() - 2.0), 0.0, -10.0, 10.0);
        assert!(matches!(result, Err(Error::NumericalConvergence { .. })));
    }
}
