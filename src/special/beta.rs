//! Log-beta and the regularized incomplete beta function.

use super::gamma::ln_gamma;
use super::{LENTZ_TINY, SERIES_EPSILON};

/// Log of the Beta function: `ln B(a, b) = ln Γ(a) + ln Γ(b) − ln Γ(a+b)`.
#[must_use]
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Regularized incomplete beta function I_x(a, b).
///
/// # Algorithm
/// Continued fraction representation (modified Lentz method) combined with
/// the symmetry relation `I_x(a, b) = 1 − I_{1−x}(b, a)`.
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.4.
///
/// # Example
///
/// ```
/// use uqcore::special::regularized_incomplete_beta;
/// assert_eq!(regularized_incomplete_beta(0.0, 2.0, 3.0), 0.0);
/// assert!((regularized_incomplete_beta(0.5, 1.0, 1.0) - 0.5).abs() < 1e-14);
/// ```
#[must_use]
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x.is_nan() || a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
    }
    let ln_prefix = a * x.ln() + b * (-x).ln_1p() - ln_beta(a, b);
    ln_prefix.exp() / a * beta_continued_fraction(x, a, b)
}

fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITERATIONS: usize = 500;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < LENTZ_TINY {
        d = LENTZ_TINY;
    }
    d = 1.0 / d;
    let mut h = d;
    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < LENTZ_TINY {
            d = LENTZ_TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < LENTZ_TINY {
            c = LENTZ_TINY;
        }
        d = 1.0 / d;
        h *= d * c;
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < LENTZ_TINY {
            d = LENTZ_TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < LENTZ_TINY {
            c = LENTZ_TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < SERIES_EPSILON {
            break;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binomial_identity() {
        // P(Bin(n, p) <= k) = I_{1-p}(n - k, k + 1)
        let (n, p) = (10u32, 0.3_f64);
        let mut cdf = 0.0;
        for k in 0..n {
            let ln_choose = ln_gamma(f64::from(n) + 1.0)
                - ln_gamma(f64::from(k) + 1.0)
                - ln_gamma(f64::from(n - k) + 1.0);
            cdf += (ln_choose + f64::from(k) * p.ln() + f64::from(n - k) * (1.0 - p).ln()).exp();
            let beta = regularized_incomplete_beta(1.0 - p, f64::from(n - k), f64::from(k) + 1.0);
            assert!((cdf - beta).abs() < 1e-12, "k={k}");
        }
    }

    #[test]
    fn test_symmetry() {
        let (x, a, b) = (0.3, 2.5, 4.0);
        let lhs = regularized_incomplete_beta(x, a, b);
        let rhs = 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
        assert!((lhs - rhs).abs() < 1e-14);
    }
}
