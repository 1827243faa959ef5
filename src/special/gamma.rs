//! Log-gamma and regularized incomplete gamma functions.

use super::{LENTZ_TINY, SERIES_EPSILON};

const MAX_ITERATIONS: usize = 1000;

/// Lanczos approximation of ln Γ(x).
///
/// Reference: Lanczos (1964), "A Precision Approximation of the Gamma
/// Function", *SIAM Journal on Numerical Analysis* 1(1).
///
/// # Accuracy
/// Relative error < 2 × 10⁻¹⁰ for x > 0 (typically close to machine precision).
///
/// # Example
///
/// ```
/// use uqcore::special::ln_gamma;
/// // Γ(5) = 24
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
/// ```
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision, clippy::unreadable_literal)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS[1..].iter().enumerate() {
        sum += c / (x + i as f64 + 1.0);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Regularized lower incomplete gamma function P(a, x) = γ(a, x) / Γ(a).
///
/// # Algorithm
/// Series expansion for `x < a + 1`, Lentz continued fraction for the
/// complement otherwise.
///
/// # Example
///
/// ```
/// use uqcore::special::regularized_lower_gamma;
/// // P(1, x) = 1 - exp(-x)
/// let p = regularized_lower_gamma(1.0, 2.0);
/// assert!((p - (1.0 - (-2.0_f64).exp())).abs() < 1e-14);
/// ```
#[must_use]
pub fn regularized_lower_gamma(a: f64, x: f64) -> f64 {
    if x.is_nan() || a.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x < a + 1.0 {
        gamma_series(a, x)
    } else {
        1.0 - gamma_continued_fraction(a, x)
    }
}

/// Regularized upper incomplete gamma function Q(a, x) = 1 − P(a, x).
///
/// Computed directly in the upper tail so that small values keep their
/// relative precision.
#[must_use]
pub fn regularized_upper_gamma(a: f64, x: f64) -> f64 {
    if x.is_nan() || a.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x == f64::INFINITY {
        return 0.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_series(a, x)
    } else {
        gamma_continued_fraction(a, x)
    }
}

fn prefactor(a: f64, x: f64) -> f64 {
    (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_series(a: f64, x: f64) -> f64 {
    let mut term = 1.0 / a;
    let mut sum = term;
    let mut ap = a;
    for _ in 0..MAX_ITERATIONS {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * SERIES_EPSILON {
            break;
        }
    }
    sum * prefactor(a, x)
}

fn gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / LENTZ_TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITERATIONS {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < LENTZ_TINY {
            d = LENTZ_TINY;
        }
        c = b + an / c;
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
    h * prefactor(a, x)
}

/// Inverse of [`regularized_lower_gamma`] in its second argument.
///
/// Returns `x ≥ 0` with `P(a, x) = p`.
///
/// # Algorithm
/// Initial guess from the Wilson-Hilferty approximation (a > 1) or the
/// small-x expansion, refined by Halley iterations.
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.2.1.
#[must_use]
pub fn inverse_regularized_lower_gamma(a: f64, p: f64) -> f64 {
    if p.is_nan() || a.is_nan() || a <= 0.0 {
        return f64::NAN;
    }
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let a1 = a - 1.0;
    let gln = ln_gamma(a);
    let (mut x, lna1, afac) = if a > 1.0 {
        let lna1 = a1.ln();
        let afac = (a1 * (lna1 - 1.0) - gln).exp();
        let pp = if p < 0.5 { p } else { 1.0 - p };
        let t = (-2.0 * pp.ln()).sqrt();
        let mut z = (2.30753 + t * 0.27061) / (1.0 + t * (0.99229 + t * 0.04481)) - t;
        if p < 0.5 {
            z = -z;
        }
        let guess = a * (1.0 - 1.0 / (9.0 * a) - z / (3.0 * a.sqrt())).powi(3);
        (guess.max(1e-3), lna1, afac)
    } else {
        let t = 1.0 - a * (0.253 + a * 0.12);
        let guess = if p < t {
            (p / t).powf(1.0 / a)
        } else {
            1.0 - (1.0 - (p - t) / (1.0 - t)).ln()
        };
        (guess, 0.0, 0.0)
    };
    for _ in 0..50 {
        if x <= 0.0 {
            return 0.0;
        }
        let err = regularized_lower_gamma(a, x) - p;
        let density = if a > 1.0 {
            afac * (-(x - a1) + a1 * (x.ln() - lna1)).exp()
        } else {
            (-x + a1 * x.ln() - gln).exp()
        };
        if density == 0.0 {
            break;
        }
        let u = err / density;
        let step = u / (1.0 - 0.5 * (u * (a1 / x - 1.0)).min(1.0));
        x -= step;
        if x <= 0.0 {
            x = 0.5 * (x + step);
        }
        if step.abs() < 1e-14 * x {
            break;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_gamma_known_values() {
        assert!((ln_gamma(1.0)).abs() < 1e-14);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-13);
        assert!((ln_gamma(10.0) - 362_880.0_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_lower_plus_upper_is_one() {
        for &(a, x) in &[(0.5, 0.1), (2.0, 1.0), (5.0, 7.5), (30.0, 25.0)] {
            let p = regularized_lower_gamma(a, x);
            let q = regularized_upper_gamma(a, x);
            assert!((p + q - 1.0).abs() < 1e-13, "a={a} x={x}");
        }
    }

    #[test]
    fn test_upper_tail_precision() {
        // Q(1, x) = exp(-x)
        let q = regularized_upper_gamma(1.0, 40.0);
        assert!((q / (-40.0_f64).exp() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_inverse_lower_gamma() {
        for &a in &[0.3, 1.0, 2.5, 12.0] {
            for &p in &[1e-6, 0.05, 0.5, 0.95, 0.999_999] {
                let x = inverse_regularized_lower_gamma(a, p);
                assert!(
                    (regularized_lower_gamma(a, x) - p).abs() < 1e-10,
                    "a={a} p={p} x={x}"
                );
            }
        }
    }
}
