//! Digamma, trigamma and inverse digamma.

/// Threshold above which the asymptotic expansions are used.
const ASYMPTOTIC_THRESHOLD: f64 = 10.0;

/// Euler-Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Digamma function ψ(x) = d/dx ln Γ(x).
///
/// # Algorithm
/// Upward recurrence `ψ(x) = ψ(x + 1) − 1/x` until `x ≥ 10`, then the
/// asymptotic expansion. Negative arguments use the reflection formula.
///
/// # Example
///
/// ```
/// use uqcore::special::digamma;
/// // ψ(1) = -γ
/// assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-12);
/// ```
#[must_use]
pub fn digamma(x: f64) -> f64 {
    if x.is_nan() || (x <= 0.0 && x == x.floor()) {
        return f64::NAN;
    }
    if x < 0.0 {
        let pi = std::f64::consts::PI;
        return digamma(1.0 - x) - pi / (pi * x).tan();
    }
    let mut x = x;
    let mut result = 0.0;
    while x < ASYMPTOTIC_THRESHOLD {
        result -= 1.0 / x;
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result + x.ln() - 0.5 * inv
        - inv2 * (1.0 / 12.0 - inv2 * (1.0 / 120.0 - inv2 * (1.0 / 252.0 - inv2 * (1.0 / 240.0))))
}

/// Trigamma function ψ'(x).
#[must_use]
pub fn trigamma(x: f64) -> f64 {
    if x.is_nan() || (x <= 0.0 && x == x.floor()) {
        return f64::NAN;
    }
    if x < 0.0 {
        let pi = std::f64::consts::PI;
        let s = (pi * x).sin();
        return -trigamma(1.0 - x) + pi * pi / (s * s);
    }
    let mut x = x;
    let mut result = 0.0;
    while x < ASYMPTOTIC_THRESHOLD {
        result += 1.0 / (x * x);
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result
        + inv
        + 0.5 * inv2
        + inv * inv2 * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 * (1.0 / 42.0 - inv2 / 30.0)))
}

/// Inverse of the digamma function on `(0, ∞)`.
///
/// # Algorithm
/// Minka's initialization followed by Newton iterations.
///
/// Reference: Minka (2000), "Estimating a Dirichlet distribution", Appendix C.
#[must_use]
pub fn inverse_digamma(y: f64) -> f64 {
    if y.is_nan() {
        return f64::NAN;
    }
    let mut x = if y >= -2.22 {
        y.exp() + 0.5
    } else {
        -1.0 / (y + EULER_GAMMA)
    };
    for _ in 0..50 {
        let step = (digamma(x) - y) / trigamma(x);
        x -= step;
        if step.abs() <= 1e-14 * x.abs() {
            break;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digamma_values() {
        assert!((digamma(0.5) - (-EULER_GAMMA - 2.0 * 2.0_f64.ln())).abs() < 1e-12);
        // ψ(x+1) = ψ(x) + 1/x
        let x = 3.7;
        assert!((digamma(x + 1.0) - digamma(x) - 1.0 / x).abs() < 1e-12);
        assert!(digamma(0.0).is_nan());
    }

    #[test]
    fn test_trigamma_values() {
        let pi = std::f64::consts::PI;
        assert!((trigamma(1.0) - pi * pi / 6.0).abs() < 1e-12);
        assert!((trigamma(0.5) - pi * pi / 2.0).abs() < 1e-11);
    }

    #[test]
    fn test_inverse_digamma() {
        for &x in &[0.01, 0.4, 1.0, 7.5, 120.0] {
            let y = digamma(x);
            assert!((inverse_digamma(y) - x).abs() < 1e-9 * x.max(1.0), "x={x}");
        }
    }
}
