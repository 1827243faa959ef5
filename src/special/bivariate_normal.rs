//! CDF of the standard bivariate normal distribution.

use super::normal::standard_normal_cdf;

use std::f64::consts::PI;

// Gauss-Legendre half-rules on [0, 1] for the three correlation regimes
#[allow(clippy::unreadable_literal)]
const WEIGHTS_6: [f64; 3] = [0.1713244923791705, 0.3607615730481384, 0.4679139345726904];
#[allow(clippy::unreadable_literal)]
const NODES_6: [f64; 3] = [0.9324695142031522, 0.6612093864662647, 0.2386191860831970];

#[allow(clippy::unreadable_literal)]
const WEIGHTS_12: [f64; 6] = [
    0.04717533638651177,
    0.1069393259953183,
    0.1600783285433464,
    0.2031674267230659,
    0.2334925365383547,
    0.2491470458134029,
];
#[allow(clippy::unreadable_literal)]
const NODES_12: [f64; 6] = [
    0.9815606342467191,
    0.9041172563704750,
    0.7699026741943050,
    0.5873179542866171,
    0.3678314989981802,
    0.1252334085114692,
];

#[allow(clippy::unreadable_literal)]
const WEIGHTS_20: [f64; 10] = [
    0.01761400713915212,
    0.04060142980038694,
    0.06267204833410906,
    0.08327674157670475,
    0.1019301198172404,
    0.1181945319615184,
    0.1316886384491766,
    0.1420961093183821,
    0.1491729864726037,
    0.1527533871307259,
];
#[allow(clippy::unreadable_literal)]
const NODES_20: [f64; 10] = [
    0.9931285991850949,
    0.9639719272779138,
    0.9122344282513259,
    0.8391169718222188,
    0.7463319064601508,
    0.6360536807265150,
    0.5108670019508271,
    0.3737060887154196,
    0.2277858511416451,
    0.07652652113349733,
];

/// CDF `P(X ≤ x, Y ≤ y)` of a standard bivariate normal with correlation `rho`.
///
/// # Algorithm
/// Genz's BVND method: Drezner-Wesolowsky integration of the Plackett
/// formula for `|rho| < 0.925`, and an asymptotic expansion around
/// `|rho| = 1` otherwise. Accuracy is about 1e-15.
///
/// Reference: Genz (2004), "Numerical computation of rectangular bivariate
/// and trivariate normal and t probabilities", *Statistics and Computing* 14.
///
/// # Example
///
/// ```
/// use uqcore::special::bivariate_normal_cdf;
/// // P(X ≤ 0, Y ≤ 0) = 1/4 + asin(ρ)/(2π)
/// let rho: f64 = 0.5;
/// let expected = 0.25 + rho.asin() / (2.0 * std::f64::consts::PI);
/// assert!((bivariate_normal_cdf(0.0, 0.0, rho) - expected).abs() < 1e-14);
/// ```
#[must_use]
pub fn bivariate_normal_cdf(x: f64, y: f64, rho: f64) -> f64 {
    if x.is_nan() || y.is_nan() || rho.is_nan() {
        return f64::NAN;
    }
    upper_orthant(-x, -y, rho).clamp(0.0, 1.0)
}

/// `P(X > h, Y > k)` for a standard bivariate normal with correlation `r`.
fn upper_orthant(h: f64, k: f64, r: f64) -> f64 {
    let (weights, nodes): (&[f64], &[f64]) = if r.abs() < 0.3 {
        (&WEIGHTS_6, &NODES_6)
    } else if r.abs() < 0.75 {
        (&WEIGHTS_12, &NODES_12)
    } else {
        (&WEIGHTS_20, &NODES_20)
    };

    let mut k = k;
    let mut hk = h * k;
    let mut bvn = 0.0;

    if r.abs() < 0.925 {
        let hs = 0.5 * (h * h + k * k);
        let asr = r.asin();
        for (&w, &node) in weights.iter().zip(nodes) {
            for sign in [-1.0, 1.0] {
                let sn = (0.5 * asr * (1.0 + sign * node)).sin();
                bvn += w * ((sn * hk - hs) / (1.0 - sn * sn)).exp();
            }
        }
        return bvn * asr / (4.0 * PI) + standard_normal_cdf(-h) * standard_normal_cdf(-k);
    }

    if r < 0.0 {
        k = -k;
        hk = -hk;
    }
    if r.abs() < 1.0 {
        let a_s = (1.0 - r) * (1.0 + r);
        let mut a = a_s.sqrt();
        let bs = (h - k) * (h - k);
        let c = (4.0 - hk) / 8.0;
        let d = (12.0 - hk) / 16.0;
        let asr = -0.5 * (bs / a_s + hk);
        if asr > -100.0 {
            bvn = a
                * asr.exp()
                * (1.0 - c * (bs - a_s) * (1.0 - d * bs / 5.0) / 3.0 + c * d * a_s * a_s / 5.0);
        }
        if hk > -100.0 {
            let b = bs.sqrt();
            bvn -= (-0.5 * hk).exp()
                * (2.0 * PI).sqrt()
                * standard_normal_cdf(-b / a)
                * b
                * (1.0 - c * bs * (1.0 - d * bs / 5.0) / 3.0);
        }
        a *= 0.5;
        for (&w, &node) in weights.iter().zip(nodes) {
            for sign in [-1.0, 1.0] {
                let xs = (a * (1.0 + sign * node)).powi(2);
                let rs = (1.0 - xs).sqrt();
                let asr = -0.5 * (bs / xs + hk);
                if asr > -100.0 {
                    bvn += a
                        * w
                        * asr.exp()
                        * ((-hk * (1.0 - rs) / (2.0 * (1.0 + rs))).exp() / rs
                            - (1.0 + c * xs * (1.0 + d * xs)));
                }
            }
        }
        bvn = -bvn / (2.0 * PI);
    }

    if r > 0.0 {
        bvn + standard_normal_cdf(-h.max(k))
    } else if h >= k {
        -bvn
    } else {
        let l = if h < 0.0 {
            standard_normal_cdf(k) - standard_normal_cdf(h)
        } else {
            standard_normal_cdf(-h) - standard_normal_cdf(-k)
        };
        l - bvn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orthant(rho: f64) -> f64 {
        0.25 + rho.asin() / (2.0 * PI)
    }

    #[test]
    fn test_orthant_probabilities() {
        for &rho in &[-0.99, -0.95, -0.6, -0.2, 0.0, 0.1, 0.5, 0.8, 0.95, 0.999] {
            let p = bivariate_normal_cdf(0.0, 0.0, rho);
            assert!((p - orthant(rho)).abs() < 1e-12, "rho={rho} p={p}");
        }
    }

    #[test]
    fn test_independent_case() {
        let p = bivariate_normal_cdf(0.3, -1.1, 0.0);
        let expected = standard_normal_cdf(0.3) * standard_normal_cdf(-1.1);
        assert!((p - expected).abs() < 1e-14);
    }

    #[test]
    fn test_degenerate_correlations() {
        // ρ = 1: P(X ≤ min(x, y)); ρ = -1: max(0, Φ(x) + Φ(y) - 1)
        let (x, y) = (0.4, -0.2);
        let p = bivariate_normal_cdf(x, y, 1.0);
        assert!((p - standard_normal_cdf(y)).abs() < 1e-14);
        let p = bivariate_normal_cdf(x, y, -1.0);
        let expected = (standard_normal_cdf(x) + standard_normal_cdf(y) - 1.0).max(0.0);
        assert!((p - expected).abs() < 1e-14);
    }

    #[test]
    fn test_marginal_limit() {
        let p = bivariate_normal_cdf(0.7, 40.0, 0.6);
        assert!((p - standard_normal_cdf(0.7)).abs() < 1e-14);
    }
}
