//! Gauss-Legendre quadrature rules.

use crate::error::{Error, Result};

/// An n-point Gauss-Legendre rule on `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussLegendre {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendre {
    /// Compute the n-point rule.
    ///
    /// Nodes are the roots of the Legendre polynomial `P_n`, located by Newton
    /// iterations from Chebyshev-like initial guesses.
    ///
    /// # Errors
    ///
    /// Returns an error if `n == 0`.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::invalid_argument(
                "a Gauss-Legendre rule needs at least one node",
            ));
        }
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let nf = n as f64;
        let half = n.div_ceil(2);
        for i in 0..half {
            let mut z = (std::f64::consts::PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
            let mut derivative = 1.0;
            for _ in 0..100 {
                let (p, dp) = legendre_with_derivative(n, z);
                derivative = dp;
                let step = p / dp;
                z -= step;
                if step.abs() < 1e-15 {
                    break;
                }
            }
            let (_, dp) = legendre_with_derivative(n, z);
            if dp.is_finite() {
                derivative = dp;
            }
            let w = 2.0 / ((1.0 - z * z) * derivative * derivative);
            nodes[i] = -z;
            nodes[n - 1 - i] = z;
            weights[i] = w;
            weights[n - 1 - i] = w;
        }
        Ok(Self { nodes, weights })
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the rule is empty (never true for a constructed rule).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes on `[-1, 1]`, in increasing order.
    #[must_use]
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Weights, summing to 2.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Integrate `f` over `[a, b]`.
    pub fn integrate<F>(&self, f: F, a: f64, b: f64) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let half = 0.5 * (b - a);
        let mid = 0.5 * (a + b);
        half * self
            .nodes
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| w * f(mid + half * x))
            .sum::<f64>()
    }

    /// Integrate `f` over the box `[lower, upper]` with the tensor-product rule.
    ///
    /// The box dimension is `lower.len()`; `f` receives a slice of that length.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` fails or the bounds have different lengths.
    pub fn integrate_box<F>(&self, f: F, lower: &[f64], upper: &[f64]) -> Result<f64>
    where
        F: Fn(&[f64]) -> Result<f64>,
    {
        crate::error::check_dimension(lower.len(), upper.len())?;
        let d = lower.len();
        let n = self.len();
        let half: Vec<f64> = (0..d).map(|j| 0.5 * (upper[j] - lower[j])).collect();
        let mid: Vec<f64> = (0..d).map(|j| 0.5 * (upper[j] + lower[j])).collect();
        let volume: f64 = half.iter().product();
        let mut index = vec![0usize; d];
        let mut x = vec![0.0; d];
        let mut total = 0.0;
        loop {
            let mut weight = 1.0;
            for j in 0..d {
                x[j] = mid[j] + half[j] * self.nodes[index[j]];
                weight *= self.weights[index[j]];
            }
            total += weight * f(&x)?;
            // odometer increment over the node grid
            let mut axis = 0;
            loop {
                if axis == d {
                    return Ok(volume * total);
                }
                index[axis] += 1;
                if index[axis] < n {
                    break;
                }
                index[axis] = 0;
                axis += 1;
            }
        }
    }
}

/// Evaluate `P_n(z)` and `P_n'(z)` by the three-term recurrence.
fn legendre_with_derivative(n: usize, z: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = 0.0;
    for j in 0..n {
        let jf = j as f64;
        let p2 = p1;
        p1 = p0;
        p0 = ((2.0 * jf + 1.0) * z * p1 - jf * p2) / (jf + 1.0);
    }
    let nf = n as f64;
    let dp = nf * (z * p0 - p1) / (z * z - 1.0);
    (p0, dp)
}
