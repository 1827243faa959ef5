use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::Point;
use crate::error::{check_dimension, Error, Result};

/// Relative asymmetry tolerated when importing a covariance matrix.
const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// A symmetric d×d matrix used for covariances and correlations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    data: Array2<f64>,
}

impl CovarianceMatrix {
    /// The d×d identity matrix.
    #[must_use]
    pub fn identity(dimension: usize) -> Self {
        Self {
            data: Array2::eye(dimension),
        }
    }

    /// A diagonal matrix with the given diagonal.
    #[must_use]
    pub fn from_diagonal(diagonal: &Point) -> Self {
        let d = diagonal.dimension();
        let mut data = Array2::zeros((d, d));
        for i in 0..d {
            data[[i, i]] = diagonal[i];
        }
        Self { data }
    }

    /// Import a square symmetric matrix.
    ///
    /// The matrix is symmetrized by averaging with its transpose.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is not square or not symmetric.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        if data.nrows() != data.ncols() {
            return Err(Error::invalid_argument(format!(
                "a covariance matrix must be square, got {}x{}",
                data.nrows(),
                data.ncols()
            )));
        }
        let d = data.nrows();
        let mut sym = data.clone();
        for i in 0..d {
            for j in (i + 1)..d {
                let (a, b) = (data[[i, j]], data[[j, i]]);
                let scale = a.abs().max(b.abs()).max(1.0);
                if (a - b).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(Error::invalid_argument(format!(
                        "matrix is not symmetric at ({i}, {j}): {a} != {b}"
                    )));
                }
                let mean = 0.5 * (a + b);
                sym[[i, j]] = mean;
                sym[[j, i]] = mean;
            }
        }
        Ok(Self { data: sym })
    }

    /// Build a matrix from its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows do not form a symmetric square matrix.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let d = rows.len();
        let mut data = Array2::zeros((d, d));
        for (i, row) in rows.iter().enumerate() {
            check_dimension(d, row.len())?;
            for (j, &v) in row.iter().enumerate() {
                data[[i, j]] = v;
            }
        }
        Self::from_array(data)
    }

    /// Get the dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.nrows()
    }

    /// Get an entry.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[[i, j]]
    }

    /// Set an entry and its symmetric counterpart.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[[i, j]] = value;
        self.data[[j, i]] = value;
    }

    /// Get a reference to the underlying data.
    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// The diagonal as a point.
    #[must_use]
    pub fn diagonal(&self) -> Point {
        self.data.diag().iter().copied().collect()
    }

    /// Whether every off-diagonal entry is zero.
    #[must_use]
    pub fn is_diagonal(&self) -> bool {
        let d = self.dimension();
        (0..d).all(|i| ((i + 1)..d).all(|j| self.data[[i, j]] == 0.0))
    }

    /// Lower-triangular Cholesky factor `L` with `L Lᵀ = self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is not positive definite.
    pub fn cholesky(&self) -> Result<CholeskyFactor> {
        let d = self.dimension();
        let mut lower = Array2::<f64>::zeros((d, d));
        for j in 0..d {
            let mut diag = self.data[[j, j]];
            for k in 0..j {
                diag -= lower[[j, k]] * lower[[j, k]];
            }
            if diag <= 0.0 || !diag.is_finite() {
                return Err(Error::invalid_argument(format!(
                    "matrix is not positive definite (pivot {j} = {diag})"
                )));
            }
            let pivot = diag.sqrt();
            lower[[j, j]] = pivot;
            for i in (j + 1)..d {
                let mut s = self.data[[i, j]];
                for k in 0..j {
                    s -= lower[[i, k]] * lower[[j, k]];
                }
                lower[[i, j]] = s / pivot;
            }
        }
        Ok(CholeskyFactor { lower })
    }

    /// Whether the matrix is positive definite.
    #[must_use]
    pub fn is_positive_definite(&self) -> bool {
        self.cholesky().is_ok()
    }

    /// Determinant, computed through the Cholesky factor.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is not positive definite.
    pub fn determinant(&self) -> Result<f64> {
        Ok(self.cholesky()?.log_determinant().exp())
    }

    /// Rescale to unit diagonal: `R_ij = C_ij / sqrt(C_ii C_jj)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a diagonal entry is not positive.
    pub fn to_correlation(&self) -> Result<Self> {
        let d = self.dimension();
        let sd: Vec<f64> = (0..d).map(|i| self.data[[i, i]].sqrt()).collect();
        if let Some(i) = sd.iter().position(|s| !(*s > 0.0)) {
            return Err(Error::invalid_argument(format!(
                "variance of component {i} is not positive"
            )));
        }
        let mut data = Array2::zeros((d, d));
        for i in 0..d {
            data[[i, i]] = 1.0;
            for j in (i + 1)..d {
                let r = self.data[[i, j]] / (sd[i] * sd[j]);
                data[[i, j]] = r;
                data[[j, i]] = r;
            }
        }
        Ok(Self { data })
    }

    /// Sub-matrix over the given components.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let k = indices.len();
        let mut data = Array2::zeros((k, k));
        for (a, &i) in indices.iter().enumerate() {
            for (b, &j) in indices.iter().enumerate() {
                data[[a, b]] = self.data[[i, j]];
            }
        }
        Self { data }
    }

    /// Matrix-vector product.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions differ.
    pub fn mul_point(&self, x: &Point) -> Result<Point> {
        check_dimension(self.dimension(), x.dimension())?;
        let d = self.dimension();
        Ok((0..d)
            .map(|i| (0..d).map(|j| self.data[[i, j]] * x[j]).sum())
            .collect())
    }
}

impl fmt::Display for CovarianceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self
            .data
            .rows()
            .into_iter()
            .map(|row| {
                let parts: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                format!("[{}]", parts.join(","))
            })
            .collect();
        write!(f, "[{}]", rows.join(","))
    }
}

/// Lower-triangular Cholesky factor of a positive definite matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    lower: Array2<f64>,
}

impl CholeskyFactor {
    /// Get the factor.
    #[must_use]
    pub fn lower(&self) -> &Array2<f64> {
        &self.lower
    }

    /// Dimension of the factor.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.lower.nrows()
    }

    /// Compute `L z`.
    #[must_use]
    pub fn mul(&self, z: &[f64]) -> Vec<f64> {
        let d = self.dimension();
        (0..d)
            .map(|i| (0..=i).map(|k| self.lower[[i, k]] * z[k]).sum())
            .collect()
    }

    /// Solve `L y = b` by forward substitution.
    #[must_use]
    pub fn solve_lower(&self, b: &[f64]) -> Vec<f64> {
        let d = self.dimension();
        let mut y = vec![0.0; d];
        for i in 0..d {
            let mut s = b[i];
            for k in 0..i {
                s -= self.lower[[i, k]] * y[k];
            }
            y[i] = s / self.lower[[i, i]];
        }
        y
    }

    /// Logarithm of the determinant of `L Lᵀ`.
    #[must_use]
    pub fn log_determinant(&self) -> f64 {
        2.0 * self.lower.diag().iter().map(|v| v.ln()).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cholesky_reconstructs() {
        let c = CovarianceMatrix::from_rows(&[vec![4.0, 2.0], vec![2.0, 3.0]]).unwrap();
        let chol = c.cholesky().unwrap();
        let l = chol.lower();
        for i in 0..2 {
            for j in 0..2 {
                let v: f64 = (0..2).map(|k| l[[i, k]] * l[[j, k]]).sum();
                assert!((v - c.get(i, j)).abs() < 1e-12);
            }
        }
        assert!((c.determinant().unwrap() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_not_positive_definite() {
        let c = CovarianceMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        assert!(!c.is_positive_definite());
        assert!(c.determinant().is_err());
    }

    #[test]
    fn test_rejects_asymmetric() {
        assert!(CovarianceMatrix::from_rows(&[vec![1.0, 0.5], vec![0.2, 1.0]]).is_err());
        assert!(CovarianceMatrix::from_array(Array2::zeros((2, 3))).is_err());
    }

    #[test]
    fn test_solve_lower() {
        let c = CovarianceMatrix::from_rows(&[vec![4.0, 2.0], vec![2.0, 3.0]]).unwrap();
        let chol = c.cholesky().unwrap();
        let z = [0.3, -1.2];
        let y = chol.mul(&z);
        let back = chol.solve_lower(&y);
        assert!((back[0] - z[0]).abs() < 1e-12);
        assert!((back[1] - z[1]).abs() < 1e-12);
    }

    #[test]
    fn test_to_correlation() {
        let c = CovarianceMatrix::from_rows(&[vec![4.0, 2.0], vec![2.0, 9.0]]).unwrap();
        let r = c.to_correlation().unwrap();
        assert_eq!(r.get(0, 0), 1.0);
        assert!((r.get(0, 1) - 2.0 / 6.0).abs() < 1e-12);
    }
}
