use std::fmt;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{CovarianceMatrix, Description, Point};
use crate::error::{check_dimension, Error, Result};

/// An ordered collection of equal-dimension points.
///
/// The data is stored as a 2D matrix of shape (size, dimension); every
/// column shares one name of the [`Description`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The sample data, shape (size, dimension).
    data: Array2<f64>,
    /// Column names.
    description: Description,
}

impl Sample {
    /// Create a zero-filled sample.
    #[must_use]
    pub fn new(size: usize, dimension: usize) -> Self {
        Self {
            data: Array2::zeros((size, dimension)),
            description: Description::with_default_names(dimension),
        }
    }

    /// Create an empty sample of the given dimension.
    #[must_use]
    pub fn empty(dimension: usize) -> Self {
        Self::new(0, dimension)
    }

    /// Create a sample from a data matrix.
    #[must_use]
    pub fn from_array(data: Array2<f64>) -> Self {
        let dimension = data.ncols();
        Self {
            data,
            description: Description::with_default_names(dimension),
        }
    }

    /// Create a sample from row-major values.
    ///
    /// # Errors
    ///
    /// Returns an error if `values.len() != size * dimension`.
    pub fn from_shape_vec(size: usize, dimension: usize, values: Vec<f64>) -> Result<Self> {
        let data = Array2::from_shape_vec((size, dimension), values).map_err(|e| {
            Error::invalid_argument(format!("cannot shape sample as {size}x{dimension}: {e}"))
        })?;
        Ok(Self::from_array(data))
    }

    /// Create a sample from points.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are empty or have different dimensions.
    pub fn from_points(points: &[Point]) -> Result<Self> {
        let first = points
            .first()
            .ok_or_else(|| Error::invalid_argument("cannot infer dimension from no points"))?;
        let dimension = first.dimension();
        let mut values = Vec::with_capacity(points.len() * dimension);
        for point in points {
            check_dimension(dimension, point.dimension())?;
            values.extend_from_slice(point.as_slice());
        }
        Self::from_shape_vec(points.len(), dimension, values)
    }

    /// Create a sample from rows of values.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows are empty or have different lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let points: Vec<Point> = rows.iter().map(|r| Point::from(r.as_slice())).collect();
        Self::from_points(&points)
    }

    /// Create a one-dimensional sample from scalars.
    #[must_use]
    pub fn from_scalars(values: &[f64]) -> Self {
        let data = Array2::from_shape_fn((values.len(), 1), |(i, _)| values[i]);
        Self::from_array(data)
    }

    /// Get the number of points.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    /// Get the dimension of the points.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.ncols()
    }

    /// Whether the sample holds no point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Get a reference to the underlying data.
    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consume the sample and return the underlying data.
    #[must_use]
    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    /// Get the value at a specific position.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    /// Set the value at a specific position.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[[row, col]] = value;
    }

    /// Get a row as a point.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn row(&self, idx: usize) -> Point {
        self.data.row(idx).iter().copied().collect()
    }

    /// Replace a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds or the point has the
    /// wrong dimension.
    pub fn set_row(&mut self, idx: usize, point: &Point) -> Result<()> {
        check_dimension(self.dimension(), point.dimension())?;
        if idx >= self.size() {
            return Err(Error::invalid_argument(format!(
                "row {idx} is out of bounds for sample of size {}",
                self.size()
            )));
        }
        for (j, &v) in point.iter().enumerate() {
            self.data[[idx, j]] = v;
        }
        Ok(())
    }

    /// Append a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the point has the wrong dimension.
    pub fn add(&mut self, point: &Point) -> Result<()> {
        check_dimension(self.dimension(), point.dimension())?;
        self.data
            .push_row(ndarray::ArrayView1::from(point.as_slice()))
            .map_err(|e| Error::invalid_argument(format!("cannot append point: {e}")))
    }

    /// Append all the points of another sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions differ.
    pub fn add_sample(&mut self, other: &Self) -> Result<()> {
        check_dimension(self.dimension(), other.dimension())?;
        for row in other.data.rows() {
            self.data
                .push_row(row)
                .map_err(|e| Error::invalid_argument(format!("cannot append point: {e}")))?;
        }
        Ok(())
    }

    /// Iterate over rows as points.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.data.rows().into_iter().map(|r| r.iter().copied().collect())
    }

    /// Get a column as a vector.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn column(&self, idx: usize) -> Vec<f64> {
        self.data.column(idx).to_vec()
    }

    /// Select a subset of columns, returning a new sample.
    ///
    /// # Errors
    ///
    /// Returns an error if any column index is out of bounds.
    pub fn marginal(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.dimension()) {
            return Err(Error::invalid_argument(format!(
                "marginal index {bad} is out of bounds for dimension {}",
                self.dimension()
            )));
        }
        let data = self.data.select(Axis(1), indices);
        Ok(Self {
            data,
            description: self.description.select(indices),
        })
    }

    /// Get the column names.
    #[must_use]
    pub fn description(&self) -> &Description {
        &self.description
    }

    /// Set the column names.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of names differs from the dimension.
    pub fn set_description(&mut self, description: Description) -> Result<()> {
        check_dimension(self.dimension(), description.len())?;
        self.description = description;
        Ok(())
    }

    fn require_size(&self, min: usize, what: &str) -> Result<()> {
        if self.size() < min {
            return Err(Error::invalid_argument(format!(
                "cannot compute the {what} of a sample of size {} (need at least {min})",
                self.size()
            )));
        }
        Ok(())
    }

    /// Componentwise minimum.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample is empty.
    pub fn min(&self) -> Result<Point> {
        self.require_size(1, "minimum")?;
        Ok(self
            .data
            .columns()
            .into_iter()
            .map(|c| c.iter().copied().fold(f64::INFINITY, f64::min))
            .collect())
    }

    /// Componentwise maximum.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample is empty.
    pub fn max(&self) -> Result<Point> {
        self.require_size(1, "maximum")?;
        Ok(self
            .data
            .columns()
            .into_iter()
            .map(|c| c.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect())
    }

    /// Empirical mean.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample is empty.
    pub fn compute_mean(&self) -> Result<Point> {
        self.require_size(1, "mean")?;
        let n = self.size() as f64;
        Ok(self
            .data
            .columns()
            .into_iter()
            .map(|c| c.iter().sum::<f64>() / n)
            .collect())
    }

    /// Unbiased empirical covariance.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 2 points.
    pub fn compute_covariance(&self) -> Result<CovarianceMatrix> {
        self.require_size(2, "covariance")?;
        let mean = self.compute_mean()?;
        let d = self.dimension();
        let n = self.size() as f64;
        let mut cov = Array2::<f64>::zeros((d, d));
        for row in self.data.rows() {
            for i in 0..d {
                let di = row[i] - mean[i];
                for j in i..d {
                    cov[[i, j]] += di * (row[j] - mean[j]);
                }
            }
        }
        for i in 0..d {
            for j in i..d {
                let v = cov[[i, j]] / (n - 1.0);
                cov[[i, j]] = v;
                cov[[j, i]] = v;
            }
        }
        CovarianceMatrix::from_array(cov)
    }

    /// Unbiased empirical standard deviation per component.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 2 points.
    pub fn compute_standard_deviation(&self) -> Result<Point> {
        Ok(self
            .compute_central_moment(2)?
            .iter()
            .map(|m2| (m2 * self.size() as f64 / (self.size() as f64 - 1.0)).sqrt())
            .collect())
    }

    /// Bias-corrected skewness per component.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 3 points.
    pub fn compute_skewness(&self) -> Result<Point> {
        self.require_size(3, "skewness")?;
        let n = self.size() as f64;
        let m2 = self.compute_central_moment(2)?;
        let m3 = self.compute_central_moment(3)?;
        let correction = (n * (n - 1.0)).sqrt() / (n - 2.0);
        Ok(m2
            .iter()
            .zip(m3.iter())
            .map(|(v, t)| correction * t / v.powf(1.5))
            .collect())
    }

    /// Kurtosis `m4 / m2²` per component (3 for a normal population).
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 2 points.
    pub fn compute_kurtosis(&self) -> Result<Point> {
        self.require_size(2, "kurtosis")?;
        let m2 = self.compute_central_moment(2)?;
        let m4 = self.compute_central_moment(4)?;
        Ok(m2.iter().zip(m4.iter()).map(|(v, q)| q / (v * v)).collect())
    }

    /// Biased central moment of order `k` per component.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 2 points.
    pub fn compute_central_moment(&self, k: i32) -> Result<Point> {
        self.require_size(2, "central moment")?;
        let mean = self.compute_mean()?;
        let n = self.size() as f64;
        Ok(self
            .data
            .columns()
            .into_iter()
            .enumerate()
            .map(|(j, c)| c.iter().map(|x| (x - mean[j]).powi(k)).sum::<f64>() / n)
            .collect())
    }

    /// Sorted copy of a column.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub fn sort_column(&self, idx: usize) -> Vec<f64> {
        let mut values = self.column(idx);
        values.sort_by(f64::total_cmp);
        values
    }

    /// Per-column ranks in `[0, size)`; ties receive their average rank.
    #[must_use]
    pub fn rank(&self) -> Self {
        let (n, d) = self.data.dim();
        let mut ranks = Array2::<f64>::zeros((n, d));
        for j in 0..d {
            let column = self.data.column(j);
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
            let mut start = 0;
            while start < n {
                let mut end = start + 1;
                while end < n && column[order[end]] == column[order[start]] {
                    end += 1;
                }
                let average = 0.5 * ((start + end - 1) as f64);
                for &idx in &order[start..end] {
                    ranks[[idx, j]] = average;
                }
                start = end;
            }
        }
        Self {
            data: ranks,
            description: self.description.clone(),
        }
    }

    /// Pearson correlation matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 2 points or a constant column.
    pub fn compute_pearson_correlation(&self) -> Result<CovarianceMatrix> {
        self.compute_covariance()?.to_correlation()
    }

    /// Spearman rank correlation matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 2 points or a constant column.
    pub fn compute_spearman_correlation(&self) -> Result<CovarianceMatrix> {
        self.rank().compute_pearson_correlation()
    }

    /// Kendall tau matrix (tau-a: tied pairs count as neither concordant nor discordant).
    ///
    /// # Errors
    ///
    /// Returns an error if the sample has fewer than 2 points.
    pub fn compute_kendall_tau(&self) -> Result<CovarianceMatrix> {
        self.require_size(2, "Kendall tau")?;
        let (n, d) = self.data.dim();
        let pairs = (n * (n - 1) / 2) as f64;
        let mut tau = CovarianceMatrix::identity(d);
        for a in 0..d {
            for b in (a + 1)..d {
                let mut balance = 0.0;
                for i in 0..n {
                    for k in (i + 1)..n {
                        let s = (self.data[[i, a]] - self.data[[k, a]]).signum()
                            * (self.data[[i, b]] - self.data[[k, b]]).signum();
                        if s.is_finite()
                            && self.data[[i, a]] != self.data[[k, a]]
                            && self.data[[i, b]] != self.data[[k, b]]
                        {
                            balance += s;
                        }
                    }
                }
                tau.set(a, b, balance / pairs);
            }
        }
        Ok(tau)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self.points().map(|p| p.to_string()).collect();
        write!(f, "{} [{}]", self.description, rows.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_sample() -> Sample {
        Sample::from_shape_vec(4, 2, vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0, 4.0, 8.0]).unwrap()
    }

    #[test]
    fn test_shape_and_access() {
        let s = two_column_sample();
        assert_eq!(s.size(), 4);
        assert_eq!(s.dimension(), 2);
        assert_eq!(s.get(2, 1), 6.0);
        assert_eq!(s.row(1), Point::from_vec(vec![2.0, 4.0]));
        assert_eq!(s.column(0), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_add_checks_dimension() {
        let mut s = two_column_sample();
        assert!(s.add(&Point::from_vec(vec![5.0, 10.0])).is_ok());
        assert_eq!(s.size(), 5);
        assert!(s.add(&Point::scalar(1.0)).is_err());
        assert_eq!(s.size(), 5);
    }

    #[test]
    fn test_moments() {
        let s = two_column_sample();
        let mean = s.compute_mean().unwrap();
        assert_eq!(mean, Point::from_vec(vec![2.5, 5.0]));
        let cov = s.compute_covariance().unwrap();
        assert!((cov.get(0, 0) - 5.0 / 3.0).abs() < 1e-12);
        assert!((cov.get(0, 1) - 10.0 / 3.0).abs() < 1e-12);
        let r = s.compute_pearson_correlation().unwrap();
        assert!((r.get(0, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_with_ties() {
        let s = Sample::from_scalars(&[3.0, 1.0, 3.0, 2.0]);
        let r = s.rank();
        assert_eq!(r.column(0), vec![2.5, 0.0, 2.5, 1.0]);
    }

    #[test]
    fn test_kendall_tau_monotone() {
        let s = two_column_sample();
        let tau = s.compute_kendall_tau().unwrap();
        assert!((tau.get(0, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_marginal() {
        let s = two_column_sample();
        let m = s.marginal(&[1]).unwrap();
        assert_eq!(m.dimension(), 1);
        assert_eq!(m.column(0), vec![2.0, 4.0, 6.0, 8.0]);
        assert_eq!(m.description().get(0), Some("X1"));
        assert!(s.marginal(&[2]).is_err());
    }

    #[test]
    fn test_statistics_require_points() {
        let s = Sample::empty(1);
        assert!(s.compute_mean().is_err());
        assert!(Sample::from_scalars(&[1.0]).compute_covariance().is_err());
    }
}
