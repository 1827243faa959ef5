use std::fmt;
use std::ops::{Add, Index, IndexMut, Mul, Sub};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, Result};

/// A fixed-length vector of real values.
///
/// The dimension is fixed at construction. Componentwise arithmetic through
/// the operator traits panics on dimension mismatch like slice indexing does;
/// use [`Point::checked_add`] and [`Point::checked_sub`] to get an error
/// instead.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    values: Vec<f64>,
}

impl Point {
    /// Create a point of the given dimension filled with zeros.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self::filled(dimension, 0.0)
    }

    /// Create a point of the given dimension filled with `value`.
    #[must_use]
    pub fn filled(dimension: usize, value: f64) -> Self {
        Self {
            values: vec![value; dimension],
        }
    }

    /// Create a point from its components.
    #[must_use]
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Create a one-dimensional point.
    #[must_use]
    pub fn scalar(value: f64) -> Self {
        Self {
            values: vec![value],
        }
    }

    /// Get the dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Whether the point has no component.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the components as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Get the components as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Consume the point and return its components.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Convert to an ndarray vector.
    #[must_use]
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(self.values.clone())
    }

    /// Iterate over the components.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    /// Append a component.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Euclidean norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Squared Euclidean norm.
    #[must_use]
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Dot product.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions differ.
    pub fn dot(&self, other: &Self) -> Result<f64> {
        check_dimension(self.dimension(), other.dimension())?;
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum())
    }

    /// Componentwise sum.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions differ.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        check_dimension(self.dimension(), other.dimension())?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    /// Componentwise difference.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions differ.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        check_dimension(self.dimension(), other.dimension())?;
        Ok(self.zip_with(other, |a, b| a - b))
    }

    fn zip_with(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| op(a, b))
                .collect(),
        }
    }
}

impl Index<usize> for Point {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.values[index]
    }
}

impl From<Vec<f64>> for Point {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl From<&[f64]> for Point {
    fn from(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }
}

impl FromIterator<f64> for Point {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Point {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Add for &Point {
    type Output = Point;

    /// # Panics
    ///
    /// Panics if the dimensions differ.
    fn add(self, rhs: &Point) -> Point {
        assert_eq!(
            self.dimension(),
            rhs.dimension(),
            "cannot add points of dimensions {} and {}",
            self.dimension(),
            rhs.dimension()
        );
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &Point {
    type Output = Point;

    /// # Panics
    ///
    /// Panics if the dimensions differ.
    fn sub(self, rhs: &Point) -> Point {
        assert_eq!(
            self.dimension(),
            rhs.dimension(),
            "cannot subtract points of dimensions {} and {}",
            self.dimension(),
            rhs.dimension()
        );
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul<f64> for &Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        self.values.iter().map(|v| v * rhs).collect()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Point::from_vec(vec![1.0, 2.0]);
        let b = Point::from_vec(vec![3.0, -1.0]);
        assert_eq!(&a + &b, Point::from_vec(vec![4.0, 1.0]));
        assert_eq!(&a - &b, Point::from_vec(vec![-2.0, 3.0]));
        assert_eq!(&a * 2.0, Point::from_vec(vec![2.0, 4.0]));
        assert_eq!(a.dot(&b).unwrap(), 1.0);
    }

    #[test]
    fn test_norm() {
        let p = Point::from_vec(vec![3.0, 4.0]);
        assert_eq!(p.norm(), 5.0);
        assert_eq!(p.norm_squared(), 25.0);
    }

    #[test]
    fn test_checked_ops_reject_mismatch() {
        let a = Point::new(2);
        let b = Point::new(3);
        assert!(a.checked_add(&b).is_err());
        assert!(a.checked_sub(&b).is_err());
        assert!(a.dot(&b).is_err());
    }

    #[test]
    #[should_panic(expected = "cannot add points")]
    fn test_add_panics_on_mismatch() {
        let _ = &Point::new(2) + &Point::new(3);
    }

    #[test]
    fn test_display() {
        let p = Point::from_vec(vec![1.5, -2.0]);
        assert_eq!(p.to_string(), "[1.5,-2]");
    }
}
