use std::fmt;

use serde::{Deserialize, Serialize};

use super::Point;
use crate::error::{check_dimension, Error, Result};

/// An axis-aligned box `[lower, upper]`.
///
/// Each side carries a finiteness flag: an unbounded support is represented
/// by its numerical range together with `false` flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    lower: Point,
    upper: Point,
    finite_lower: Vec<bool>,
    finite_upper: Vec<bool>,
}

impl Interval {
    /// Create a bounded interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds have different dimensions.
    pub fn new(lower: Point, upper: Point) -> Result<Self> {
        let dimension = lower.dimension();
        Self::with_finiteness(lower, upper, vec![true; dimension], vec![true; dimension])
    }

    /// Create an interval with explicit finiteness flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds or flags have inconsistent dimensions.
    pub fn with_finiteness(
        lower: Point,
        upper: Point,
        finite_lower: Vec<bool>,
        finite_upper: Vec<bool>,
    ) -> Result<Self> {
        let dimension = lower.dimension();
        check_dimension(dimension, upper.dimension())?;
        if finite_lower.len() != dimension || finite_upper.len() != dimension {
            return Err(Error::invalid_argument(
                "finiteness flags must match the interval dimension",
            ));
        }
        Ok(Self {
            lower,
            upper,
            finite_lower,
            finite_upper,
        })
    }

    /// Create a one-dimensional interval `[a, b]` with explicit finiteness.
    #[must_use]
    pub fn univariate(a: f64, b: f64, finite_lower: bool, finite_upper: bool) -> Self {
        Self {
            lower: Point::scalar(a),
            upper: Point::scalar(b),
            finite_lower: vec![finite_lower],
            finite_upper: vec![finite_upper],
        }
    }

    /// Get the dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.lower.dimension()
    }

    /// Lower bound.
    #[must_use]
    pub fn lower_bound(&self) -> &Point {
        &self.lower
    }

    /// Upper bound.
    #[must_use]
    pub fn upper_bound(&self) -> &Point {
        &self.upper
    }

    /// Finiteness of the lower bound per component.
    #[must_use]
    pub fn finite_lower_bound(&self) -> &[bool] {
        &self.finite_lower
    }

    /// Finiteness of the upper bound per component.
    #[must_use]
    pub fn finite_upper_bound(&self) -> &[bool] {
        &self.finite_upper
    }

    /// Whether the box is empty (some lower bound exceeds its upper bound).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .any(|(lo, hi)| lo > hi)
    }

    /// Whether the point lies in the closed box.
    ///
    /// Points of another dimension are never contained.
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.dimension() == self.dimension()
            && point
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(x, (lo, hi))| lo <= x && x <= hi)
    }

    /// Extract the sub-box over the given components.
    #[must_use]
    pub fn marginal(&self, indices: &[usize]) -> Self {
        Self {
            lower: indices.iter().map(|&i| self.lower[i]).collect(),
            upper: indices.iter().map(|&i| self.upper[i]).collect(),
            finite_lower: indices.iter().map(|&i| self.finite_lower[i]).collect(),
            finite_upper: indices.iter().map(|&i| self.finite_upper[i]).collect(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = (0..self.dimension())
            .map(|i| {
                let lo = if self.finite_lower[i] {
                    format!("[{}", self.lower[i])
                } else {
                    format!("]-inf ({})", self.lower[i])
                };
                let hi = if self.finite_upper[i] {
                    format!("{}]", self.upper[i])
                } else {
                    format!("({}) +inf[", self.upper[i])
                };
                format!("{lo}, {hi}")
            })
            .collect();
        write!(f, "{}", parts.join("x"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let interval =
            Interval::new(Point::from_vec(vec![0.0, -1.0]), Point::from_vec(vec![1.0, 1.0]))
                .unwrap();
        assert!(interval.contains(&Point::from_vec(vec![0.5, 0.0])));
        assert!(interval.contains(&Point::from_vec(vec![1.0, -1.0])));
        assert!(!interval.contains(&Point::from_vec(vec![1.5, 0.0])));
        assert!(!interval.contains(&Point::scalar(0.5)));
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(Interval::new(Point::new(2), Point::new(3)).is_err());
    }

    #[test]
    fn test_marginal_and_empty() {
        let interval = Interval::with_finiteness(
            Point::from_vec(vec![0.0, 2.0]),
            Point::from_vec(vec![1.0, 1.0]),
            vec![true, false],
            vec![true, true],
        )
        .unwrap();
        assert!(interval.is_empty());
        let sub = interval.marginal(&[1]);
        assert_eq!(sub.lower_bound()[0], 2.0);
        assert_eq!(sub.finite_lower_bound(), &[false]);
    }
}
