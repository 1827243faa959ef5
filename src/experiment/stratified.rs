use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Point;

/// Center and levels shared by the stratified designs.
///
/// Levels are distances from the center; each must be positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratifiedDesign {
    center: Point,
    levels: Point,
}

impl StratifiedDesign {
    /// Validate a center and a list of levels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the center has dimension 0 or a
    /// non-finite component, or if the levels are empty, non-positive or
    /// non-finite.
    pub fn new(center: Point, levels: Point) -> Result<Self> {
        if center.dimension() == 0 {
            return Err(Error::invalid_argument(
                "a stratified design needs a center of positive dimension",
            ));
        }
        if center.iter().any(|c| !c.is_finite()) {
            return Err(Error::invalid_argument(format!(
                "the center of a stratified design must be finite, got {center}"
            )));
        }
        if levels.is_empty() {
            return Err(Error::invalid_argument(
                "a stratified design needs at least one level",
            ));
        }
        if let Some(level) = levels.iter().find(|l| !(l.is_finite() && **l > 0.0)) {
            return Err(Error::invalid_argument(format!(
                "levels must be positive and finite, got {level}"
            )));
        }
        Ok(Self { center, levels })
    }

    /// Design centered at the origin of dimension `dimension`.
    ///
    /// # Errors
    ///
    /// Same as [`StratifiedDesign::new`].
    pub fn centered(dimension: usize, levels: Point) -> Result<Self> {
        Self::new(Point::new(dimension), levels)
    }

    /// Center of the design.
    #[must_use]
    pub fn center(&self) -> &Point {
        &self.center
    }

    /// Levels of the design.
    #[must_use]
    pub fn levels(&self) -> &Point {
        &self.levels
    }

    /// Dimension of the design points.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.center.dimension()
    }

    /// Replace the center, keeping its dimension.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the dimension changes and
    /// `InvalidArgument` for a non-finite component.
    pub fn set_center(&mut self, center: Point) -> Result<()> {
        crate::error::check_dimension(self.dimension(), center.dimension())?;
        *self = Self::new(center, self.levels.clone())?;
        Ok(())
    }

    /// Replace the levels.
    ///
    /// # Errors
    ///
    /// Same as [`StratifiedDesign::new`].
    pub fn set_levels(&mut self, levels: Point) -> Result<()> {
        *self = Self::new(self.center.clone(), levels)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        let levels = Point::from_vec(vec![1.0]);
        assert!(StratifiedDesign::new(Point::new(0), levels.clone())
            .unwrap_err()
            .is_invalid_argument());
        assert!(StratifiedDesign::new(Point::new(2), Point::new(0))
            .unwrap_err()
            .is_invalid_argument());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(StratifiedDesign::new(Point::new(2), Point::from_vec(vec![1.0, bad]))
                .unwrap_err()
                .is_invalid_argument());
        }
        assert!(StratifiedDesign::new(Point::from_vec(vec![f64::NAN]), levels).is_err());
    }

    #[test]
    fn test_rejected_update_keeps_state() {
        let mut design = StratifiedDesign::centered(2, Point::from_vec(vec![1.0, 2.0])).unwrap();
        assert!(design.set_center(Point::new(3)).is_err());
        assert!(design.set_levels(Point::from_vec(vec![-1.0])).is_err());
        assert_eq!(design.dimension(), 2);
        assert_eq!(design.levels(), &Point::from_vec(vec![1.0, 2.0]));
        design.set_center(Point::from_vec(vec![1.0, 1.0])).unwrap();
        assert_eq!(design.center()[0], 1.0);
    }
}
