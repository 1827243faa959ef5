use super::{ExperimentImplementation, StratifiedDesign};
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{Point, Sample};

/// Largest dimension for which the `2^d` corners are enumerated.
const MAX_DIMENSION: usize = 30;

/// Box design: the `2^d` corners `center + level·s`, `s ∈ {-1, +1}^d`, for
/// every level.
///
/// Corners are ordered by level, then by corner index, where bit `i` of the
/// index selects the `+` side on axis `i`.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let design = Factorial::centered(2, Point::from_vec(vec![1.0])).unwrap();
/// let sample = design.generate().unwrap();
/// assert_eq!(sample.row(0), Point::from_vec(vec![-1.0, -1.0]));
/// assert_eq!(sample.row(1), Point::from_vec(vec![1.0, -1.0]));
/// assert_eq!(sample.row(3), Point::from_vec(vec![1.0, 1.0]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Factorial {
    design: StratifiedDesign,
}

impl Factorial {
    /// Box design around `center`.
    ///
    /// # Errors
    ///
    /// See [`StratifiedDesign::new`]; also `InvalidArgument` if the dimension
    /// exceeds 30.
    pub fn new(center: Point, levels: Point) -> Result<Self> {
        Self::from_design(StratifiedDesign::new(center, levels)?)
    }

    /// Box design around the origin.
    ///
    /// # Errors
    ///
    /// Same as [`Factorial::new`].
    pub fn centered(dimension: usize, levels: Point) -> Result<Self> {
        Self::from_design(StratifiedDesign::centered(dimension, levels)?)
    }

    fn from_design(design: StratifiedDesign) -> Result<Self> {
        if design.dimension() > MAX_DIMENSION {
            return Err(Error::invalid_argument(format!(
                "a factorial design has 2^d corners, dimension {} exceeds {MAX_DIMENSION}",
                design.dimension()
            )));
        }
        Ok(Self { design })
    }

    /// Center and levels.
    #[must_use]
    pub fn design(&self) -> &StratifiedDesign {
        &self.design
    }

    fn points(&self) -> Result<Sample> {
        let center = self.design.center();
        let d = self.design.dimension();
        let mut sample = Sample::empty(d);
        for &level in self.design.levels() {
            for corner in 0..1usize << d {
                let point: Point = center
                    .iter()
                    .enumerate()
                    .map(|(axis, c)| {
                        if corner >> axis & 1 == 1 {
                            c + level
                        } else {
                            c - level
                        }
                    })
                    .collect();
                sample.add(&point)?;
            }
        }
        Ok(sample)
    }
}

impl ExperimentImplementation for Factorial {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn ExperimentImplementation> {
        Box::new(self.clone())
    }

    fn dimension(&self) -> usize {
        self.design.dimension()
    }

    fn size(&self) -> usize {
        (1usize << self.design.dimension()) * self.design.levels().dimension()
    }

    fn is_random(&self) -> bool {
        false
    }

    fn generate_from(&self, _rng: &mut RandomGenerator) -> Result<Sample> {
        self.points()
    }

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_attribute("center", self.design.center())?;
        advocate.save_attribute("levels", self.design.levels())
    }

    fn repr(&self) -> String {
        format!(
            "class={} center={} levels={}",
            Self::CLASS_NAME,
            self.design.center(),
            self.design.levels()
        )
    }
}

impl PersistentObject for Factorial {
    const CLASS_NAME: &'static str = "Factorial";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        ExperimentImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        Self::new(
            advocate.load_attribute("center")?,
            advocate.load_attribute("levels")?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_count_and_order() {
        let center = Point::from_vec(vec![1.0, 2.0, 3.0]);
        let design = Factorial::new(center.clone(), Point::from_vec(vec![1.0, 0.5])).unwrap();
        let sample = design.generate().unwrap();
        assert_eq!(sample.size(), 16);
        assert_eq!(design.size(), 16);
        // corner 5 = bits 0 and 2
        assert_eq!(sample.row(5), Point::from_vec(vec![2.0, 1.0, 4.0]));
        assert_eq!(sample.row(8), Point::from_vec(vec![0.5, 1.5, 2.5]));
        for point in sample.points() {
            let offset = &point - &center;
            let level = offset[0].abs();
            assert!(offset.iter().all(|x| x.abs() == level));
        }
    }

    #[test]
    fn test_rejects_huge_dimension() {
        let err = Factorial::centered(40, Point::from_vec(vec![1.0])).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_persistence() {
        let design = Factorial::centered(2, Point::from_vec(vec![2.0])).unwrap();
        let restored = Factorial::load(&design.to_advocate().unwrap()).unwrap();
        assert_eq!(restored, design);
        assert!(Factorial::load(&Advocate::new("Composite")).is_err());
    }
}
