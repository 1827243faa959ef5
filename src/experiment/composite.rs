use super::{ExperimentImplementation, StratifiedDesign};
use crate::error::Result;
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{Point, Sample};

/// Star design: the points `center ± level·eᵢ` for every axis `i` and level.
///
/// Points are ordered by axis, then level, then sign (`+` before `-`). The
/// center itself is not part of the design.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let design = Composite::centered(3, Point::from_vec(vec![0.5])).unwrap();
/// let sample = design.generate().unwrap();
/// assert_eq!(sample.size(), 6);
/// assert_eq!(sample.row(5), Point::from_vec(vec![0.0, 0.0, -0.5]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    design: StratifiedDesign,
}

impl Composite {
    /// Star design around `center`.
    ///
    /// # Errors
    ///
    /// See [`StratifiedDesign::new`].
    pub fn new(center: Point, levels: Point) -> Result<Self> {
        Ok(Self {
            design: StratifiedDesign::new(center, levels)?,
        })
    }

    /// Star design around the origin.
    ///
    /// # Errors
    ///
    /// See [`StratifiedDesign::new`].
    pub fn centered(dimension: usize, levels: Point) -> Result<Self> {
        Ok(Self {
            design: StratifiedDesign::centered(dimension, levels)?,
        })
    }

    /// Center and levels.
    #[must_use]
    pub fn design(&self) -> &StratifiedDesign {
        &self.design
    }

    /// Mutable center and levels.
    pub fn design_mut(&mut self) -> &mut StratifiedDesign {
        &mut self.design
    }

    fn points(&self) -> Result<Sample> {
        let center = self.design.center();
        let d = self.design.dimension();
        let mut sample = Sample::empty(d);
        for axis in 0..d {
            for &level in self.design.levels() {
                for sign in [1.0, -1.0] {
                    let mut point = center.clone();
                    point[axis] += sign * level;
                    sample.add(&point)?;
                }
            }
        }
        Ok(sample)
    }
}

impl ExperimentImplementation for Composite {
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
        2 * self.design.dimension() * self.design.levels().dimension()
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

impl PersistentObject for Composite {
    const CLASS_NAME: &'static str = "Composite";

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
