use super::ExperimentImplementation;
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::{Point, Sample};

/// Resampling with replacement of a reference sample.
///
/// One run draws as many points as the reference holds, each uniformly among
/// the reference points. The generated sample keeps the reference's
/// description. Bootstrap points carry no weights:
/// [`ExperimentImplementation::generate_with_weights_from`] returns an empty
/// weight point.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let reference = Sample::from_scalars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
/// let bootstrap = Bootstrap::new(reference.clone()).unwrap();
/// let mut rng = RandomGenerator::with_seed(5);
/// let (resample, weights) = bootstrap.generate_with_weights_from(&mut rng).unwrap();
/// assert_eq!(resample.size(), 5);
/// assert!(weights.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    reference: Sample,
}

impl Bootstrap {
    /// Resampling of `reference`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the reference sample is empty.
    pub fn new(reference: Sample) -> Result<Self> {
        if reference.is_empty() {
            return Err(Error::invalid_argument(
                "cannot bootstrap an empty reference sample",
            ));
        }
        Ok(Self { reference })
    }

    /// The reference sample.
    #[must_use]
    pub fn reference(&self) -> &Sample {
        &self.reference
    }
}

impl ExperimentImplementation for Bootstrap {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn ExperimentImplementation> {
        Box::new(self.clone())
    }

    fn dimension(&self) -> usize {
        self.reference.dimension()
    }

    fn size(&self) -> usize {
        self.reference.size()
    }

    fn generate_from(&self, rng: &mut RandomGenerator) -> Result<Sample> {
        let size = self.reference.size();
        let mut sample = Sample::new(size, self.reference.dimension());
        for i in 0..size {
            sample.set_row(i, &self.reference.row(rng.integer(size)))?;
        }
        sample.set_description(self.reference.description().clone())?;
        Ok(sample)
    }

    fn generate_with_weights_from(&self, rng: &mut RandomGenerator) -> Result<(Sample, Point)> {
        Ok((self.generate_from(rng)?, Point::new(0)))
    }

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_attribute("reference", &self.reference)
    }

    fn repr(&self) -> String {
        format!(
            "class={} size={} dimension={}",
            Self::CLASS_NAME,
            self.reference.size(),
            self.reference.dimension()
        )
    }
}

impl PersistentObject for Bootstrap {
    const CLASS_NAME: &'static str = "Bootstrap";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        ExperimentImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        Self::new(advocate.load_attribute("reference")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Sample {
        Sample::from_rows(&[
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![3.0, 30.0],
            vec![4.0, 40.0],
            vec![5.0, 50.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_points_come_from_reference() {
        let bootstrap = Bootstrap::new(reference()).unwrap();
        let mut rng = RandomGenerator::with_seed(8);
        let sample = bootstrap.generate_from(&mut rng).unwrap();
        assert_eq!(sample.size(), 5);
        let rows: Vec<Point> = reference().points().collect();
        for point in sample.points() {
            assert!(rows.contains(&point));
        }
    }

    #[test]
    fn test_same_seed_same_resample() {
        let bootstrap = Bootstrap::new(reference()).unwrap();
        let mut a = RandomGenerator::with_seed(21);
        let mut b = RandomGenerator::with_seed(21);
        assert_eq!(
            bootstrap.generate_from(&mut a).unwrap(),
            bootstrap.generate_from(&mut b).unwrap()
        );
    }

    #[test]
    fn test_resample_draws_with_replacement() {
        let bootstrap = Bootstrap::new(Sample::from_scalars(&(0..50).map(f64::from).collect::<Vec<_>>()))
            .unwrap();
        let mut rng = RandomGenerator::with_seed(2);
        let mut values = bootstrap.generate_from(&mut rng).unwrap().column(0);
        values.sort_by(f64::total_cmp);
        values.dedup();
        // 50 draws among 50 points repeat at least once with overwhelming probability
        assert!(values.len() < 50);
    }

    #[test]
    fn test_weights_are_empty() {
        let bootstrap = Bootstrap::new(reference()).unwrap();
        let (_, weights) = bootstrap.generate_with_weights().unwrap();
        assert_eq!(weights.dimension(), 0);
    }

    #[test]
    fn test_empty_reference_is_rejected() {
        assert!(Bootstrap::new(Sample::empty(2)).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_persistence() {
        let bootstrap = Bootstrap::new(reference()).unwrap();
        let json = bootstrap.to_advocate().unwrap().to_json().unwrap();
        let restored = Bootstrap::load(&Advocate::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored, bootstrap);
    }
}
