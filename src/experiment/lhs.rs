use super::{require_positive_size, ExperimentImplementation};
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::persistence::{Advocate, PersistentObject};
use crate::random::RandomGenerator;
use crate::types::Sample;

/// Latin hypercube sampling of a distribution with independent components.
///
/// Each axis is cut into `N` cells of equal marginal probability and every
/// cell is hit exactly once: component `j` of point `i` is the marginal
/// quantile of `(πⱼ(i) + U)/N`, with `πⱼ` a random permutation and `U`
/// uniform on `(0, 1)`.
///
/// # Example
///
/// ```
/// use uqcore::prelude::*;
///
/// let lhs = LHSExperiment::new(Uniform::new(0.0, 1.0).unwrap(), 4).unwrap();
/// let mut rng = RandomGenerator::with_seed(2);
/// let mut values = lhs.generate_from(&mut rng).unwrap().column(0);
/// values.sort_by(f64::total_cmp);
/// for (i, x) in values.iter().enumerate() {
///     assert!(*x > i as f64 / 4.0 && *x < (i + 1) as f64 / 4.0);
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LHSExperiment {
    distribution: Distribution,
    marginals: Vec<Distribution>,
    size: usize,
}

impl LHSExperiment {
    /// Latin hypercube of `size` points.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `size` is 0 or the components of the
    /// distribution are not independent, and the error of
    /// [`Distribution::marginal`] if a marginal is unavailable.
    pub fn new(distribution: impl Into<Distribution>, size: usize) -> Result<Self> {
        require_positive_size(size, Self::CLASS_NAME)?;
        let distribution = distribution.into();
        if !distribution.has_independent_copula() {
            return Err(Error::invalid_argument(format!(
                "LHS needs a distribution with independent components, got {distribution}"
            )));
        }
        let marginals = (0..distribution.dimension())
            .map(|j| distribution.marginal(j))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            distribution,
            marginals,
            size,
        })
    }

    /// The sampled distribution.
    #[must_use]
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }
}

impl ExperimentImplementation for LHSExperiment {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn clone_box(&self) -> Box<dyn ExperimentImplementation> {
        Box::new(self.clone())
    }

    fn dimension(&self) -> usize {
        self.distribution.dimension()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn generate_from(&self, rng: &mut RandomGenerator) -> Result<Sample> {
        let n = self.size;
        let mut sample = Sample::new(n, self.dimension());
        for (j, marginal) in self.marginals.iter().enumerate() {
            let permutation = rng.permutation(n);
            for (i, cell) in permutation.into_iter().enumerate() {
                let u = (cell as f64 + rng.uniform_open()) / n as f64;
                sample.set(i, j, marginal.compute_scalar_quantile(u)?);
            }
        }
        sample.set_description(self.distribution.description().clone())?;
        Ok(sample)
    }

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_record("distribution", &self.distribution.to_advocate()?)?;
        advocate.save_attribute("size", &self.size)
    }

    fn repr(&self) -> String {
        format!(
            "class={} distribution={} size={}",
            Self::CLASS_NAME,
            self.distribution,
            self.size
        )
    }
}

impl PersistentObject for LHSExperiment {
    const CLASS_NAME: &'static str = "LHSExperiment";

    fn save(&self, advocate: &mut Advocate) -> Result<()> {
        ExperimentImplementation::save(self, advocate)
    }

    fn load(advocate: &Advocate) -> Result<Self> {
        advocate.check_class(Self::CLASS_NAME)?;
        Self::new(
            Distribution::load(&advocate.load_record("distribution")?)?,
            advocate.load_attribute("size")?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{Normal, NormalCopula, Uniform};
    use crate::types::{CovarianceMatrix, Point};

    #[test]
    fn test_one_point_per_cell() {
        let distribution = Normal::multivariate(
            Point::from_vec(vec![1.0, -2.0]),
            Point::from_vec(vec![2.0, 0.5]),
            CovarianceMatrix::identity(2),
        )
        .unwrap();
        let lhs = LHSExperiment::new(distribution.clone(), 20).unwrap();
        let mut rng = RandomGenerator::with_seed(31);
        let sample = lhs.generate_from(&mut rng).unwrap();
        let handle = Distribution::from(distribution);
        for j in 0..2 {
            let marginal = handle.marginal(j).unwrap();
            let mut cells: Vec<usize> = sample
                .column(j)
                .iter()
                .map(|x| {
                    let u = marginal.compute_cdf(&Point::scalar(*x)).unwrap();
                    (u * 20.0).floor() as usize
                })
                .collect();
            cells.sort_unstable();
            assert_eq!(cells, (0..20).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_reproducible() {
        let lhs = LHSExperiment::new(Uniform::new(-1.0, 1.0).unwrap(), 8).unwrap();
        let mut a = RandomGenerator::with_seed(6);
        let mut b = RandomGenerator::with_seed(6);
        assert_eq!(
            lhs.generate_from(&mut a).unwrap(),
            lhs.generate_from(&mut b).unwrap()
        );
    }

    #[test]
    fn test_rejects_dependent_components() {
        let correlation =
            CovarianceMatrix::from_rows(&[vec![1.0, 0.3], vec![0.3, 1.0]]).unwrap();
        let copula = NormalCopula::new(correlation).unwrap();
        assert!(LHSExperiment::new(copula, 10).unwrap_err().is_invalid_argument());
        assert!(LHSExperiment::new(Normal::standard(1), 0).is_err());
    }

    #[test]
    fn test_persistence() {
        let lhs = LHSExperiment::new(Normal::standard(3), 5).unwrap();
        let restored = LHSExperiment::load(&lhs.to_advocate().unwrap()).unwrap();
        assert_eq!(restored, lhs);
    }
}
