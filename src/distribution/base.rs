use once_cell::sync::OnceCell;

use crate::config::NumericalSettings;
use crate::error::{check_dimension, Result};
use crate::persistence::Advocate;
use crate::types::{CovarianceMatrix, Description, Point};

/// State shared by every distribution family.
///
/// Holds the dimension, the user-facing name and description, the numerical
/// settings used by the fallbacks, and the lazily computed moments. The moment
/// cache must be invalidated by every parameter mutation.
#[derive(Debug, Clone)]
pub struct DistributionBase {
    dimension: usize,
    name: String,
    description: Description,
    settings: NumericalSettings,
    mean: OnceCell<Point>,
    covariance: OnceCell<CovarianceMatrix>,
}

impl DistributionBase {
    /// Create the shared state of a distribution of the given dimension.
    #[must_use]
    pub fn new(name: &str, dimension: usize) -> Self {
        Self {
            dimension,
            name: name.to_owned(),
            description: Description::with_default_names(dimension),
            settings: NumericalSettings::default(),
            mean: OnceCell::new(),
            covariance: OnceCell::new(),
        }
    }

    /// Dimension of the distribution.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Change the dimension, resetting the description.
    ///
    /// Used by families whose dimension follows their parameters.
    pub fn set_dimension(&mut self, dimension: usize) {
        if dimension != self.dimension {
            self.dimension = dimension;
            self.description = Description::with_default_names(dimension);
        }
        self.invalidate_moments();
    }

    /// User-facing name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the user-facing name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Component names.
    #[must_use]
    pub fn description(&self) -> &Description {
        &self.description
    }

    /// Set the component names.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of names differs from the dimension.
    pub fn set_description(&mut self, description: Description) -> Result<()> {
        check_dimension(self.dimension, description.len())?;
        self.description = description;
        Ok(())
    }

    /// Numerical settings.
    #[must_use]
    pub fn settings(&self) -> &NumericalSettings {
        &self.settings
    }

    /// Replace the numerical settings; cached moments are recomputed lazily.
    pub fn set_settings(&mut self, settings: NumericalSettings) {
        self.settings = settings;
        self.invalidate_moments();
    }

    /// Drop the cached moments.
    pub fn invalidate_moments(&mut self) {
        self.mean = OnceCell::new();
        self.covariance = OnceCell::new();
    }

    /// Cached mean, computed by `compute` on first access.
    ///
    /// # Errors
    ///
    /// Propagates the error of `compute`; nothing is cached in that case.
    pub fn cached_mean<F>(&self, compute: F) -> Result<Point>
    where
        F: FnOnce() -> Result<Point>,
    {
        self.mean.get_or_try_init(compute).cloned()
    }

    /// Cached covariance, computed by `compute` on first access.
    ///
    /// # Errors
    ///
    /// Propagates the error of `compute`; nothing is cached in that case.
    pub fn cached_covariance<F>(&self, compute: F) -> Result<CovarianceMatrix>
    where
        F: FnOnce() -> Result<CovarianceMatrix>,
    {
        self.covariance.get_or_try_init(compute).cloned()
    }

    /// Whether the mean is currently cached.
    #[must_use]
    pub fn has_cached_mean(&self) -> bool {
        self.mean.get().is_some()
    }

    /// Write name, description and settings.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be serialized.
    pub fn save(&self, advocate: &mut Advocate) -> Result<()> {
        advocate.save_attribute("name", &self.name)?;
        advocate.save_attribute("dimension", &self.dimension)?;
        advocate.save_attribute("description", &self.description)?;
        advocate.save_attribute("settings", &self.settings)
    }

    /// Read back what [`DistributionBase::save`] wrote.
    ///
    /// The dimension is not restored; it must already match.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute is missing or inconsistent.
    pub fn load(&mut self, advocate: &Advocate) -> Result<()> {
        let dimension: usize = advocate.load_attribute("dimension")?;
        check_dimension(self.dimension, dimension)?;
        self.name = advocate.load_attribute("name")?;
        self.set_description(advocate.load_attribute("description")?)?;
        self.set_settings(advocate.load_attribute("settings")?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_and_invalidate() {
        let mut base = DistributionBase::new("Test", 1);
        let mean = base.cached_mean(|| Ok(Point::scalar(1.0))).unwrap();
        assert_eq!(mean, Point::scalar(1.0));
        // second access reads the cache
        let mean = base.cached_mean(|| Ok(Point::scalar(2.0))).unwrap();
        assert_eq!(mean, Point::scalar(1.0));
        base.invalidate_moments();
        assert!(!base.has_cached_mean());
        let mean = base.cached_mean(|| Ok(Point::scalar(2.0))).unwrap();
        assert_eq!(mean, Point::scalar(2.0));
    }

    #[test]
    fn test_failed_computation_not_cached() {
        let base = DistributionBase::new("Test", 1);
        assert!(base
            .cached_mean(|| Err(crate::error::Error::domain("no mean")))
            .is_err());
        assert!(!base.has_cached_mean());
    }

    #[test]
    fn test_description_dimension_checked() {
        let mut base = DistributionBase::new("Test", 2);
        assert!(base.set_description(Description::from(vec!["a"])).is_err());
        assert!(base
            .set_description(Description::from(vec!["a", "b"]))
            .is_ok());
        assert_eq!(&base.description()[1], "b");
    }
}
