use super::{
    BinomialFactory, DirichletFactory, DistributionFactory, ExponentialFactory, GammaFactory,
    LogNormalFactory, NormalCopulaFactory, NormalFactory, TruncatedNormalFactory, UniformFactory,
};
use crate::error::{Error, Result};

/// Dimensions a factory can fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensionality {
    /// One-dimensional samples only.
    Univariate,
    /// Samples of dimension ≥ 2 only.
    Multivariate,
    /// Samples of any dimension.
    Any,
}

impl Dimensionality {
    fn univariate(self) -> bool {
        matches!(self, Self::Univariate | Self::Any)
    }

    fn multivariate(self) -> bool {
        matches!(self, Self::Multivariate | Self::Any)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    factory: DistributionFactory,
    continuous: bool,
    dimensionality: Dimensionality,
}

/// Collection of factories queryable by name and category.
///
/// # Example
///
/// ```
/// use uqcore::factory::FactoryRegistry;
///
/// let registry = FactoryRegistry::with_defaults();
/// assert_eq!(registry.get_by_name("gamma").unwrap().class_name(), "GammaFactory");
/// assert_eq!(registry.discrete_univariate().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FactoryRegistry {
    entries: Vec<Entry>,
}

impl FactoryRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every factory of the crate.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(UniformFactory::default(), Dimensionality::Univariate);
        registry.register(NormalFactory::default(), Dimensionality::Any);
        registry.register(LogNormalFactory::default(), Dimensionality::Univariate);
        registry.register(GammaFactory::default(), Dimensionality::Univariate);
        registry.register(ExponentialFactory::default(), Dimensionality::Univariate);
        registry.register(TruncatedNormalFactory::default(), Dimensionality::Univariate);
        registry.register(BinomialFactory::default(), Dimensionality::Univariate);
        registry.register(DirichletFactory::default(), Dimensionality::Any);
        registry.register(NormalCopulaFactory::default(), Dimensionality::Any);
        registry
    }

    /// Add a factory, replacing any factory of the same distribution class.
    ///
    /// Whether it is continuous is read from the family's default instance.
    pub fn register(
        &mut self,
        factory: impl Into<DistributionFactory>,
        dimensionality: Dimensionality,
    ) {
        let factory = factory.into();
        let entry = Entry {
            continuous: factory.build_default().is_continuous(),
            factory,
            dimensionality,
        };
        let name = entry.factory.distribution_class_name();
        match self
            .entries
            .iter_mut()
            .find(|e| e.factory.distribution_class_name() == name)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Factory by distribution name (`"Normal"`) or factory name
    /// (`"NormalFactory"`), ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no factory matches.
    pub fn get_by_name(&self, name: &str) -> Result<DistributionFactory> {
        self.entries
            .iter()
            .find(|e| {
                e.factory.distribution_class_name().eq_ignore_ascii_case(name)
                    || e.factory.class_name().eq_ignore_ascii_case(name)
            })
            .map(|e| e.factory.clone())
            .ok_or_else(|| Error::invalid_argument(format!("unknown factory: {name}")))
    }

    /// Distribution names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .map(|e| e.factory.distribution_class_name())
            .collect()
    }

    /// Number of factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn select<P>(&self, predicate: P) -> Vec<DistributionFactory>
    where
        P: Fn(&Entry) -> bool,
    {
        self.entries
            .iter()
            .filter(|e| predicate(e))
            .map(|e| e.factory.clone())
            .collect()
    }

    /// Factories of continuous univariate families.
    #[must_use]
    pub fn continuous_univariate(&self) -> Vec<DistributionFactory> {
        self.select(|e| e.continuous && e.dimensionality.univariate())
    }

    /// Factories of continuous multivariate families.
    #[must_use]
    pub fn continuous_multivariate(&self) -> Vec<DistributionFactory> {
        self.select(|e| e.continuous && e.dimensionality.multivariate())
    }

    /// Factories of discrete univariate families.
    #[must_use]
    pub fn discrete_univariate(&self) -> Vec<DistributionFactory> {
        self.select(|e| !e.continuous && e.dimensionality.univariate())
    }

    /// Factories of discrete multivariate families.
    #[must_use]
    pub fn discrete_multivariate(&self) -> Vec<DistributionFactory> {
        self.select(|e| !e.continuous && e.dimensionality.multivariate())
    }

    /// Factories of univariate families.
    #[must_use]
    pub fn univariate(&self) -> Vec<DistributionFactory> {
        self.select(|e| e.dimensionality.univariate())
    }

    /// Factories of multivariate families.
    #[must_use]
    pub fn multivariate(&self) -> Vec<DistributionFactory> {
        self.select(|e| e.dimensionality.multivariate())
    }
}
