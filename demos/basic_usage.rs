//! Basic usage example for the uqcore library.
//!
//! This example fits a distribution to observed data, queries the fitted
//! model, samples it with two experiments, checks normality and saves the
//! model to JSON.

use uqcore::prelude::*;

fn main() -> Result<()> {
    println!("uqcore - Basic Usage Example\n");

    // Observed data: skewed measurements
    let mut rng = RandomGenerator::with_seed(2024);
    let truth = LogNormal::new(0.5, 0.3, 2.0)?;
    let observed = truth.get_sample(2000, &mut rng)?;
    println!("Observed {} points, mean {}", observed.size(), observed.compute_mean()?);
    println!();

    // Fit every continuous univariate family of the registry
    println!("Fitting continuous univariate families...");
    let registry = FactoryRegistry::with_defaults();
    for factory in registry.continuous_univariate() {
        match factory.build(&observed) {
            Ok(fitted) => {
                let q99 = fitted.compute_scalar_quantile(0.99)?;
                println!(
                    "  {:<16} 99% quantile {:>8.4}  ({})",
                    fitted.class_name(),
                    q99,
                    fitted
                );
            }
            Err(error) => println!("  {:<16} failed: {error}", factory.distribution_class_name()),
        }
    }
    println!();

    // Parameter uncertainty by bootstrap
    let estimate = LogNormalFactory::default().build_estimate_with(&observed, &mut rng)?;
    println!("LogNormal fit: {}", estimate.distribution());
    println!(
        "  parameter standard deviations: {}",
        estimate.parameter_standard_deviation()
    );
    println!();

    // Is the data normal?
    let ad = NormalityTest::anderson_darling_normal(&observed, 0.95)?;
    let cvm = NormalityTest::cramer_von_mises_normal(&observed, 0.95)?;
    println!("Anderson-Darling: {ad}");
    println!("Cramer-von Mises: {cvm}");
    println!();

    // Designs around the fitted median
    let fitted = estimate.distribution().clone();
    let median = fitted.compute_quantile(0.5)?;
    let spread = fitted.get_standard_deviation()?[0];
    let composite = Composite::new(median, Point::from_vec(vec![spread, 2.0 * spread]))?;
    println!("Composite design ({} points):", composite.size());
    println!("{}", composite.generate_from(&mut rng)?);

    let lhs = LHSExperiment::new(fitted.clone(), 10)?;
    let (points, weights) = lhs.generate_with_weights_from(&mut rng)?;
    println!("Latin hypercube ({} points, weight {}):", points.size(), weights[0]);
    println!("{points}");

    // Save and reload the fitted model
    let json = fitted.to_advocate()?.to_json()?;
    println!("Saved model: {json}");
    let restored = Distribution::load(&Advocate::from_json(&json)?)?;
    assert_eq!(restored.to_string(), fitted.to_string());
    println!("✓ Reloaded model matches");

    Ok(())
}
