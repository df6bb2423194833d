//! Sweep α over every backend with exact probabilities and print the success curves.
//!
//! Set `RUST_LOG=receiver=debug` to follow each optimisation.

use photonic::{BackendKind, MeasuringType};
use receiver::{Csd, CsdConfiguration};
use tracing_subscriber::EnvFilter;

fn main() -> receiver::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let csd = Csd::new(CsdConfiguration {
        steps: 50,
        seed: Some(2024),
        ..CsdConfiguration::default()
    })?;
    let alphas: Vec<f64> = (1..=10).map(|i| f64::from(i) * 0.1).collect();
    let results =
        csd.execute_all_backends_and_measuring_types(&alphas, &BackendKind::ALL, &[MeasuringType::Probabilities])?;

    for result in &results {
        println!("{}", result.plot_label);
        for outcome in &result.outcomes {
            println!(
                "  alpha = {:.2}  p_succ = {:.4}  params = {:?}",
                outcome.alpha, outcome.p_succ, outcome.opt_params
            );
        }
    }

    let helstrom: Vec<f64> = alphas
        .iter()
        .map(|alpha| 0.5 * (1.0 + (1.0 - (-4.0 * alpha * alpha).exp()).sqrt()))
        .collect();
    println!("Helstrom bound: {helstrom:.4?}");
    Ok(())
}
