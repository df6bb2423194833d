//! Photon-number statistics of a displaced squeezed mode on every backend.

use photonic::{
    Architecture, Backend, BackendKind, BackendOptions, Bindings, Circuit, Dual, MeasuringType, PhotonicError,
    Simulator,
};

const CUTOFF: usize = 6;
const SHOTS: usize = 2_000;

fn main() -> Result<(), PhotonicError> {
    let architecture = Architecture {
        squeezing: true,
        ..Architecture::default()
    };
    let values = [0.9, -0.4, 0.25];

    for kind in BackendKind::ALL {
        let options = BackendOptions {
            cutoff_dim: CUTOFF,
            seed: Some(7),
        };
        let mut simulator = Simulator::new(kind, options)?;

        let exact = Circuit::new(&architecture, MeasuringType::Probabilities)?;
        let bindings = bind(&exact, &values);
        let output = simulator.run(&exact, &bindings, 0)?;
        simulator.reset();
        let Some(state) = output.state() else {
            return Ok(());
        };

        let sampling = Circuit::new(&architecture, MeasuringType::Sampling)?;
        let output = simulator.run(&sampling, &bind(&sampling, &values), SHOTS)?;
        simulator.reset();
        let mut counts = vec![0usize; CUTOFF + 1];
        for sample in output.samples().unwrap_or_default() {
            counts[sample[0].min(CUTOFF)] += 1;
        }

        println!("{kind} (trace {:.6})", state.trace().value());
        for (photons, count) in counts.iter().enumerate().take(CUTOFF) {
            println!(
                "  n = {photons}: exact {:.4}  sampled {:.4}",
                state.fock_prob(&[photons]).value(),
                *count as f64 / SHOTS as f64
            );
        }
        if counts[CUTOFF] > 0 {
            println!("  n >= {CUTOFF}: sampled {}", counts[CUTOFF]);
        }
    }
    Ok(())
}

fn bind(circuit: &Circuit, values: &[f64]) -> Bindings {
    circuit
        .parameter_names()
        .iter()
        .cloned()
        .zip(values.iter().map(|&value| Dual::constant(value)))
        .collect()
}
