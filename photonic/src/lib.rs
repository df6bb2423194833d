pub mod architecture;
pub mod circuit;
pub mod dual;
pub mod error;
pub mod sampling;
pub mod simulator;
pub mod state;
#[cfg(test)]
pub(crate) mod statistical_testing;

pub use architecture::{Architecture, BackendKind, MeasuringType};
pub use circuit::{Bindings, Circuit, ModeId, Operation, Program};
pub use dual::Dual;
pub use error::PhotonicError;
pub use simulator::{BackendOptions, ExecutionContext, RunOutput, Sample, Simulator};
pub use state::{FockState, ModeState};

/// An engine that executes receiver circuits.
///
/// A backend holds the effects of its last run until [`Backend::reset`] is called; running
/// again before that fails with [`PhotonicError::DirtyContext`].
pub trait Backend {
    fn kind(&self) -> BackendKind;
    fn cutoff_dim(&self) -> usize;

    fn is_dirty(&self) -> bool;
    fn reset(&mut self);

    /// Execute `circuit` with `bindings`.
    ///
    /// With `shots == 0` the output is the final [`FockState`]; otherwise one [`Sample`] per
    /// shot, which requires the circuit to measure.
    ///
    /// # Errors
    ///
    /// [`PhotonicError::DirtyContext`] if the backend was not reset since its last run,
    /// [`PhotonicError::NoMeasurement`] for shots without a measurement, and
    /// [`PhotonicError::MissingParameter`] for an unbound parameter.
    fn run(&mut self, circuit: &Circuit, bindings: &Bindings, shots: usize) -> Result<RunOutput, PhotonicError>;

    fn is_differentiable(&self) -> bool {
        self.kind().is_differentiable()
    }
}
