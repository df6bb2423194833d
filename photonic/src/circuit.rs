//! Receiver circuits: a named-parameter program built from an [`Architecture`].

use smallvec::SmallVec;

use crate::architecture::{Architecture, MeasuringType};
use crate::dual::Dual;
use crate::error::PhotonicError;

pub type ModeId = usize;

/// A single gate or measurement in a [`Program`].
///
/// Gates refer to their argument by parameter name; values are supplied at run time through
/// [`Bindings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Prepare the coherent state `|parameter⟩` on `mode`.
    Coherent { mode: ModeId, parameter: String },
    Displace { mode: ModeId, parameter: String },
    Squeeze { mode: ModeId, parameter: String },
    /// Count photons on every listed mode.
    MeasureFock { modes: SmallVec<[ModeId; 4]> },
}

impl Operation {
    /// The parameter this operation reads, if any.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Operation::Coherent { parameter, .. }
            | Operation::Displace { parameter, .. }
            | Operation::Squeeze { parameter, .. } => Some(parameter),
            Operation::MeasureFock { .. } => None,
        }
    }

    #[must_use]
    pub fn modes(&self) -> SmallVec<[ModeId; 4]> {
        match self {
            Operation::Coherent { mode, .. } | Operation::Displace { mode, .. } | Operation::Squeeze { mode, .. } => {
                SmallVec::from_slice(&[*mode])
            }
            Operation::MeasureFock { modes } => modes.clone(),
        }
    }
}

/// An ordered list of operations over a fixed number of modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct Program {
    mode_count: usize,
    operations: Vec<Operation>,
}

impl Program {
    pub fn new(mode_count: usize) -> Self {
        Program {
            mode_count,
            operations: Vec::new(),
        }
    }

    pub fn with_capacity(mode_count: usize, capacity: usize) -> Self {
        Program {
            mode_count,
            operations: Vec::with_capacity(capacity),
        }
    }

    /// # Panics
    ///
    /// Debug-asserts that every mode touched by `operation` exists.
    pub fn push(&mut self, operation: Operation) {
        debug_assert!(
            operation.modes().iter().all(|&mode| mode < self.mode_count),
            "{operation:?} touches a mode outside 0..{}",
            self.mode_count
        );
        self.operations.push(operation);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    #[must_use]
    pub fn mode_count(&self) -> usize {
        self.mode_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// True when the program ends in a photon-counting measurement.
    #[must_use]
    pub fn measures(&self) -> bool {
        self.operations
            .iter()
            .any(|operation| matches!(operation, Operation::MeasureFock { .. }))
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// A receiver circuit: coherent input preparation followed by layers of tunable gates.
///
/// Parameters are ordered as `alpha_{mode}` for every mode, then `beta_{layer}_{mode}` and
/// `r_{layer}_{mode}` for each layer and mode, depending on which gates the architecture
/// enables.
///
/// ```
/// use photonic::{Architecture, Circuit, MeasuringType};
///
/// let architecture = Architecture { squeezing: true, ..Architecture::default() };
/// let circuit = Circuit::new(&architecture, MeasuringType::Probabilities).unwrap();
/// assert_eq!(circuit.parameter_names(), ["alpha_0", "beta_0_0", "r_0_0"]);
/// assert_eq!(circuit.tunable_parameter_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Circuit {
    architecture: Architecture,
    measuring_type: MeasuringType,
    program: Program,
    parameter_names: Vec<String>,
}

impl Circuit {
    /// # Errors
    ///
    /// Returns [`PhotonicError::UnsupportedArchitecture`] for zero modes or layers, and for an
    /// interferometer spanning more than one mode.
    pub fn new(architecture: &Architecture, measuring_type: MeasuringType) -> Result<Self, PhotonicError> {
        let modes = architecture.number_modes;
        let layers = architecture.number_layers;
        if modes == 0 || layers == 0 {
            return Err(PhotonicError::UnsupportedArchitecture(format!(
                "{modes} modes and {layers} layers, both must be at least 1"
            )));
        }
        if architecture.interferometer && modes > 1 {
            return Err(PhotonicError::UnsupportedArchitecture(format!(
                "interferometer across {modes} modes"
            )));
        }

        let gates_per_layer = usize::from(architecture.displacement) + usize::from(architecture.squeezing);
        let mut program = Program::with_capacity(modes, modes * (1 + layers * gates_per_layer) + 1);
        let mut parameter_names = Vec::with_capacity(modes * (1 + layers * gates_per_layer));

        for mode in 0..modes {
            let parameter = format!("alpha_{mode}");
            parameter_names.push(parameter.clone());
            program.push(Operation::Coherent { mode, parameter });
        }
        for layer in 0..layers {
            for mode in 0..modes {
                if architecture.displacement {
                    let parameter = format!("beta_{layer}_{mode}");
                    parameter_names.push(parameter.clone());
                    program.push(Operation::Displace { mode, parameter });
                }
                if architecture.squeezing {
                    let parameter = format!("r_{layer}_{mode}");
                    parameter_names.push(parameter.clone());
                    program.push(Operation::Squeeze { mode, parameter });
                }
            }
        }
        if measuring_type == MeasuringType::Sampling {
            program.push(Operation::MeasureFock {
                modes: (0..modes).collect(),
            });
        }

        Ok(Circuit {
            architecture: *architecture,
            measuring_type,
            program,
            parameter_names,
        })
    }

    #[must_use]
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    #[must_use]
    pub fn measuring_type(&self) -> MeasuringType {
        self.measuring_type
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Number of leading parameters fed by the input codeword.
    #[must_use]
    pub fn input_parameter_count(&self) -> usize {
        self.architecture.number_modes
    }

    #[must_use]
    pub fn tunable_parameter_count(&self) -> usize {
        self.parameter_names.len() - self.input_parameter_count()
    }
}

/// Values for the named parameters of a circuit, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: Vec<(String, Dual)>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Bindings::default()
    }

    /// Bind `name`, replacing any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: Dual) {
        let name = name.into();
        match self.values.iter_mut().find(|(bound, _)| *bound == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dual> {
        self.values.iter().find(|(bound, _)| bound == name).map(|(_, value)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dual)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<S: Into<String>> FromIterator<(S, Dual)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (S, Dual)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}
