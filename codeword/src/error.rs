use thiserror::Error;

/// Errors raised while building codewords or their Fock-basis indices.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodewordError {
    #[error("alpha must be a positive finite number, got {0}")]
    InvalidAlpha(f64),

    #[error("a codeword needs at least one symbol")]
    EmptyWord,

    #[error("symbol {value} at position {index} is neither +{alpha} nor -{alpha}")]
    InvalidSymbol { index: usize, value: f64, alpha: f64 },

    #[error("cutoff dimension must be >= number of modes: cutoff {cutoff}, codeword size {size}")]
    CutoffTooSmall { size: usize, cutoff: usize },
}
