use crate::codeword::Codeword;

/// All hypotheses the receiver has to tell apart for a given reference pattern.
///
/// The decision is binary: either `codeword` itself or its total inversion was sent. The order
/// is fixed, `[codeword, codeword.complement()]`, so the reference wins exact ties downstream.
#[must_use]
pub fn all_codewords_from(codeword: &Codeword) -> [Codeword; 2] {
    [codeword.clone(), codeword.complement()]
}
