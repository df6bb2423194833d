//! Coherent-state codewords and the combinatorics built on top of them.
//!
//! A [`Codeword`] is a sequence of `+alpha` / `-alpha` amplitudes, one per optical mode.
//! The receiver only has to decide between a reference codeword and its total inversion,
//! so [`all_codewords_from`] always yields exactly two hypotheses. [`fock_indices`] turns a
//! hypothesis into the photon-number index tuples whose probabilities must be summed to
//! score it.

pub mod codeword;
pub mod enumerate;
pub mod error;
pub mod fock_indices;

pub use codeword::{Codeword, CodewordSuccessProbability, DEFAULT_ALPHA, DEFAULT_WORD_SIZE};
pub use enumerate::all_codewords_from;
pub use error::CodewordError;
pub use fock_indices::{fock_indices, fock_indices_for_all_codewords, CodewordIndices, FockIndex};
