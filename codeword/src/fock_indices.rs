//! Photon-number index tuples consistent with a codeword hypothesis.
//!
//! A mode carrying the reference symbol is expected to read zero photons; every other mode may
//! read any nonzero count below the cutoff. The probability of a hypothesis is therefore the sum
//! of the Fock probabilities over the Cartesian product of `{1, .., cutoff - 1}` taken over the
//! non-reference modes. Summing a single representative index instead undercounts the
//! hypothesis.
//!
//! The result is materialised: a hypothesis with `m` non-reference modes yields `(cutoff - 1)^m`
//! tuples.

use itertools::Itertools;

use crate::codeword::Codeword;
use crate::enumerate::all_codewords_from;
use crate::error::CodewordError;

/// One photon count per mode.
pub type FockIndex = Vec<usize>;

/// A hypothesis together with every Fock index whose probability mass belongs to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CodewordIndices {
    pub codeword: Codeword,
    pub indices: Vec<FockIndex>,
}

/// Enumerate the Fock indices whose probabilities add up to `codeword`'s probability.
///
/// # Errors
///
/// Returns [`CodewordError::CutoffTooSmall`] when the codeword has more modes than the cutoff
/// dimension.
///
/// # Examples
///
/// ```
/// use codeword::{fock_indices, Codeword};
///
/// let codeword = Codeword::new(vec![0.7, -0.7], 0.7).unwrap();
/// let indices = fock_indices(&codeword, 3).unwrap();
/// assert_eq!(indices, vec![vec![0, 1], vec![0, 2]]);
/// ```
pub fn fock_indices(codeword: &Codeword, cutoff_dim: usize) -> Result<Vec<FockIndex>, CodewordError> {
    check_cutoff(codeword, cutoff_dim)?;
    Ok(indices_unchecked(codeword, cutoff_dim))
}

/// Fock indices for both hypotheses derived from `codeword`, in enumerator order.
///
/// # Errors
///
/// Returns [`CodewordError::CutoffTooSmall`] when the codeword has more modes than the cutoff
/// dimension.
pub fn fock_indices_for_all_codewords(
    codeword: &Codeword,
    cutoff_dim: usize,
) -> Result<Vec<CodewordIndices>, CodewordError> {
    check_cutoff(codeword, cutoff_dim)?;
    Ok(all_codewords_from(codeword)
        .into_iter()
        .map(|hypothesis| CodewordIndices {
            indices: indices_unchecked(&hypothesis, cutoff_dim),
            codeword: hypothesis,
        })
        .collect())
}

fn check_cutoff(codeword: &Codeword, cutoff_dim: usize) -> Result<(), CodewordError> {
    if codeword.size() > cutoff_dim {
        return Err(CodewordError::CutoffTooSmall {
            size: codeword.size(),
            cutoff: cutoff_dim,
        });
    }
    Ok(())
}

#[allow(clippy::cast_sign_loss)]
fn indices_unchecked(codeword: &Codeword, cutoff_dim: usize) -> Vec<FockIndex> {
    let minus_count = codeword.number_minus_alphas();
    if minus_count == 0 {
        return vec![vec![0; codeword.size()]];
    }

    // Reference positions hold 0; the -1 sentinels are all overwritten below.
    let scaffold: FockIndex = codeword.zero_list().into_iter().map(|mark| mark.max(0) as usize).collect();
    let minus_indices = codeword.minus_indices();

    itertools::repeat_n(1..cutoff_dim, minus_count)
        .multi_cartesian_product()
        .map(|photon_counts| {
            let mut index = scaffold.clone();
            for (&position, photons) in minus_indices.iter().zip(photon_counts) {
                index[position] = photons;
            }
            index
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_reference_word_maps_to_vacuum() {
        let codeword = Codeword::reference(4, 0.7).unwrap();
        assert_eq!(fock_indices(&codeword, 4).unwrap(), vec![vec![0, 0, 0, 0]]);
    }

    #[test]
    fn single_minus_mode_spans_every_nonzero_count() {
        let codeword = Codeword::new(vec![-0.7], 0.7).unwrap();
        let indices = fock_indices(&codeword, 5).unwrap();
        assert_eq!(indices, vec![vec![1], vec![2], vec![3], vec![4]]);
    }

    #[test]
    fn reference_positions_stay_at_zero_photons() {
        let codeword = Codeword::new(vec![-1.0, 1.0, -1.0], 1.0).unwrap();
        let indices = fock_indices(&codeword, 4).unwrap();
        assert_eq!(indices.len(), 9);
        for index in &indices {
            assert_eq!(index[1], 0);
            assert!(index[0] >= 1 && index[0] < 4);
            assert!(index[2] >= 1 && index[2] < 4);
        }
    }

    #[test]
    fn cutoff_of_one_leaves_no_nonzero_counts() {
        let codeword = Codeword::new(vec![-0.7], 0.7).unwrap();
        assert!(fock_indices(&codeword, 1).unwrap().is_empty());
    }

    #[test]
    fn cutoff_smaller_than_size_is_rejected() {
        let codeword = Codeword::reference(12, 0.7).unwrap();
        assert_eq!(
            fock_indices(&codeword, 10),
            Err(CodewordError::CutoffTooSmall { size: 12, cutoff: 10 })
        );
        assert!(fock_indices_for_all_codewords(&codeword, 10).is_err());
    }

    #[test]
    fn all_codewords_pairs_reference_with_complement() {
        let codeword = Codeword::reference(2, 0.7).unwrap();
        let all = fock_indices_for_all_codewords(&codeword, 3).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].codeword, codeword);
        assert_eq!(all[0].indices, vec![vec![0, 0]]);
        assert_eq!(all[1].codeword, codeword.complement());
        assert_eq!(all[1].indices.len(), 4);
    }
}
