use core::fmt;

use rand::Rng;

use crate::error::CodewordError;

pub const DEFAULT_ALPHA: f64 = 0.7;
pub const DEFAULT_WORD_SIZE: usize = 10;

/// Sentinel used by [`Codeword::zero_list`] for positions that do not carry the reference symbol.
const NON_REFERENCE_MARK: i32 = -1;

/// A transmitted signal: one `+alpha` or `-alpha` amplitude per mode.
///
/// `+alpha` is the reference symbol. A codeword is immutable once built; derived views such as
/// [`minus_indices`](Self::minus_indices) are computed on demand.
///
/// Equality only looks at the amplitudes, so two codewords built from the same word compare equal.
///
/// # Examples
///
/// ```
/// use codeword::Codeword;
///
/// let codeword = Codeword::new(vec![0.5, -0.5, 0.5], 0.5).unwrap();
/// assert_eq!(codeword.number_minus_alphas(), 1);
/// assert_eq!(codeword.minus_indices(), vec![1]);
/// assert_eq!(codeword.complement().word(), &[-0.5, 0.5, -0.5]);
/// ```
#[derive(Debug, Clone)]
pub struct Codeword {
    word: Vec<f64>,
    alpha: f64,
}

impl Codeword {
    /// Build a codeword from explicit amplitudes.
    ///
    /// # Errors
    ///
    /// Fails when `alpha` is not a positive finite number, when `word` is empty, or when an
    /// element is not exactly `alpha` or `-alpha`.
    #[allow(clippy::float_cmp)]
    pub fn new(word: Vec<f64>, alpha: f64) -> Result<Self, CodewordError> {
        validate_alpha(alpha)?;
        if word.is_empty() {
            return Err(CodewordError::EmptyWord);
        }
        if let Some((index, &value)) = word
            .iter()
            .enumerate()
            .find(|(_, value)| **value != alpha && **value != -alpha)
        {
            return Err(CodewordError::InvalidSymbol { index, value, alpha });
        }
        Ok(Codeword { word, alpha })
    }

    /// Draw each of the `size` symbols uniformly from `{+alpha, -alpha}`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid `alpha` or a zero `size`.
    pub fn random<R: Rng>(size: usize, alpha: f64, rng: &mut R) -> Result<Self, CodewordError> {
        validate_alpha(alpha)?;
        let word = (0..size)
            .map(|_| if rng.gen::<bool>() { alpha } else { -alpha })
            .collect();
        Codeword::new(word, alpha)
    }

    /// The all-`+alpha` codeword of the given size.
    ///
    /// # Errors
    ///
    /// Fails on an invalid `alpha` or a zero `size`.
    pub fn reference(size: usize, alpha: f64) -> Result<Self, CodewordError> {
        Codeword::new(vec![alpha; size], alpha)
    }

    #[must_use]
    pub fn word(&self) -> &[f64] {
        &self.word
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.word.len()
    }

    /// Number of reference (`+alpha`) symbols.
    #[must_use]
    pub fn number_alphas(&self) -> usize {
        self.reference_positions().filter(|&is_reference| is_reference).count()
    }

    /// Number of symbols that differ from the reference symbol.
    #[must_use]
    pub fn number_minus_alphas(&self) -> usize {
        self.size() - self.number_alphas()
    }

    /// `0` where the symbol is `+alpha` and `-1` everywhere else.
    ///
    /// This is the scaffold the Fock-index generator fills in: zero positions stay at zero
    /// photons, the sentinel positions receive a nonzero photon count.
    #[must_use]
    pub fn zero_list(&self) -> Vec<i32> {
        self.reference_positions()
            .map(|is_reference| if is_reference { 0 } else { NON_REFERENCE_MARK })
            .collect()
    }

    /// Positions holding `-alpha`, in increasing order.
    #[must_use]
    pub fn minus_indices(&self) -> Vec<usize> {
        self.reference_positions()
            .enumerate()
            .filter_map(|(index, is_reference)| (!is_reference).then_some(index))
            .collect()
    }

    /// The codeword with every symbol's sign flipped.
    #[must_use]
    pub fn complement(&self) -> Self {
        Codeword {
            word: self.word.iter().map(|value| -value).collect(),
            alpha: self.alpha,
        }
    }

    /// True when every symbol is the reference symbol.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.number_minus_alphas() == 0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.word.clone()
    }

    #[allow(clippy::float_cmp)]
    fn reference_positions(&self) -> impl Iterator<Item = bool> + '_ {
        self.word.iter().map(move |&value| value == self.alpha)
    }
}

fn validate_alpha(alpha: f64) -> Result<(), CodewordError> {
    if alpha.is_finite() && alpha > 0.0 {
        Ok(())
    } else {
        Err(CodewordError::InvalidAlpha(alpha))
    }
}

impl PartialEq for Codeword {
    fn eq(&self, other: &Self) -> bool {
        self.word == other.word
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        for (index, value) in self.word.iter().enumerate() {
            if index > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{value:+.2}")?;
        }
        write!(formatter, "]")
    }
}

/// A codeword hypothesis together with the probability that it was the transmitted one.
///
/// `P` is `f64` for plain numbers; the receiver uses a gradient-carrying scalar instead.
#[derive(Debug, Clone, PartialEq)]
pub struct CodewordSuccessProbability<P = f64> {
    pub codeword: Codeword,
    pub success_probability: P,
}

impl CodewordSuccessProbability<f64> {
    #[must_use]
    pub fn error_probability(&self) -> f64 {
        1.0 - self.success_probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn views_follow_the_word() {
        let codeword = Codeword::new(vec![0.7, -0.7, -0.7, 0.7], 0.7).unwrap();
        assert_eq!(codeword.size(), 4);
        assert_eq!(codeword.number_alphas(), 2);
        assert_eq!(codeword.number_minus_alphas(), 2);
        assert_eq!(codeword.zero_list(), vec![0, -1, -1, 0]);
        assert_eq!(codeword.minus_indices(), vec![1, 2]);
        assert!(!codeword.is_reference());
        assert_eq!(codeword.to_vec(), vec![0.7, -0.7, -0.7, 0.7]);
        assert_eq!(codeword.complement().to_vec(), vec![-0.7, 0.7, 0.7, -0.7]);
    }

    #[test]
    fn rejects_foreign_symbols() {
        let error = Codeword::new(vec![0.7, 0.3], 0.7).unwrap_err();
        assert_eq!(
            error,
            CodewordError::InvalidSymbol {
                index: 1,
                value: 0.3,
                alpha: 0.7
            }
        );
    }

    #[test]
    fn rejects_bad_alpha_and_empty_word() {
        assert_eq!(Codeword::new(vec![0.0], 0.0), Err(CodewordError::InvalidAlpha(0.0)));
        assert!(matches!(
            Codeword::new(vec![], f64::NAN),
            Err(CodewordError::InvalidAlpha(_))
        ));
        assert_eq!(Codeword::new(vec![], 0.7), Err(CodewordError::EmptyWord));
        assert_eq!(Codeword::reference(0, 0.7), Err(CodewordError::EmptyWord));
    }

    #[test]
    fn random_words_only_contain_plus_and_minus_alpha() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            let codeword = Codeword::random(DEFAULT_WORD_SIZE, DEFAULT_ALPHA, &mut rng).unwrap();
            assert_eq!(codeword.size(), DEFAULT_WORD_SIZE);
            assert_eq!(codeword.number_alphas() + codeword.number_minus_alphas(), DEFAULT_WORD_SIZE);
        }
    }

    #[test]
    fn equality_ignores_nothing_but_the_word() {
        let left = Codeword::reference(3, 0.5).unwrap();
        let right = Codeword::new(vec![0.5, 0.5, 0.5], 0.5).unwrap();
        assert_eq!(left, right);
        assert_ne!(left, left.complement());
    }

    #[test]
    fn display_uses_signed_amplitudes() {
        let codeword = Codeword::new(vec![0.7, -0.7], 0.7).unwrap();
        assert_eq!(codeword.to_string(), "[+0.70, -0.70]");
    }

    #[test]
    fn error_probability_complements_success() {
        let scored = CodewordSuccessProbability {
            codeword: Codeword::reference(1, 0.7).unwrap(),
            success_probability: 0.75,
        };
        assert!((scored.error_probability() - 0.25).abs() < 1e-12);
    }
}
