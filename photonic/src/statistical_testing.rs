//! Shot-noise margins shared by the photon-counting tests.

/// Relative margin for runs of 100 000 shots or more.
pub const LARGE_RUN_MARGIN: f64 = 0.05;

/// Relative margin for shorter runs and for outcomes far out in the tail.
pub const SMALL_RUN_MARGIN: f64 = 0.10;

#[allow(clippy::cast_precision_loss)]
fn relative_deviation(count: usize, shots: usize, probability: f64) -> f64 {
    (count as f64 / (shots as f64 * probability) - 1.0).abs()
}

/// Checks that `count` of `shots` readings landed on an outcome of the given probability.
///
/// # Panics
///
/// When `count / shots` is more than `margin` (relative) away from `probability`.
pub fn assert_outcome_rate(count: usize, shots: usize, probability: f64, margin: f64, label: &str) {
    let deviation = relative_deviation(count, shots, probability);
    assert!(
        deviation < margin,
        "{label}: {count}/{shots} readings is {:.1}% away from p = {probability:.4}",
        deviation * 100.0
    );
}

/// Checks a photon-number histogram bin by bin against its distribution.
///
/// # Panics
///
/// On the first bin outside `margin`.
pub fn assert_histogram(counts: &[usize], probabilities: &[f64], margin: f64, label: &str) {
    let shots = counts.iter().sum();
    for (photons, (&count, &probability)) in counts.iter().zip(probabilities).enumerate() {
        let deviation = relative_deviation(count, shots, probability);
        assert!(
            deviation < margin,
            "{label}: n = {photons} seen {count}/{shots} times, {:.1}% away from p = {probability:.4}",
            deviation * 100.0
        );
    }
}
