//! Second-level statistics over collections of randomness-test p-values.
//!
//! A statistical test battery run many times over a data source yields one
//! p-value per run. Under the null hypothesis those p-values are uniform on
//! [0, 1], so the collection itself can be tested: [`chi2_uniformity`] bins the
//! values into ten equal-width intervals and returns the chi-square goodness of
//! fit as a p-value, and [`proportion_bounds`] gives the acceptance interval
//! for the share of runs that individually passed.

use std::sync::LazyLock;

use statrs::distribution::{ChiSquared, ContinuousCDF};

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of equal-width bins [0, 1] is split into for the uniformity test.
pub const UNIFORMITY_BINS: usize = 10;

/// Degrees of freedom of the uniformity chi-square (bins - 1).
pub const UNIFORMITY_DEGREES_OF_FREEDOM: f64 = (UNIFORMITY_BINS - 1) as f64;

/// Name reported for the uniformity statistic.
pub const CHI_SQUARE: &str = "Chi-Square";

static UNIFORMITY_DISTRIBUTION: LazyLock<ChiSquared> = LazyLock::new(|| {
    ChiSquared::new(UNIFORMITY_DEGREES_OF_FREEDOM).expect("9 degrees of freedom is a valid chi-square")
});

// ═══════════════════════════════════════════════════════════════════════════════
// Uniformity
// ═══════════════════════════════════════════════════════════════════════════════

/// Count p-values per bin. A value of exactly 1.0 lands in the last bin.
pub fn bin_counts(p_values: &[f64]) -> [usize; UNIFORMITY_BINS] {
    let mut counts = [0usize; UNIFORMITY_BINS];
    for &p in p_values {
        // `as usize` saturates, so negatives and NaN fall into bin 0.
        let bin = ((p * UNIFORMITY_BINS as f64).floor() as usize).min(UNIFORMITY_BINS - 1);
        counts[bin] += 1;
    }
    counts
}

/// Chi-square uniformity p-value of a p-value collection.
///
/// The expected count per bin is `floor(n / 10)`. With fewer than ten values
/// that is zero and the result is defined as `0.0`. Otherwise the chi-square
/// statistic over the ten bins is converted with the survival function of
/// the chi-square distribution with 9 degrees of freedom, which equals the
/// upper regularized incomplete gamma function `Q(4.5, chi2 / 2)`.
///
/// Depends only on the multiset of values, never on their order.
pub fn chi2_uniformity(p_values: &[f64]) -> f64 {
    let expected = p_values.len() / UNIFORMITY_BINS;
    if expected == 0 {
        return 0.0;
    }
    let expected = expected as f64;
    let chi2: f64 = bin_counts(p_values)
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();
    UNIFORMITY_DISTRIBUTION.sf(chi2)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Proportion of passing runs
// ═══════════════════════════════════════════════════════════════════════════════

/// Fraction of p-values at or above `alpha`. Empty input yields 0.0.
pub fn proportion_passing(p_values: &[f64], alpha: f64) -> f64 {
    if p_values.is_empty() {
        return 0.0;
    }
    let passed = p_values.iter().filter(|&&p| p >= alpha).count();
    passed as f64 / p_values.len() as f64
}

/// Acceptable interval for the proportion of passing runs out of `n`.
///
/// `(1 - alpha) ± 3 * sqrt(alpha * (1 - alpha) / n)`, clamped to [0, 1].
/// Returns `None` for `n == 0`.
pub fn proportion_bounds(n: usize, alpha: f64) -> Option<(f64, f64)> {
    if n == 0 {
        return None;
    }
    let p_hat = 1.0 - alpha;
    let margin = 3.0 * (p_hat * alpha / n as f64).sqrt();
    Some(((p_hat - margin).max(0.0), (p_hat + margin).min(1.0)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Verdict helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Assign a letter grade based on p-value.
///
/// - A: p >= 0.1
/// - B: p >= 0.01
/// - C: p >= 0.001
/// - D: p >= 0.0001
/// - F: otherwise or None
pub fn grade_from_p(p: Option<f64>) -> char {
    match p {
        Some(p) if p >= 0.1 => 'A',
        Some(p) if p >= 0.01 => 'B',
        Some(p) if p >= 0.001 => 'C',
        Some(p) if p >= 0.0001 => 'D',
        _ => 'F',
    }
}

/// Determine pass/fail from p-value against a threshold.
pub fn pass_from_p(p: Option<f64>, threshold: f64) -> bool {
    match p {
        Some(p) => p >= threshold,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Values at bin midpoints, `per_bin` of them in each of the ten bins.
    fn evenly_binned(per_bin: usize) -> Vec<f64> {
        let n = per_bin * UNIFORMITY_BINS;
        (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect()
    }

    #[test]
    fn test_bin_counts_one_goes_to_last_bin() {
        let counts = bin_counts(&[0.0, 0.05, 0.95, 1.0]);
        assert_eq!(counts, [2, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_bin_counts_out_of_range_clamped() {
        let counts = bin_counts(&[-0.5, 3.0]);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[UNIFORMITY_BINS - 1], 1);
    }

    #[test]
    fn test_fewer_than_ten_is_zero() {
        assert_eq!(chi2_uniformity(&[]), 0.0);
        assert_eq!(chi2_uniformity(&[0.5]), 0.0);
        assert_eq!(chi2_uniformity(&evenly_binned(1)[..9]), 0.0);
    }

    #[test]
    fn test_perfectly_uniform_is_one() {
        let p = chi2_uniformity(&evenly_binned(10));
        assert!((p - 1.0).abs() < 1e-12, "p = {p}");
    }

    #[test]
    fn test_single_bin_rejected() {
        let values = vec![0.42; 100];
        let p = chi2_uniformity(&values);
        assert!(p < 1e-10, "p = {p}");
    }

    #[test]
    fn test_exact_one_matches_last_bin_value() {
        let mut with_ones = evenly_binned(2);
        let mut with_high = with_ones.clone();
        with_ones.extend([1.0; 5]);
        with_high.extend([0.97; 5]);
        assert_eq!(chi2_uniformity(&with_ones), chi2_uniformity(&with_high));
    }

    #[test]
    fn test_expected_uses_floor() {
        // 19 values -> expected 1 per bin; nine bins hold 2 and one holds 1,
        // so chi2 = 9.
        let mut values = evenly_binned(2);
        values.pop();
        let p = chi2_uniformity(&values);
        let dist = ChiSquared::new(9.0).unwrap();
        assert!((p - dist.sf(9.0)).abs() < 1e-12);
        // Q(4.5, 4.5)
        assert!((p - 0.437274).abs() < 1e-5);
    }

    #[test]
    fn test_proportion_passing() {
        assert_eq!(proportion_passing(&[], 0.01), 0.0);
        assert_eq!(proportion_passing(&[0.5, 0.001, 0.02, 0.01], 0.01), 0.75);
    }

    #[test]
    fn test_proportion_bounds() {
        assert_eq!(proportion_bounds(0, 0.01), None);
        let (lo, hi) = proportion_bounds(100, 0.01).unwrap();
        assert!((lo - 0.960150).abs() < 1e-5, "lo = {lo}");
        assert!((hi - 1.0).abs() < 1e-12, "hi = {hi}");
    }

    #[test]
    fn test_grade_from_p() {
        assert_eq!(grade_from_p(Some(0.5)), 'A');
        assert_eq!(grade_from_p(Some(0.05)), 'B');
        assert_eq!(grade_from_p(Some(0.005)), 'C');
        assert_eq!(grade_from_p(Some(0.0005)), 'D');
        assert_eq!(grade_from_p(Some(0.00000001)), 'F');
        assert_eq!(grade_from_p(None), 'F');
    }

    #[test]
    fn test_pass_from_p() {
        assert!(pass_from_p(Some(0.05), 0.01));
        assert!(!pass_from_p(Some(0.005), 0.01));
        assert!(!pass_from_p(None, 0.01));
    }

    proptest! {
        #[test]
        fn prop_short_collections_are_zero(values in prop::collection::vec(0.0f64..=1.0, 0..10)) {
            prop_assert_eq!(chi2_uniformity(&values), 0.0);
        }

        #[test]
        fn prop_uniformity_in_unit_interval(values in prop::collection::vec(0.0f64..=1.0, 10..300)) {
            let p = chi2_uniformity(&values);
            prop_assert!((0.0..=1.0).contains(&p), "p = {}", p);
        }

        #[test]
        fn prop_uniformity_ignores_order(
            (values, shuffled) in prop::collection::vec(0.0f64..=1.0, 10..300)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            prop_assert_eq!(chi2_uniformity(&values), chi2_uniformity(&shuffled));
        }
    }
}
