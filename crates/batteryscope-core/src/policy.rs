//! Overall pass/fail evaluation of a built result.

use batteryscope_stats::proportion_bounds;
use serde::{Deserialize, Serialize};

use crate::result::{PValueSet, VariantResult};

/// Uniformity p-value below which a p-value set is rejected.
pub const DEFAULT_UNIFORMITY_ALPHA: f64 = 0.0001;
/// Significance level a single run's p-value is compared against.
pub const DEFAULT_PROPORTION_ALPHA: f64 = 0.01;

/// Decides the overall verdict once every variant has been aggregated.
pub trait PassPolicy {
    fn evaluate(&self, variants: &[VariantResult]) -> bool;
}

/// Every p-value set must look uniform and have enough passing runs.
///
/// A result without any p-value set does not pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdPolicy {
    pub uniformity_alpha: f64,
    pub proportion_alpha: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            uniformity_alpha: DEFAULT_UNIFORMITY_ALPHA,
            proportion_alpha: DEFAULT_PROPORTION_ALPHA,
        }
    }
}

impl ThresholdPolicy {
    pub fn set_passed(&self, set: &PValueSet) -> bool {
        if set.uniformity_p_value() < self.uniformity_alpha {
            return false;
        }
        match proportion_bounds(set.raw_p_values().len(), self.proportion_alpha) {
            Some((lower, _)) => set.proportion_passed(self.proportion_alpha) >= lower,
            None => false,
        }
    }
}

impl PassPolicy for ThresholdPolicy {
    fn evaluate(&self, variants: &[VariantResult]) -> bool {
        let mut sets = variants.iter().flat_map(VariantResult::p_value_sets).peekable();
        sets.peek().is_some() && sets.all(|set| self.set_passed(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::UserSettings;
    use crate::output::OutputRecord;
    use crate::result::SubTestResult;

    fn uniform(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect()
    }

    fn variant(sets: Vec<PValueSet>) -> VariantResult {
        VariantResult::new(
            "variant",
            sets.into_iter().map(|s| SubTestResult::new(vec![s])).collect(),
            UserSettings::new(),
            OutputRecord::new(),
        )
    }

    #[test]
    fn test_uniform_set_passes() {
        let policy = ThresholdPolicy::default();
        assert!(policy.evaluate(&[variant(vec![PValueSet::chi_square(uniform(100))])]));
    }

    #[test]
    fn test_no_evidence_fails() {
        let policy = ThresholdPolicy::default();
        assert!(!policy.evaluate(&[]));
        assert!(!policy.evaluate(&[variant(Vec::new())]));
    }

    #[test]
    fn test_skewed_set_fails() {
        let policy = ThresholdPolicy::default();
        let skewed = PValueSet::chi_square(vec![0.001; 100]);
        assert!(!policy.set_passed(&skewed));
        let good = PValueSet::chi_square(uniform(100));
        assert!(!policy.evaluate(&[variant(vec![good, skewed])]));
    }

    #[test]
    fn test_too_few_values_fail_uniformity() {
        let policy = ThresholdPolicy::default();
        assert!(!policy.set_passed(&PValueSet::chi_square(vec![0.5; 5])));
    }

    #[test]
    fn test_low_proportion_fails() {
        // Uniformity ignored; 20 of 100 runs below alpha.
        let policy = ThresholdPolicy {
            uniformity_alpha: 0.0,
            proportion_alpha: 0.01,
        };
        let mut values = uniform(80);
        values.extend([0.001; 20]);
        assert!(!policy.set_passed(&PValueSet::chi_square(values)));
    }

    #[test]
    fn test_policy_deserialize_defaults() {
        let policy: ThresholdPolicy = serde_json::from_str(r#"{"uniformity_alpha": 0.001}"#).unwrap();
        assert_eq!(policy.uniformity_alpha, 0.001);
        assert_eq!(policy.proportion_alpha, DEFAULT_PROPORTION_ALPHA);
    }

    #[test]
    fn test_policy_rejects_unknown_fields() {
        let parsed = serde_json::from_str::<ThresholdPolicy>(r#"{"uniformity_alpa": 0.001}"#);
        assert!(parsed.is_err());
    }
}
