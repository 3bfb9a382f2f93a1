//! Result tree built from finished battery runs.
//!
//! ```text
//! TestResult ─┬─ VariantResult ─┬─ SubTestResult ── PValueSet
//!             │                 └─ SubTestResult ── PValueSet
//!             └─ VariantResult ── ...
//! ```
//!
//! [`TestResult::build`] walks every variant of every test in input order,
//! extracts per-subtest p-values, and turns each non-empty collection into a
//! [`PValueSet`] carrying the chi-square uniformity p-value. Subtests without
//! any p-value are reported through the test's [`Logger`] and left out of the
//! tree; an absent subtest means "no evidence", never a zero score.

use std::fmt;
use std::sync::Arc;

use batteryscope_stats::{CHI_SQUARE, chi2_uniformity, proportion_passing};
use serde::Serialize;

use crate::battery::{Logger, Test, UserSettings};
use crate::error::AggregateError;
use crate::extract::extract_p_values;
use crate::output::OutputRecord;
use crate::policy::{PassPolicy, ThresholdPolicy};

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

/// One subtest's p-values and the uniformity statistic computed over them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PValueSet {
    statistic_name: String,
    uniformity_p_value: f64,
    raw_p_values: Vec<f64>,
}

impl PValueSet {
    pub fn new(statistic_name: impl Into<String>, uniformity_p_value: f64, raw_p_values: Vec<f64>) -> Self {
        Self {
            statistic_name: statistic_name.into(),
            uniformity_p_value,
            raw_p_values,
        }
    }

    /// Set whose statistic is the chi-square uniformity of `raw_p_values`.
    pub fn chi_square(raw_p_values: Vec<f64>) -> Self {
        let uniformity = chi2_uniformity(&raw_p_values);
        Self::new(CHI_SQUARE, uniformity, raw_p_values)
    }

    pub fn statistic_name(&self) -> &str {
        &self.statistic_name
    }

    pub fn uniformity_p_value(&self) -> f64 {
        self.uniformity_p_value
    }

    pub fn raw_p_values(&self) -> &[f64] {
        &self.raw_p_values
    }

    /// Share of raw p-values at or above `alpha`.
    pub fn proportion_passed(&self, alpha: f64) -> f64 {
        proportion_passing(&self.raw_p_values, alpha)
    }
}

/// Results of one subtest (one excursion state or one output stream).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTestResult {
    p_value_sets: Vec<PValueSet>,
}

impl SubTestResult {
    pub fn new(p_value_sets: Vec<PValueSet>) -> Self {
        Self { p_value_sets }
    }

    pub fn p_value_sets(&self) -> &[PValueSet] {
        &self.p_value_sets
    }
}

/// Everything one variant of a test produced.
#[derive(Debug, Clone, Serialize)]
pub struct VariantResult {
    object_info: String,
    sub_test_results: Vec<SubTestResult>,
    user_settings: UserSettings,
    battery_output: OutputRecord,
}

impl VariantResult {
    pub fn new(
        object_info: impl Into<String>,
        sub_test_results: Vec<SubTestResult>,
        user_settings: UserSettings,
        battery_output: OutputRecord,
    ) -> Self {
        Self {
            object_info: object_info.into(),
            sub_test_results,
            user_settings,
            battery_output,
        }
    }

    pub fn object_info(&self) -> &str {
        &self.object_info
    }

    pub fn sub_test_results(&self) -> &[SubTestResult] {
        &self.sub_test_results
    }

    pub fn user_settings(&self) -> &UserSettings {
        &self.user_settings
    }

    pub fn battery_output(&self) -> &OutputRecord {
        &self.battery_output
    }

    /// All p-value sets of this variant, in subtest order.
    pub fn p_value_sets(&self) -> impl Iterator<Item = &PValueSet> {
        self.sub_test_results
            .iter()
            .flat_map(|s| s.p_value_sets().iter())
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Aggregated result of one logical test over all its variants.
#[derive(Clone, Serialize)]
pub struct TestResult {
    #[serde(skip)]
    logger: Arc<dyn Logger>,
    logic_name: String,
    variant_results: Vec<VariantResult>,
    passed: bool,
}

impl TestResult {
    /// Build with the default [`ThresholdPolicy`].
    pub fn build<T: Test>(tests: &[T]) -> Result<Self, AggregateError> {
        Self::build_with_policy(tests, &ThresholdPolicy::default())
    }

    /// Build from every variant of every test, in input order.
    ///
    /// All tests are expected to share one logical identity; the logger and
    /// logic name are taken from the first. Fails with
    /// [`AggregateError::EmptyTests`] for an empty slice and with
    /// [`AggregateError::MalformedPValue`] when a generic p-value block holds
    /// a non-numeric line.
    pub fn build_with_policy<T: Test>(
        tests: &[T],
        policy: &dyn PassPolicy,
    ) -> Result<Self, AggregateError> {
        let first = tests.first().ok_or(AggregateError::EmptyTests)?;
        let logger = first.logger();
        let logic_name = first.logic_name().to_string();

        let mut variant_results = Vec::new();
        for test in tests {
            for variant in test.variants() {
                let object_info = variant.object_info();
                let mut sub_test_results = Vec::new();
                for p_values in extract_p_values(variant)? {
                    if p_values.is_empty() {
                        logger.warn(&format!("{object_info}: no p-values extracted in subtest"));
                        continue;
                    }
                    sub_test_results.push(SubTestResult::new(vec![PValueSet::chi_square(p_values)]));
                }
                variant_results.push(VariantResult::new(
                    object_info,
                    sub_test_results,
                    variant.user_settings().clone(),
                    variant.battery_output().clone(),
                ));
            }
        }

        let passed = policy.evaluate(&variant_results);
        log::debug!(
            "{logic_name}: {} variant result(s), passed = {passed}",
            variant_results.len()
        );
        Ok(Self {
            logger,
            logic_name,
            variant_results,
            passed,
        })
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn logic_name(&self) -> &str {
        &self.logic_name
    }

    /// Identity of the last variant visited while building.
    pub fn object_info(&self) -> Option<&str> {
        self.variant_results.last().map(VariantResult::object_info)
    }

    pub fn variant_results(&self) -> &[VariantResult] {
        &self.variant_results
    }

    /// Overall verdict of the pass policy, fixed at build time.
    pub fn passed(&self) -> bool {
        self.passed
    }
}

impl fmt::Debug for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResult")
            .field("logic_name", &self.logic_name)
            .field("variant_results", &self.variant_results)
            .field("passed", &self.passed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chi_square_set() {
        let set = PValueSet::chi_square(vec![0.1, 0.5, 0.9]);
        assert_eq!(set.statistic_name(), "Chi-Square");
        assert_eq!(set.uniformity_p_value(), 0.0);
        assert_eq!(set.raw_p_values(), [0.1, 0.5, 0.9]);
    }

    #[test]
    fn test_proportion_passed() {
        let set = PValueSet::chi_square(vec![0.5, 0.005, 0.2, 0.9]);
        assert_eq!(set.proportion_passed(0.01), 0.75);
    }

    #[test]
    fn test_variant_p_value_sets_flatten() {
        let variant = VariantResult::new(
            "v",
            vec![
                SubTestResult::new(vec![PValueSet::chi_square(vec![0.1])]),
                SubTestResult::new(vec![PValueSet::chi_square(vec![0.2])]),
            ],
            UserSettings::new(),
            OutputRecord::new(),
        );
        let raw: Vec<f64> = variant.p_value_sets().map(|s| s.raw_p_values()[0]).collect();
        assert_eq!(raw, vec![0.1, 0.2]);
    }
}
