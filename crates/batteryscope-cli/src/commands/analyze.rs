use std::path::Path;

use batteryscope_core::{TestResult, VariantResult};
use batteryscope_stats::{grade_from_p, pass_from_p};

use crate::manifest::{group_by_logic_name, load_manifest};

pub struct AnalyzeCommandConfig<'a> {
    pub manifest_path: &'a str,
    pub output_path: Option<&'a str>,
    pub policy_path: Option<&'a str>,
}

/// Summary line of one variant.
#[derive(Debug, Clone, PartialEq)]
struct VariantRow {
    object_info: String,
    subtests: usize,
    min_uniformity: Option<f64>,
    warnings: usize,
    errors: usize,
}

impl VariantRow {
    fn from_result(variant: &VariantResult) -> Self {
        let min_uniformity = variant
            .p_value_sets()
            .map(|set| set.uniformity_p_value())
            .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |m| m.min(p))));
        Self {
            object_info: variant.object_info().to_string(),
            subtests: variant.sub_test_results().len(),
            min_uniformity,
            warnings: variant.battery_output().warnings().len(),
            errors: variant.battery_output().errors().len(),
        }
    }

    fn uniformity_cell(&self) -> String {
        match self.min_uniformity {
            Some(p) => format!("{p:.6} {}", grade_from_p(Some(p))),
            None => "-".to_string(),
        }
    }

    /// "ok" when the weakest set clears `alpha`; a row without sets fails.
    fn uniformity_verdict(&self, alpha: f64) -> &'static str {
        if pass_from_p(self.min_uniformity, alpha) { "ok" } else { "low" }
    }
}

pub fn run(cfg: AnalyzeCommandConfig<'_>) {
    let manifest_path = Path::new(cfg.manifest_path);
    let manifest = match load_manifest(manifest_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to read manifest {}: {e}", cfg.manifest_path);
            std::process::exit(1);
        }
    };

    let policy = match cfg.policy_path {
        Some(path) => match super::load_policy(Path::new(path)) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to read policy {path}: {e}");
                std::process::exit(1);
            }
        },
        None => manifest.policy,
    };

    let base_dir = manifest_path.parent().unwrap_or(Path::new("."));
    let tests = match manifest.load_tests(base_dir) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to load captured output: {e}");
            std::process::exit(1);
        }
    };
    if tests.is_empty() {
        eprintln!("Manifest lists no tests.");
        std::process::exit(1);
    }

    let groups = group_by_logic_name(tests);
    log::info!("aggregating {} test group(s)", groups.len());

    println!(
        "{:<24} {:<30} {:>8} {:>12} {:>5} {:>5} {:>5}",
        "Test", "Variant", "Subtests", "Min unif.", "Unif.", "Warn", "Err"
    );
    println!("{}", "-".repeat(95));

    let mut results = Vec::with_capacity(groups.len());
    for (name, group) in &groups {
        let result = match TestResult::build_with_policy(group, &policy) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{name}: {e}");
                std::process::exit(1);
            }
        };
        for variant in result.variant_results() {
            let row = VariantRow::from_result(variant);
            println!(
                "{:<24} {:<30} {:>8} {:>12} {:>5} {:>5} {:>5}",
                super::truncate(name, 24),
                super::truncate(&row.object_info, 30),
                row.subtests,
                row.uniformity_cell(),
                row.uniformity_verdict(policy.uniformity_alpha),
                row.warnings,
                row.errors
            );
        }
        results.push(result);
    }

    println!("\n{}", "=".repeat(40));
    for result in &results {
        let verdict = if result.passed() { "PASS" } else { "FAIL" };
        println!("{:<32} {verdict}", super::truncate(result.logic_name(), 32));
    }
    let passed = results.iter().filter(|r| r.passed()).count();
    println!("{passed}/{} test(s) passed", results.len());

    if let Some(path) = cfg.output_path {
        let json = match serde_json::to_string_pretty(&results) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("Failed to serialize results: {e}");
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(path, json) {
            eprintln!("Failed to write results to {path}: {e}");
        } else {
            println!("\nResults saved to: {path}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batteryscope_core::{OutputRecord, PValueSet, SubTestResult, UserSettings};

    fn uniform(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect()
    }

    #[test]
    fn test_row_takes_minimum_uniformity() {
        let variant = VariantResult::new(
            "serial #1",
            vec![
                SubTestResult::new(vec![PValueSet::chi_square(uniform(20))]),
                SubTestResult::new(vec![PValueSet::new("Chi-Square", 0.02, vec![0.5])]),
            ],
            UserSettings::new(),
            OutputRecord::from_parts("warning: a\nerror: b\n", ""),
        );
        let row = VariantRow::from_result(&variant);
        assert_eq!(row.subtests, 2);
        assert_eq!(row.min_uniformity, Some(0.02));
        assert_eq!(row.warnings, 1);
        assert_eq!(row.errors, 1);
        assert_eq!(row.uniformity_cell(), "0.020000 B");
        assert_eq!(row.uniformity_verdict(0.01), "ok");
        assert_eq!(row.uniformity_verdict(0.05), "low");
    }

    #[test]
    fn test_row_without_subtests() {
        let variant = VariantResult::new("empty", Vec::new(), UserSettings::new(), OutputRecord::new());
        let row = VariantRow::from_result(&variant);
        assert_eq!(row.min_uniformity, None);
        assert_eq!(row.uniformity_cell(), "-");
        assert_eq!(row.uniformity_verdict(0.0), "low");
    }
}
