//! # batteryscope-core
//!
//! Turns the raw console output of external statistical randomness-test
//! batteries into structured, comparable results.
//!
//! ## Quick Start
//!
//! ```no_run
//! use batteryscope_core::{TestResult, Test};
//!
//! fn summarize<T: Test>(group: &[T]) -> Result<(), batteryscope_core::AggregateError> {
//!     let result = TestResult::build(group)?;
//!     for variant in result.variant_results() {
//!         for set in variant.p_value_sets() {
//!             println!("{}: uniformity p = {:.6}", variant.object_info(), set.uniformity_p_value());
//!         }
//!     }
//!     println!("{} passed: {}", result.logic_name(), result.passed());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Battery run → [`OutputRecord`] (warnings/errors) → p-value extraction per
//! [`TestKind`] → chi-square uniformity → [`TestResult`] tree → pass policy
//!
//! The orchestration layer (process execution, configuration, reporting)
//! lives outside this crate and is seen only through the [`Test`] and
//! [`Variant`] traits.

pub mod battery;
pub mod error;
pub mod extract;
pub mod output;
pub mod policy;
pub mod result;

pub use battery::{LogFacade, Logger, Test, TestKind, UserSettings, Variant, test_name};
pub use error::AggregateError;
pub use extract::{SubtestPValues, extract_p_values};
pub use output::OutputRecord;
pub use policy::{
    DEFAULT_PROPORTION_ALPHA, DEFAULT_UNIFORMITY_ALPHA, PassPolicy, ThresholdPolicy,
};
pub use result::{PValueSet, SubTestResult, TestResult, VariantResult};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
