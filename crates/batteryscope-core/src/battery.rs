//! Read-only view of finished battery runs.
//!
//! The orchestration layer that launched the test executables implements
//! [`Test`] and [`Variant`]; the aggregator only reads through them. Every
//! accessor the aggregator needs lives on the traits themselves, so no
//! implementation ever has to be downcast.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::output::OutputRecord;

/// Opaque user-supplied settings of a variant (for example block length).
pub type UserSettings = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Test kinds
// ---------------------------------------------------------------------------

/// How a variant's p-values are laid out in its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    /// Eight labeled p-values per run, one per excursion state -4..=4 (no 0).
    RandomExcursion,
    /// Eighteen labeled p-values per run, one per excursion state -9..=9 (no 0).
    RandomExcursionVariant,
    /// One p-value per line, pre-split into one block per output stream.
    Generic,
}

impl TestKind {
    pub const RANDOM_EXCURSION_ID: u32 = 12;
    pub const RANDOM_EXCURSION_VARIANT_ID: u32 = 13;

    pub fn from_test_id(test_id: u32) -> Self {
        match test_id {
            Self::RANDOM_EXCURSION_ID => Self::RandomExcursion,
            Self::RANDOM_EXCURSION_VARIANT_ID => Self::RandomExcursionVariant,
            _ => Self::Generic,
        }
    }

    /// Excursion states reported per run, in subtest order.
    pub fn excursion_states(&self) -> &'static [i32] {
        match self {
            Self::RandomExcursion => &[-4, -3, -2, -1, 1, 2, 3, 4],
            Self::RandomExcursionVariant => &[
                -9, -8, -7, -6, -5, -4, -3, -2, -1, 1, 2, 3, 4, 5, 6, 7, 8, 9,
            ],
            Self::Generic => &[],
        }
    }

    /// Fixed number of subtests, or `None` when it follows the stream count.
    pub fn subtest_count(&self) -> Option<usize> {
        match self {
            Self::Generic => None,
            excursion => Some(excursion.excursion_states().len()),
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RandomExcursion => write!(f, "random_excursion"),
            Self::RandomExcursionVariant => write!(f, "random_excursion_variant"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Name of a NIST STS test by its numeric id.
pub fn test_name(test_id: u32) -> Option<&'static str> {
    let name = match test_id {
        1 => "Frequency",
        2 => "Block Frequency",
        3 => "Cumulative Sums",
        4 => "Runs",
        5 => "Longest Run of Ones",
        6 => "Binary Matrix Rank",
        7 => "Discrete Fourier Transform",
        8 => "Non-overlapping Template Matching",
        9 => "Overlapping Template Matching",
        10 => "Maurer's Universal Statistical",
        11 => "Approximate Entropy",
        12 => "Random Excursions",
        13 => "Random Excursions Variant",
        14 => "Serial",
        15 => "Linear Complexity",
        _ => return None,
    };
    Some(name)
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Sink for recoverable conditions found while aggregating.
pub trait Logger: Send + Sync {
    fn warn(&self, message: &str);
}

/// Forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }
}

/// One parameterization of a test and everything its run produced.
pub trait Variant {
    /// Numeric test id (12 and 13 select the excursion layouts).
    fn test_id(&self) -> u32;

    fn kind(&self) -> TestKind {
        TestKind::from_test_id(self.test_id())
    }

    /// Captured console output of the run.
    fn battery_output(&self) -> &OutputRecord;

    /// Newline-delimited p-value blocks, one per output stream.
    /// Only read for [`TestKind::Generic`].
    fn p_value_files(&self) -> &[String];

    fn user_settings(&self) -> &UserSettings;

    /// Human-readable identity used in diagnostics.
    fn object_info(&self) -> String;
}

/// A named statistical test run under one or more variants.
pub trait Test {
    fn variants(&self) -> Vec<&dyn Variant>;
    fn logger(&self) -> Arc<dyn Logger>;
    fn logic_name(&self) -> &str;
}

impl<T: Test + ?Sized> Test for &T {
    fn variants(&self) -> Vec<&dyn Variant> {
        (**self).variants()
    }

    fn logger(&self) -> Arc<dyn Logger> {
        (**self).logger()
    }

    fn logic_name(&self) -> &str {
        (**self).logic_name()
    }
}

impl<T: Test + ?Sized> Test for Box<T> {
    fn variants(&self) -> Vec<&dyn Variant> {
        (**self).variants()
    }

    fn logger(&self) -> Arc<dyn Logger> {
        (**self).logger()
    }

    fn logic_name(&self) -> &str {
        (**self).logic_name()
    }
}
