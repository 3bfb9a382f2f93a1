//! P-value extraction from finished variants.
//!
//! Each [`TestKind`] has its own extraction rule:
//!
//! - **Random excursion / random excursion variant**: the battery prints one
//!   record per run, a block of consecutive lines each reporting the p-value
//!   of one excursion state. A record is matched as a whole against a
//!   multi-line pattern whose lines follow the ascending state order; a record
//!   with a missing, extra or reordered line contributes nothing. Position `i`
//!   of every matched record feeds subtest `i`.
//! - **Generic**: p-values arrive pre-split into one newline-delimited block
//!   per output stream. Each block becomes one subtest, in block and line
//!   order. Blank lines are skipped; any other line that is not a number is an
//!   error.

use std::sync::LazyLock;

use regex::Regex;

use crate::battery::{TestKind, Variant};
use crate::error::AggregateError;

/// P-values grouped per subtest, in subtest order.
pub type SubtestPValues = Vec<Vec<f64>>;

const P_VALUE: &str = r"([01]?\.[0-9]+)";
/// Every record line, the last included, must be newline-terminated so a
/// run cut off mid-number never matches.
const LINE_END: &str = r"[ \t]*\r?\n";

static RANDOM_EXCURSION_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    record_pattern(
        TestKind::RandomExcursion.excursion_states(),
        |x| format!("x = {x:>2}"),
        "p_value",
    )
});

static RANDOM_EXCURSION_VARIANT_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    record_pattern(
        TestKind::RandomExcursionVariant.excursion_states(),
        |x| format!("(x = {x:>2})"),
        "p-value",
    )
});

/// One line per state: `<anything><state label><anything><p label> = <p-value>`.
fn record_pattern(states: &[i32], state_label: fn(i32) -> String, p_label: &str) -> Regex {
    let p_label = regex::escape(p_label);
    let pattern: String = states
        .iter()
        .map(|&x| {
            let label = regex::escape(&state_label(x));
            format!(".*{label}.*{p_label} = {P_VALUE}{LINE_END}")
        })
        .collect();
    Regex::new(&pattern).expect("excursion record pattern compiles")
}

/// Extract the p-values of every subtest of `variant`.
pub fn extract_p_values(variant: &dyn Variant) -> Result<SubtestPValues, AggregateError> {
    let p_values = match variant.kind() {
        TestKind::RandomExcursion => excursion_p_values(
            &RANDOM_EXCURSION_RECORD,
            TestKind::RandomExcursion,
            variant.battery_output().standard_output(),
        ),
        TestKind::RandomExcursionVariant => excursion_p_values(
            &RANDOM_EXCURSION_VARIANT_RECORD,
            TestKind::RandomExcursionVariant,
            variant.battery_output().standard_output(),
        ),
        TestKind::Generic => generic_p_values(variant.p_value_files(), &variant.object_info())?,
    };
    log::debug!(
        "{}: extracted {} subtest(s) as {}",
        variant.object_info(),
        p_values.len(),
        variant.kind()
    );
    Ok(p_values)
}

/// Scan `text` for whole records; the result always has one entry per state.
fn excursion_p_values(record: &Regex, kind: TestKind, text: &str) -> SubtestPValues {
    let count = kind.excursion_states().len();
    let mut subtests = vec![Vec::new(); count];
    for caps in record.captures_iter(text) {
        let values: Option<Vec<f64>> = (1..=count)
            .map(|i| caps.get(i).and_then(|m| m.as_str().parse().ok()))
            .collect();
        let Some(values) = values else {
            continue;
        };
        for (subtest, p) in subtests.iter_mut().zip(values) {
            subtest.push(p);
        }
    }
    subtests
}

fn generic_p_values(blocks: &[String], object_info: &str) -> Result<SubtestPValues, AggregateError> {
    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| parse_block(block, index + 1, object_info))
        .collect()
}

fn parse_block(block: &str, block_number: usize, object_info: &str) -> Result<Vec<f64>, AggregateError> {
    let mut values = Vec::new();
    for (index, line) in block.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let p = text
            .parse::<f64>()
            .map_err(|source| AggregateError::MalformedPValue {
                object_info: object_info.to_string(),
                block: block_number,
                line: index + 1,
                text: text.to_string(),
                source,
            })?;
        values.push(p);
    }
    Ok(values)
}
