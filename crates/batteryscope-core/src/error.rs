use std::num::ParseFloatError;

use thiserror::Error;

/// Failure to build a [`TestResult`](crate::result::TestResult).
#[derive(Error, Debug)]
pub enum AggregateError {
    /// Caller defect: results are built from at least one test.
    #[error("bug: cannot build a result from an empty test collection")]
    EmptyTests,

    /// A line of a generic p-value block is not a number.
    #[error("{object_info}: malformed p-value {text:?} in block {block}, line {line}")]
    MalformedPValue {
        object_info: String,
        /// 1-based index of the p-value block.
        block: usize,
        /// 1-based line within the block.
        line: usize,
        text: String,
        #[source]
        source: ParseFloatError,
    },
}
