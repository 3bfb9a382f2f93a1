//! Captured console output of one battery run.
//!
//! An [`OutputRecord`] accumulates standard output and standard error as the
//! external process reader hands it over. Warning and error lines are only
//! ever detected in standard output; standard error is kept for diagnostics.
//! Detection runs lazily on first access and is cached until the next append.

use std::cell::OnceCell;

use serde::Serialize;
use serde::ser::SerializeStruct;

const WARNING_TOKEN: &str = "warning";
const ERROR_TOKEN: &str = "error";

/// Lines of standard output classified as warnings and errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Detection {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Detection {
    /// Full rescan of `text`, split on `\n` only (a trailing `\r` stays on
    /// the line). A line may be both a warning and an error.
    fn scan(text: &str) -> Self {
        let mut detection = Self::default();
        for line in text.split_terminator('\n') {
            let lower = line.to_ascii_lowercase();
            if lower.contains(WARNING_TOKEN) {
                detection.warnings.push(line.to_string());
            }
            if lower.contains(ERROR_TOKEN) {
                detection.errors.push(line.to_string());
            }
        }
        detection
    }
}

/// Raw standard output and standard error of a single test run.
#[derive(Debug, Clone, Default)]
pub struct OutputRecord {
    standard_output: String,
    standard_error: String,
    /// Empty while detection is stale.
    detection: OnceCell<Detection>,
}

impl OutputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record built from already complete output streams.
    pub fn from_parts(standard_output: impl Into<String>, standard_error: impl Into<String>) -> Self {
        Self {
            standard_output: standard_output.into(),
            standard_error: standard_error.into(),
            detection: OnceCell::new(),
        }
    }

    /// Append to standard output and mark detection stale.
    pub fn append_standard_output(&mut self, text: &str) {
        self.standard_output.push_str(text);
        self.detection.take();
    }

    /// Append raw bytes read from a pipe. Invalid UTF-8 is replaced.
    pub fn append_standard_output_bytes(&mut self, bytes: &[u8]) {
        self.append_standard_output(&String::from_utf8_lossy(bytes));
    }

    /// Append to standard error. Detection state is unaffected.
    pub fn append_standard_error(&mut self, text: &str) {
        self.standard_error.push_str(text);
    }

    pub fn standard_output(&self) -> &str {
        &self.standard_output
    }

    pub fn standard_error(&self) -> &str {
        &self.standard_error
    }

    /// Standard output lines containing "warning" (any case), in order.
    pub fn warnings(&self) -> &[String] {
        &self.detection().warnings
    }

    /// Standard output lines containing "error" (any case), in order.
    pub fn errors(&self) -> &[String] {
        &self.detection().errors
    }

    /// True until warnings or errors are read after the latest append.
    pub fn is_detection_stale(&self) -> bool {
        self.detection.get().is_none()
    }

    fn detection(&self) -> &Detection {
        self.detection
            .get_or_init(|| Detection::scan(&self.standard_output))
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OutputRecord", 4)?;
        state.serialize_field("standard_output", &self.standard_output)?;
        state.serialize_field("standard_error", &self.standard_error)?;
        state.serialize_field("warnings", self.warnings())?;
        state.serialize_field("errors", self.errors())?;
        state.end()
    }
}
