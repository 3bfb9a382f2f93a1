pub mod analyze;
pub mod classify;

use std::io;
use std::path::Path;

use batteryscope_core::ThresholdPolicy;
use serde_json::{Map, Value};

use crate::manifest::policy_from_object;

/// Load a pass policy override from a JSON object. Missing fields keep their
/// defaults.
pub fn load_policy(path: &Path) -> io::Result<ThresholdPolicy> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str::<Map<String, Value>>(&raw)
        .and_then(policy_from_object)
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse policy JSON: {e}"),
            )
        })
}

/// Shorten `s` to at most `width` characters, marking the cut with `…`.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}
