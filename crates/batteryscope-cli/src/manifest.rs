//! JSON run manifest describing already-captured battery runs.
//!
//! ```json
//! {
//!   "policy": { "uniformity_alpha": 0.0001 },
//!   "tests": [
//!     {
//!       "test_id": 12,
//!       "variants": [
//!         { "object_info": "excursions, 1e6 bits", "stdout": "run12.log",
//!           "settings": { "stream-size": "1000000" } }
//!       ]
//!     },
//!     {
//!       "test_id": 1,
//!       "logic_name": "Frequency",
//!       "variants": [ { "p_value_files": ["freq/data1.txt"] } ]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use batteryscope_core::{
    LogFacade, Logger, OutputRecord, Test, ThresholdPolicy, UserSettings, Variant, test_name,
};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "deserialize_policy")]
    pub policy: ThresholdPolicy,
    pub tests: Vec<TestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TestEntry {
    pub test_id: u32,
    #[serde(default)]
    pub logic_name: Option<String>,
    #[serde(default)]
    pub variants: Vec<VariantEntry>,
}

#[derive(Debug, Deserialize)]
pub struct VariantEntry {
    #[serde(default)]
    pub object_info: Option<String>,
    #[serde(default)]
    pub stdout: Option<PathBuf>,
    #[serde(default)]
    pub stderr: Option<PathBuf>,
    #[serde(default)]
    pub p_value_files: Vec<PathBuf>,
    #[serde(default)]
    pub settings: UserSettings,
}

/// Load and parse a manifest from disk.
pub fn load_manifest(path: &Path) -> io::Result<Manifest> {
    let raw = std::fs::read_to_string(path)?;
    parse_manifest(&raw)
}

pub fn parse_manifest(raw: &str) -> io::Result<Manifest> {
    serde_json::from_str::<Manifest>(raw).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed to parse manifest JSON: {e}"),
        )
    })
}

/// Build a policy from a JSON object. Absent fields keep their defaults.
pub fn policy_from_object(object: Map<String, Value>) -> serde_json::Result<ThresholdPolicy> {
    serde_json::from_value(Value::Object(object))
}

// Only an object is accepted; a bare struct deserialize would also take a
// positional array.
fn deserialize_policy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ThresholdPolicy, D::Error> {
    let object = Map::<String, Value>::deserialize(deserializer)?;
    policy_from_object(object).map_err(serde::de::Error::custom)
}

impl Manifest {
    /// Read every referenced file into memory.
    pub fn load_tests(&self, base_dir: &Path) -> io::Result<Vec<LoadedTest>> {
        let logger: Arc<dyn Logger> = Arc::new(LogFacade);
        self.tests
            .iter()
            .map(|entry| LoadedTest::load(entry, base_dir, Arc::clone(&logger)))
            .collect()
    }
}

fn read_text(base_dir: &Path, path: &Path) -> io::Result<String> {
    let full = base_dir.join(path);
    let bytes = std::fs::read(&full)
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", full.display())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ---------------------------------------------------------------------------
// File-backed collaborators
// ---------------------------------------------------------------------------

pub struct LoadedVariant {
    test_id: u32,
    object_info: String,
    output: OutputRecord,
    p_value_files: Vec<String>,
    settings: UserSettings,
}

impl LoadedVariant {
    fn load(test_id: u32, default_info: String, entry: &VariantEntry, base_dir: &Path) -> io::Result<Self> {
        let mut output = OutputRecord::new();
        if let Some(path) = &entry.stdout {
            output.append_standard_output(&read_text(base_dir, path)?);
        }
        if let Some(path) = &entry.stderr {
            output.append_standard_error(&read_text(base_dir, path)?);
        }
        let p_value_files = entry
            .p_value_files
            .iter()
            .map(|path| read_text(base_dir, path))
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            test_id,
            object_info: entry.object_info.clone().unwrap_or(default_info),
            output,
            p_value_files,
            settings: entry.settings.clone(),
        })
    }
}

impl Variant for LoadedVariant {
    fn test_id(&self) -> u32 {
        self.test_id
    }

    fn battery_output(&self) -> &OutputRecord {
        &self.output
    }

    fn p_value_files(&self) -> &[String] {
        &self.p_value_files
    }

    fn user_settings(&self) -> &UserSettings {
        &self.settings
    }

    fn object_info(&self) -> String {
        self.object_info.clone()
    }
}

pub struct LoadedTest {
    logic_name: String,
    variants: Vec<LoadedVariant>,
    logger: Arc<dyn Logger>,
}

impl LoadedTest {
    fn load(entry: &TestEntry, base_dir: &Path, logger: Arc<dyn Logger>) -> io::Result<Self> {
        let logic_name = entry.logic_name.clone().unwrap_or_else(|| {
            test_name(entry.test_id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Test {}", entry.test_id))
        });
        let variants = entry
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let default_info = format!("{logic_name} #{}", i + 1);
                LoadedVariant::load(entry.test_id, default_info, v, base_dir)
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            logic_name,
            variants,
            logger,
        })
    }
}

impl Test for LoadedTest {
    fn variants(&self) -> Vec<&dyn Variant> {
        self.variants.iter().map(|v| v as &dyn Variant).collect()
    }

    fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }

    fn logic_name(&self) -> &str {
        &self.logic_name
    }
}

/// Group tests sharing a logic name, in order of first appearance.
pub fn group_by_logic_name(tests: Vec<LoadedTest>) -> Vec<(String, Vec<LoadedTest>)> {
    let mut groups: Vec<(String, Vec<LoadedTest>)> = Vec::new();
    for test in tests {
        match groups.iter_mut().find(|(name, _)| *name == test.logic_name) {
            Some((_, members)) => members.push(test),
            None => groups.push((test.logic_name.clone(), vec![test])),
        }
    }
    groups
}
