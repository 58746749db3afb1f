// src/models.rs

use serde::Deserialize;
use std::path::PathBuf;

// --- PUBLIC RECORD TYPES ---
// These are the validated, immutable records the rest of the crate works with.
// They are produced from the raw descriptor models below by the loader in
// `core::meta`; nothing outside the loader constructs them from user input.

/// The test harness family a project drives its suite with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestType {
    Automake,
    CTest,
    GoogleTest,
}

impl TestType {
    /// Maps the raw descriptor string to a variant. Unrecognized strings are
    /// rejected by the loader with a typed error.
    pub fn from_descriptor(raw: &str) -> Option<Self> {
        match raw {
            "automake" => Some(Self::Automake),
            "ctest" => Some(Self::CTest),
            "gtest" => Some(Self::GoogleTest),
            _ => None,
        }
    }
}

/// Coverage tooling configuration. Owned exclusively by [`Common`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gcov {
    /// Path globs excluded from coverage collection.
    pub exclude: Vec<String>,
    /// The report invocation run inside the container.
    pub command: Vec<String>,
}

/// Per-project build and test configuration, independent of any specific defect.
///
/// Invariant: every command vector is non-empty after placeholder substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Common {
    pub build_command: Vec<String>,
    pub build_coverage_command: Vec<String>,
    pub test_type: TestType,
    pub test_command: Vec<String>,
    pub test_coverage_command: Vec<String>,
    pub gcov: Gcov,
}

/// One reproducible historical bug instance.
///
/// The patch paths are derived from the defect's numeric index, never supplied
/// by the descriptor directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defect {
    /// VCS revision identifier of the buggy state.
    pub hash: String,
    pub buggy_patch: PathBuf,
    pub split_patch: PathBuf,
    /// Number of test cases distinguishing buggy from fixed behavior.
    pub cases: u32,
}

/// Descriptive record for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaInfo {
    pub url: String,
    pub description: String,
    /// Version control system identifier (e.g. "git").
    pub vcs: String,
}

/// The three lazily loaded sections of a project descriptor. Loaded and cached
/// as a unit: either all three populate or the load fails and nothing is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaContents {
    pub info: MetaInfo,
    pub common: Common,
    pub defects: Vec<Defect>,
}

// --- RAW DESCRIPTOR MODELS (What is read from `meta.json`) ---
// Private to the crate and only used by the loader. Every field is optional so
// that a missing key surfaces as a typed validation error naming the field,
// instead of an opaque deserialization failure.

#[derive(Deserialize, Debug, Default)]
pub(crate) struct RawMeta {
    pub(crate) info: Option<RawInfo>,
    pub(crate) common: Option<RawCommon>,
    pub(crate) defects: Option<Vec<RawDefect>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RawInfo {
    pub(crate) url: Option<String>,
    #[serde(rename = "short-desc")]
    pub(crate) short_desc: Option<String>,
    pub(crate) vcs: Option<String>,
}

/// A `{ "command": [...] }` table, shared by the build/test sections.
#[derive(Deserialize, Debug)]
pub(crate) struct RawInvocation {
    pub(crate) command: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RawCommon {
    pub(crate) build: Option<RawInvocation>,
    #[serde(rename = "build-coverage")]
    pub(crate) build_coverage: Option<RawInvocation>,
    #[serde(rename = "test-type")]
    pub(crate) test_type: Option<String>,
    pub(crate) test: Option<RawInvocation>,
    #[serde(rename = "test-coverage")]
    pub(crate) test_coverage: Option<RawInvocation>,
    pub(crate) gcov: Option<RawGcov>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RawGcov {
    pub(crate) exclude: Option<Vec<String>>,
    pub(crate) command: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RawDefect {
    pub(crate) hash: Option<String>,
    /// 1-based patch index the patch file pair is derived from.
    pub(crate) patch: Option<u32>,
    pub(crate) cases: Option<u32>,
}
