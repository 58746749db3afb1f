// src/core/meta.rs

use crate::constants::{MAKE_JOB_PLACEHOLDER, MAKE_JOBS_ENV, META_FILENAME, PATCH_DIR};
use crate::models::{
    Common, Defect, Gcov, MetaContents, MetaInfo, RawCommon, RawDefect, RawInfo, RawInvocation,
    RawMeta, TestType,
};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised while materializing a project descriptor into its records.
#[derive(Error, Debug)]
pub enum MetaError {
    /// The descriptor file could not be read.
    #[error("Failed to read descriptor '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The descriptor file is not valid JSON.
    #[error("Descriptor '{path}' is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A required descriptor field is absent. Carries the field name and the
    /// record that was being constructed when the absence was detected.
    #[error("Missing required field '{field}' while building {record}")]
    MissingField {
        field: &'static str,
        record: &'static str,
    },
    /// The `test-type` string maps to no known harness family.
    #[error("Unrecognized test type '{value}' (expected one of: automake, ctest, gtest)")]
    UnknownTestType { value: String },
    /// A command vector came out empty after placeholder substitution.
    #[error("Field '{field}' resolved to an empty command vector")]
    EmptyCommand { field: &'static str },
}

type MetaResult<T> = Result<T, MetaError>;

/// One project's entry in the taxonomy: a name, a definition directory, and a
/// lazily loaded descriptor.
///
/// Construction is cheap and never touches the filesystem. The descriptor is
/// read on the first [`load`](Self::load) and cached for the lifetime of the
/// instance; a failed load caches nothing, so a later call retries the file.
/// The latch is a mutex, so concurrent first accesses perform exactly one read
/// and every caller observes the same cached value.
#[derive(Debug)]
pub struct MetaData {
    name: String,
    path: PathBuf,
    contents: Mutex<Option<Arc<MetaContents>>>,
}

impl MetaData {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            contents: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The project's definition directory inside the taxonomy root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `meta.json` descriptor this instance materializes from.
    pub fn descriptor_path(&self) -> PathBuf {
        self.path.join(META_FILENAME)
    }

    /// The Dockerfile describing the project's build/test container.
    pub fn dockerfile(&self) -> PathBuf {
        self.path.join("Dockerfile")
    }

    /// Reads, validates and caches the descriptor. Idempotent: repeat calls
    /// after the first success return the cached contents without touching the
    /// filesystem again.
    pub fn load(&self) -> MetaResult<Arc<MetaContents>> {
        // A poisoned latch means a previous load panicked mid-write; there is
        // no consistent state to recover to.
        let mut slot = self.contents.lock().expect("descriptor latch poisoned");
        if let Some(contents) = &*slot {
            return Ok(contents.clone());
        }

        log::debug!(
            "Loading descriptor for project '{}' from '{}'",
            self.name,
            self.descriptor_path().display()
        );
        let raw = read_descriptor(&self.descriptor_path())?;
        let contents = Arc::new(build_contents(&self.path, raw, &resolved_make_jobs())?);

        *slot = Some(contents.clone());
        Ok(contents)
    }
}

// --- Descriptor materialization ---

fn read_descriptor(path: &Path) -> MetaResult<RawMeta> {
    let bytes = fs::read(path).map_err(|e| MetaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| MetaError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Promotes the raw document to the validated records. All three sections are
/// built before anything is returned, so a failure in any of them leaves no
/// partial state behind.
fn build_contents(project_path: &Path, raw: RawMeta, jobs: &str) -> MetaResult<MetaContents> {
    let info = build_info(raw.info)?;
    let common = build_common(raw.common, jobs)?;
    let defects = build_defects(project_path, raw.defects)?;
    Ok(MetaContents {
        info,
        common,
        defects,
    })
}

fn build_info(raw: Option<RawInfo>) -> MetaResult<MetaInfo> {
    let raw = required(raw, "info", "MetaInfo")?;
    Ok(MetaInfo {
        url: required(raw.url, "url", "MetaInfo")?,
        description: required(raw.short_desc, "short-desc", "MetaInfo")?,
        vcs: required(raw.vcs, "vcs", "MetaInfo")?,
    })
}

fn build_common(raw: Option<RawCommon>, jobs: &str) -> MetaResult<Common> {
    let raw = required(raw, "common", "Common")?;

    let test_type_raw = required(raw.test_type, "test-type", "Common")?;
    let test_type = TestType::from_descriptor(&test_type_raw)
        .ok_or(MetaError::UnknownTestType { value: test_type_raw })?;

    let raw_gcov = required(raw.gcov, "gcov", "Common")?;
    let gcov = Gcov {
        exclude: required(raw_gcov.exclude, "gcov.exclude", "Common")?,
        command: required(raw_gcov.command, "gcov.command", "Common")?,
    };

    Ok(Common {
        build_command: command_vector(raw.build, "build", jobs)?,
        build_coverage_command: command_vector(raw.build_coverage, "build-coverage", jobs)?,
        test_type,
        test_command: command_vector(raw.test, "test", jobs)?,
        test_coverage_command: command_vector(raw.test_coverage, "test-coverage", jobs)?,
        gcov,
    })
}

fn build_defects(project_path: &Path, raw: Option<Vec<RawDefect>>) -> MetaResult<Vec<Defect>> {
    let raw = required(raw, "defects", "Defect")?;
    raw.into_iter()
        .map(|defect| {
            let index = required(defect.patch, "patch", "Defect")?;
            let (buggy_patch, split_patch) = derive_patch_pair(project_path, index);
            Ok(Defect {
                hash: required(defect.hash, "hash", "Defect")?,
                buggy_patch,
                split_patch,
                cases: required(defect.cases, "cases", "Defect")?,
            })
        })
        .collect()
}

/// Extracts one `{ "command": [...] }` section, applies job-token substitution
/// and enforces the non-empty invariant.
fn command_vector(
    raw: Option<RawInvocation>,
    field: &'static str,
    jobs: &str,
) -> MetaResult<Vec<String>> {
    let invocation = required(raw, field, "Common")?;
    let command = substitute_job_tokens(required(invocation.command, field, "Common")?, jobs);
    if command.is_empty() {
        return Err(MetaError::EmptyCommand { field });
    }
    Ok(command)
}

fn required<T>(value: Option<T>, field: &'static str, record: &'static str) -> MetaResult<T> {
    value.ok_or(MetaError::MissingField { field, record })
}

/// Replaces every occurrence of the reserved job token inside the vector's
/// tokens (the token may be embedded, e.g. `-j@MAKE_JOB@`).
fn substitute_job_tokens(command: Vec<String>, jobs: &str) -> Vec<String> {
    command
        .into_iter()
        .map(|token| token.replace(MAKE_JOB_PLACEHOLDER, jobs))
        .collect()
}

/// Derives the patch artifact pair for a 1-based defect index, zero-padded to
/// 4 digits and rooted at the project's `patch/` subdirectory.
pub(crate) fn derive_patch_pair(project_path: &Path, index: u32) -> (PathBuf, PathBuf) {
    let patch_dir = project_path.join(PATCH_DIR);
    (
        patch_dir.join(format!("{index:04}-buggy.patch")),
        patch_dir.join(format!("{index:04}-split.patch")),
    )
}

lazy_static! {
    static ref MAKE_JOBS: Mutex<Option<String>> = Mutex::new(None);
}

/// Returns the parallelism value substituted for the reserved job token.
///
/// Resolved once per process: the override env var wins, otherwise the
/// machine's available parallelism. Every descriptor loaded in this process
/// sees the same value.
fn resolved_make_jobs() -> String {
    let mut cached = MAKE_JOBS.lock().expect("make jobs cache poisoned");
    if let Some(value) = &*cached {
        return value.clone();
    }

    let value = std::env::var(MAKE_JOBS_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .to_string()
        });

    log::debug!("Resolved make jobs value: {}", value);
    *cached = Some(value.clone());
    value
}

// MARK: --- UNIT TESTS ---
