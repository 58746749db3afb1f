// src/core/taxonomy.rs

use crate::constants::META_FILENAME;
use crate::core::meta::MetaData;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised by taxonomy discovery and lookup.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// A filesystem I/O error occurred while scanning the taxonomy root.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The scan could not walk the taxonomy root.
    #[error("Failed to scan taxonomy root: {0}")]
    Scan(#[from] walkdir::Error),
    /// A lookup key has no corresponding project descriptor.
    #[error("Project '{name}' does not exist in the taxonomy (no '{META_FILENAME}' under its directory).")]
    UnknownProject {
        /// The name that was looked up.
        name: String,
    },
}

type TaxonomyResult<T> = Result<T, TaxonomyError>;

/// Enumerates the project names under a taxonomy root: every direct
/// subdirectory is a candidate project module. Performed once at startup; the
/// result is handed to [`Taxonomy::new`] explicitly.
pub fn scan_project_dirs(root: &Path) -> TaxonomyResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        } else {
            log::warn!(
                "Skipping taxonomy entry with a non-UTF-8 name: '{}'",
                entry.path().display()
            );
        }
    }
    names.sort();
    log::debug!("Discovered {} project(s) under '{}'", names.len(), root.display());
    Ok(names)
}

/// The read-only catalog of known reproducible-defect project definitions.
///
/// Built once from an injected list of discovered names; entries are lazily
/// self-loading [`MetaData`] instances. The registry exposes no mutating
/// operations: after construction no key can be added, replaced or removed.
#[derive(Debug)]
pub struct Taxonomy {
    store: BTreeMap<String, Arc<MetaData>>,
}

impl Taxonomy {
    /// Builds the registry from a taxonomy root and the project names
    /// discovered under it. Each entry is constructed eagerly with its name
    /// and path only; descriptor loading stays deferred to first access.
    pub fn new(root: &Path, names: Vec<String>) -> Self {
        let store = names
            .into_iter()
            .map(|name| {
                let path = root.join(&name);
                (name.clone(), Arc::new(MetaData::new(name, path)))
            })
            .collect();
        Self { store }
    }

    /// Scans `root` and builds the registry in one step.
    pub fn discover(root: &Path) -> TaxonomyResult<Self> {
        let names = scan_project_dirs(root)?;
        Ok(Self::new(root, names))
    }

    /// Looks up a project by name. Fails fast when the name is unknown or its
    /// descriptor file is absent, rather than deferring the failure to load
    /// time.
    pub fn get(&self, name: &str) -> TaxonomyResult<Arc<MetaData>> {
        let metadata = self
            .store
            .get(name)
            .ok_or_else(|| TaxonomyError::UnknownProject {
                name: name.to_string(),
            })?;
        if !metadata.descriptor_path().exists() {
            return Err(TaxonomyError::UnknownProject {
                name: name.to_string(),
            });
        }
        Ok(metadata.clone())
    }

    /// Iterates all known project names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.store.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

// MARK: --- UNIT TESTS ---
