// src/core/paths.rs

use crate::constants::TAXONOMY_ROOT_ENV;
use lazy_static::lazy_static;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref TAXONOMY_ROOT: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create taxonomy root at '{path}': {source}")]
    TaxonomyRootCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the taxonomy root directory holding the per-project definitions.
///
/// The `DEFECTLAB_TAXONOMY` environment variable takes precedence; otherwise
/// the root lives under the system config directory
/// (`~/.config/defectlab/taxonomy` on Linux) and is created if absent.
///
/// This function is memoized: the first call computes and caches the path,
/// subsequent calls return the cached value instantly.
pub fn get_taxonomy_root() -> Result<PathBuf, PathError> {
    let mut cached_root_guard = TAXONOMY_ROOT.lock().expect("taxonomy root cache poisoned");

    if let Some(path) = &*cached_root_guard {
        return Ok(path.clone());
    }

    // --- Cache miss: compute the root for the first time ---

    let root = match std::env::var(TAXONOMY_ROOT_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => dirs::config_dir()
            .ok_or(PathError::ConfigDirNotFound)?
            .join("defectlab")
            .join("taxonomy"),
    };

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::TaxonomyRootCreation {
            path: root.display().to_string(),
            source: e,
        })?;
    }

    *cached_root_guard = Some(root.clone());

    Ok(root)
}
