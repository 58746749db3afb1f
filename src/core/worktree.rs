// src/core/worktree.rs

use crate::constants::WORKTREE_CONFIG_FILENAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The state file a checkout leaves behind in its worktree, tying the
/// directory back to a taxonomy project and one of its defects. `build` and
/// `test` read it to know what they are operating on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorktreeConfig {
    /// Taxonomy name of the project this checkout belongs to.
    pub project: String,
    /// 1-based defect index within the project's defect list.
    pub defect: u32,
}

#[derive(Error, Debug)]
pub enum WorktreeError {
    #[error("'{path}' is not a defect worktree (no '{WORKTREE_CONFIG_FILENAME}' present). Run a checkout first.")]
    NotAWorktree { path: PathBuf },
    #[error("Could not resolve worktree path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Worktree state file '{path}' is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode worktree state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Expands and canonicalizes a user-supplied worktree path (home directory,
/// environment variables, symlink-free absolute form).
pub fn resolve_worktree_path(raw: &str) -> Result<PathBuf, WorktreeError> {
    let expanded = shellexpand::full(raw).map_err(|e| WorktreeError::InvalidPath {
        path: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(dunce::canonicalize(expanded.as_ref())?)
}

/// Reads the worktree state for a user-supplied path, returning the parsed
/// state together with the canonical worktree directory.
pub fn read_worktree_config(raw_path: &str) -> Result<(WorktreeConfig, PathBuf), WorktreeError> {
    let worktree = resolve_worktree_path(raw_path)?;
    let file = worktree.join(WORKTREE_CONFIG_FILENAME);
    if !file.exists() {
        return Err(WorktreeError::NotAWorktree { path: worktree });
    }

    let bytes = fs::read(&file)?;
    let config = serde_json::from_slice(&bytes).map_err(|e| WorktreeError::Malformed {
        path: file,
        source: e,
    })?;
    Ok((config, worktree))
}

/// Writes the worktree state file. Called by the checkout collaborator once a
/// defect revision has been materialized into `worktree`.
pub fn write_worktree_config(worktree: &Path, config: &WorktreeConfig) -> Result<(), WorktreeError> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(worktree.join(WORKTREE_CONFIG_FILENAME), json)?;
    Ok(())
}

// MARK: --- UNIT TESTS ---
