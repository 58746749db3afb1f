// src/constants.rs

/// The name of the descriptor file inside each taxonomy project directory.
pub const META_FILENAME: &str = "meta.json";

/// The subdirectory of a project definition holding its patch artifacts.
pub const PATCH_DIR: &str = "patch";

/// Reserved command token replaced with the resolved make jobs flag at load time.
pub const MAKE_JOB_PLACEHOLDER: &str = "@MAKE_JOB@";

/// The name of the state file written into a worktree at checkout time.
pub const WORKTREE_CONFIG_FILENAME: &str = ".defectlab.json";

/// Environment variable overriding the taxonomy root directory.
pub const TAXONOMY_ROOT_ENV: &str = "DEFECTLAB_TAXONOMY";

/// Environment variable overriding the build parallelism substituted into commands.
pub const MAKE_JOBS_ENV: &str = "DEFECTLAB_MAKE_JOBS";

/// Prefix for the per-project container names the execution channel targets.
pub const CONTAINER_PREFIX: &str = "defectlab-";
