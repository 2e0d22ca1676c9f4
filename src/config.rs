//! Session configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::models::SourcemapPolicy;
use crate::process::DEFAULT_COMPILER;
use crate::resolver::DEFAULT_MANIFEST_NAME;

pub const ENV_WORKSPACE_ROOT: &str = "BUILD_SESSION_WORKSPACE_ROOT";
pub const ENV_WORK_DIR: &str = "BUILD_SESSION_WORK_DIR";
pub const ENV_MANIFEST: &str = "BUILD_SESSION_MANIFEST";
pub const ENV_SOURCEMAP: &str = "BUILD_SESSION_SOURCEMAP";
pub const ENV_COMPILER: &str = "BUILD_SESSION_COMPILER";
pub const ENV_COMPILER_ARGS: &str = "BUILD_SESSION_COMPILER_ARGS";

/// Work directory, relative to the current directory, used when the platform
/// has no cache directory.
const FALLBACK_WORK_DIR: &str = ".bsess/out";

/// Everything needed to build a [`BuildSession`](crate::session::BuildSession).
///
/// `workspace_root` and `work_dir` are fixed for the session's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Root that output paths are computed relative to.
    pub workspace_root: PathBuf,
    /// Root that compiled output is written under.
    pub work_dir: PathBuf,
    /// File name searched for when resolving a file's project.
    pub manifest_name: String,
    pub sourcemap: SourcemapPolicy,
    /// Compiler program (from BUILD_SESSION_COMPILER)
    pub compiler: String,
    /// Extra compiler arguments (from BUILD_SESSION_COMPILER_ARGS, whitespace-separated)
    pub compiler_args: Vec<String>,
}

impl SessionConfig {
    /// A config with default manifest name, sourcemap policy and compiler.
    pub fn new(workspace_root: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            work_dir: work_dir.into(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            sourcemap: SourcemapPolicy::default(),
            compiler: DEFAULT_COMPILER.to_string(),
            compiler_args: Vec::new(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// The workspace root defaults to the current directory and the work
    /// directory to the platform cache directory (or `.bsess/out` without one).
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, cwd: &Path) -> Result<Self> {
        let workspace_root = lookup(ENV_WORKSPACE_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|| cwd.to_path_buf());

        let work_dir = lookup(ENV_WORK_DIR)
            .map(PathBuf::from)
            .or_else(default_work_dir)
            .unwrap_or_else(|| cwd.join(FALLBACK_WORK_DIR));

        let mut config = Self::new(workspace_root, work_dir);

        if let Some(name) = lookup(ENV_MANIFEST) {
            config.manifest_name = name;
        }
        if let Some(policy) = lookup(ENV_SOURCEMAP) {
            config.sourcemap = policy
                .parse()
                .map_err(|err| anyhow!("Invalid {ENV_SOURCEMAP} value: {err}"))?;
        }
        if let Some(compiler) = lookup(ENV_COMPILER) {
            config.compiler = compiler;
        }
        if let Some(args) = lookup(ENV_COMPILER_ARGS) {
            config.compiler_args = args.split_whitespace().map(String::from).collect();
        }

        Ok(config.absolutize(cwd))
    }

    /// Resolves relative roots against `cwd`.
    pub fn absolutize(mut self, cwd: &Path) -> Self {
        if self.workspace_root.is_relative() {
            self.workspace_root = cwd.join(&self.workspace_root);
        }
        if self.work_dir.is_relative() {
            self.work_dir = cwd.join(&self.work_dir);
        }
        self
    }
}

/// `<platform cache dir>/out`.
pub fn default_work_dir() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "build-session")?;
    Some(dirs.cache_dir().join("out"))
}
