//! Mapping source files to their compiled output paths.
//!
//! Everything here is lexical: no filesystem access, no symlink resolution.

use std::path::{Component, Path, PathBuf};

/// Maps absolute source paths under a workspace root to output paths under a
/// work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    workspace_root: PathBuf,
    out_root: PathBuf,
}

impl PathMapper {
    pub fn new(workspace_root: impl Into<PathBuf>, out_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: normalize(&workspace_root.into()),
            out_root: normalize(&out_root.into()),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn out_root(&self) -> &Path {
        &self.out_root
    }

    /// `out_root / relative(file, workspace_root)` with the source extension
    /// rewritten to its compiled counterpart.
    pub fn map(&self, file: &Path) -> PathBuf {
        let relative = relative_to(&normalize(file), &self.workspace_root);
        let mut output = normalize(&self.out_root.join(relative));
        if let Some(ext) = output.extension().and_then(|ext| ext.to_str()) {
            if let Some(compiled) = output_extension(ext) {
                output.set_extension(compiled);
            }
        }
        output
    }
}

/// Compiled extension for a source extension, `None` to leave it untouched.
fn output_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "ts" | "tsx" | "js" | "jsx" => Some("js"),
        "mts" => Some("mjs"),
        "cts" => Some("cjs"),
        _ => None,
    }
}

/// Lexically removes `.` components and folds `..` into their parent.
///
/// A `..` that would climb above the root is dropped for absolute paths and
/// kept for relative ones.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// Rebuilds `path` from its components so it uses the host's separator.
///
/// On Windows this turns `C:/src/a.ts` into `C:\src\a.ts`; elsewhere it is an
/// identity apart from collapsing redundant separators.
pub fn native(path: &Path) -> PathBuf {
    path.components().collect()
}

/// The relative path from `base` to `path`, climbing with `..` when `path`
/// lies outside `base`. Both inputs are expected to be normalized.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_components: Vec<_> = path.components().collect();
    let base_components: Vec<_> = base.components().collect();

    let common = path_components
        .iter()
        .zip(&base_components)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component);
    }
    relative
}
