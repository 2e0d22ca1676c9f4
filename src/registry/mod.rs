//! Authoritative mapping of files and manifests to live compile processes.
//!
//! The registry is plain synchronous state. [`BuildSession`](crate::session::BuildSession)
//! owns it behind a lock and never holds that lock across an await point, so
//! every operation here is observed atomically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::process::ProcessHandle;

/// Which process each file and manifest belongs to, and which files compile
/// together.
///
/// # Invariants
///
/// - Every file key belongs to exactly one registered manifest's members.
/// - One process per manifest.
/// - For every file `f` with group `G`: `f ∈ G`, and every `g ∈ G` maps to
///   the same process as `f`.
/// - A file shared by two projects belongs to whichever registered first.
#[derive(Debug, Default)]
pub struct BuildRegistry {
    file_to_process: HashMap<PathBuf, ProcessHandle>,
    manifest_to_process: HashMap<PathBuf, ProcessHandle>,
    group_of: HashMap<PathBuf, Arc<[PathBuf]>>,
    /// Bumped on every [`clear`](Self::clear).
    generation: u64,
}

impl BuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process compiling `file`, if its project is live.
    pub fn lookup(&self, file: &Path) -> Option<&ProcessHandle> {
        self.file_to_process.get(file)
    }

    pub fn contains_manifest(&self, manifest: &Path) -> bool {
        self.manifest_to_process.contains_key(manifest)
    }

    /// The ordered compilation group of `file`.
    pub fn group_of(&self, file: &Path) -> Option<&[PathBuf]> {
        self.group_of.get(file).map(|group| &group[..])
    }

    /// Registers a project's process for its members.
    ///
    /// A member already owned by another live project keeps its owner and is
    /// left out of this project's group. Returns `false` and leaves the
    /// registry untouched if the manifest is already registered; the caller
    /// still owns `handle` in that case.
    pub fn register(&mut self, manifest: &Path, members: &[PathBuf], handle: ProcessHandle) -> bool {
        if self.manifest_to_process.contains_key(manifest) {
            return false;
        }

        let (owned, shared): (Vec<PathBuf>, Vec<PathBuf>) = members
            .iter()
            .cloned()
            .partition(|file| !self.file_to_process.contains_key(file));
        for file in &shared {
            if let Some(owner) = self.file_to_process.get(file) {
                warn!(
                    file = %file.display(),
                    manifest = %manifest.display(),
                    owner = %owner.manifest().display(),
                    "file already belongs to another project"
                );
            }
        }

        let group: Arc<[PathBuf]> = Arc::from(owned);
        for file in group.iter() {
            self.file_to_process.insert(file.clone(), handle.clone());
            self.group_of.insert(file.clone(), Arc::clone(&group));
        }
        self.manifest_to_process.insert(manifest.to_path_buf(), handle);
        true
    }

    /// Empties every mapping. Does not dispose the handles.
    pub fn clear(&mut self) {
        self.file_to_process.clear();
        self.manifest_to_process.clear();
        self.group_of.clear();
        self.generation += 1;
    }

    /// Removes every project and returns their handles, one per process.
    pub fn drain(&mut self) -> Vec<ProcessHandle> {
        let handles = self.all_handles();
        self.clear();
        handles
    }

    /// One handle per live process.
    pub fn all_handles(&self) -> Vec<ProcessHandle> {
        self.manifest_to_process.values().cloned().collect()
    }

    pub fn project_count(&self) -> usize {
        self.manifest_to_process.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest_to_process.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
