use std::path::{Path, PathBuf};

use serde::Serialize;

/// A project as resolved from its manifest.
///
/// The manifest path is the project's identity. Member order is preserved
/// verbatim: it becomes the entry-point order of the compile process and the
/// iteration order of [`FileGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub manifest: PathBuf,
    pub members: Vec<PathBuf>,
}

/// A source file paired with the path its compiled output lands at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// The compilation group of a file, in the project's member order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileGroup {
    entries: Vec<GroupEntry>,
}

impl FileGroup {
    pub fn new(entries: Vec<GroupEntry>) -> Self {
        Self { entries }
    }

    /// Output path for `source`, if it belongs to this group.
    pub fn get(&self, source: &Path) -> Option<&Path> {
        self.entries
            .iter()
            .find(|entry| entry.source == source)
            .map(|entry| entry.output.as_path())
    }

    pub fn contains(&self, source: &Path) -> bool {
        self.get(source).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupEntry> {
        self.entries.iter()
    }

    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.source.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for FileGroup {
    type Item = GroupEntry;
    type IntoIter = std::vec::IntoIter<GroupEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
