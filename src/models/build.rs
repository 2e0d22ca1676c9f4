use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BuildError, UnknownSourcemapPolicy};

/// How the compiler should emit source maps.
///
/// - `None`: No source maps
/// - `Inline`: Appended to each output file as a data URL
/// - `External`: Written next to the output without a reference comment
/// - `Linked`: Written next to the output with a `sourceMappingURL` comment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourcemapPolicy {
    None,
    #[default]
    Inline,
    External,
    Linked,
}

impl SourcemapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Inline => "inline",
            Self::External => "external",
            Self::Linked => "linked",
        }
    }
}

impl FromStr for SourcemapPolicy {
    type Err = UnknownSourcemapPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "inline" => Ok(Self::Inline),
            "external" => Ok(Self::External),
            "linked" => Ok(Self::Linked),
            _ => Err(UnknownSourcemapPolicy(s.to_string())),
        }
    }
}

/// Parameters for starting an incremental compile process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Entry files in project member order, using native path separators.
    pub entry_files: Vec<PathBuf>,
    /// Root that output paths are computed relative to.
    pub outbase: PathBuf,
    /// Root that compiled output is written under.
    pub outdir: PathBuf,
    /// The project's manifest, passed to the compiler as its config.
    pub manifest: PathBuf,
    pub sourcemap: SourcemapPolicy,
}

/// Result of rebuilding a single process.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub manifest: PathBuf,
    pub result: Result<(), BuildError>,
}

impl ProcessOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of a rebuild fan-out across every live process.
///
/// A report is produced once every per-process attempt has completed,
/// regardless of individual failures. Outcome order is unspecified.
#[derive(Debug, Default)]
pub struct RebuildReport {
    pub outcomes: Vec<ProcessOutcome>,
    pub elapsed: Duration,
}

impl RebuildReport {
    pub fn failures(&self) -> impl Iterator<Item = &ProcessOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_ok())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(ProcessOutcome::is_ok)
    }
}
