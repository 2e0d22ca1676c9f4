//! Incremental compile processes and the factory that starts them.
//!
//! The session only talks to compile processes through [`BuildProcessFactory`]
//! and [`BuildProcess`]; [`CommandFactory`] is the implementation used by the
//! `bsess` binary.

mod command;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

pub use command::*;

use crate::error::BuildError;
use crate::models::BuildOptions;

/// A running incremental compile process.
#[async_trait]
pub trait BuildProcess: Send + Sync {
    /// Recompiles whatever changed since the last build or start.
    async fn rebuild(&self) -> Result<(), BuildError>;

    /// Releases every resource held by the process. The process must not be
    /// used afterwards.
    async fn dispose(&self) -> Result<(), BuildError>;
}

/// Starts incremental compile processes.
#[async_trait]
pub trait BuildProcessFactory: Send + Sync {
    async fn start(&self, options: BuildOptions) -> Result<Arc<dyn BuildProcess>, BuildError>;

    /// Releases the connection to the compile infrastructure. Called once,
    /// when the owning session stops.
    async fn shutdown(&self) {}
}

/// A live process together with the manifest it was started for.
///
/// Cloning shares the underlying process.
#[derive(Clone)]
pub struct ProcessHandle {
    manifest: Arc<Path>,
    process: Arc<dyn BuildProcess>,
}

impl ProcessHandle {
    pub fn new(manifest: &Path, process: Arc<dyn BuildProcess>) -> Self {
        Self {
            manifest: Arc::from(manifest),
            process,
        }
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub async fn rebuild(&self) -> Result<(), BuildError> {
        self.process.rebuild().await
    }

    pub async fn dispose(&self) -> Result<(), BuildError> {
        self.process.dispose().await
    }

    /// Whether both handles refer to the same process.
    pub fn same_process(&self, other: &ProcessHandle) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.process), Arc::as_ptr(&other.process))
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}
