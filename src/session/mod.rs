//! Build sessions: one incremental compile process per project, created on
//! demand and torn down together.
//!
//! # Lifecycle
//!
//! - [`BuildSession::compile`] resolves a file's project on first sight and
//!   starts its process. Later calls for any member of the project hit the
//!   registry and only map the path.
//! - [`BuildSession::rebuild`] fans out to every live process at once.
//! - [`BuildSession::invalidate`] disposes every process and empties the
//!   registry. The next `compile` starts fresh.
//! - [`BuildSession::stop`] ends the session.
//!
//! Build failures are reported through `tracing` and never fail the caller;
//! only manifest resolution errors do.

mod inflight;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use self::inflight::{Claim, InFlightStarts, StartGuard};
use crate::config::SessionConfig;
use crate::error::ConfigError;
use crate::models::*;
use crate::paths::{native, normalize, PathMapper};
use crate::process::{BuildProcessFactory, CommandFactory, ProcessHandle};
use crate::registry::BuildRegistry;
use crate::resolver::{ConfigResolver, ManifestResolver};

pub struct BuildSession {
    mapper: PathMapper,
    sourcemap: SourcemapPolicy,
    resolver: Arc<dyn ConfigResolver>,
    factory: Arc<dyn BuildProcessFactory>,
    registry: Mutex<BuildRegistry>,
    inflight: InFlightStarts,
}

impl BuildSession {
    /// Creates a session writing output for files under `workspace_root` to
    /// `work_dir`. The registry starts empty.
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        resolver: Arc<dyn ConfigResolver>,
        factory: Arc<dyn BuildProcessFactory>,
    ) -> Self {
        Self {
            mapper: PathMapper::new(workspace_root, work_dir),
            sourcemap: SourcemapPolicy::default(),
            resolver,
            factory,
            registry: Mutex::new(BuildRegistry::new()),
            inflight: InFlightStarts::default(),
        }
    }

    /// A session using [`ManifestResolver`] and [`CommandFactory`].
    pub fn from_config(config: &SessionConfig) -> Self {
        let resolver = ManifestResolver::new(config.manifest_name.clone());
        let factory = CommandFactory::new(&config.compiler).with_args(&config.compiler_args);
        Self::new(
            &config.workspace_root,
            &config.work_dir,
            Arc::new(resolver),
            Arc::new(factory),
        )
        .with_sourcemap(config.sourcemap)
    }

    pub fn with_sourcemap(mut self, sourcemap: SourcemapPolicy) -> Self {
        self.sourcemap = sourcemap;
        self
    }

    pub fn path_mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Number of projects with a live process.
    pub fn project_count(&self) -> usize {
        self.registry.lock().project_count()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Ensures `file`'s project has a live process and returns where the
    /// compiled output for `file` lands.
    ///
    /// Fails only when the project cannot be resolved. A failed process start
    /// is logged and the output path is still returned; the project stays
    /// unregistered so the next call retries.
    pub async fn compile(&self, file: &Path) -> Result<PathBuf, ConfigError> {
        let file = normalize(file);

        let known = self.registry.lock().lookup(&file).is_some();
        if !known {
            let project = self.resolver.resolve(&file).await?;
            self.ensure_project(project).await;
        }

        Ok(self.mapper.map(&file))
    }

    /// Every member of `file`'s compilation group mapped to its output path,
    /// in project member order.
    ///
    /// Returns `None` if `file` has not been compiled since the last
    /// invalidation.
    pub fn file_group(&self, file: &Path) -> Option<FileGroup> {
        let file = normalize(file);
        let registry = self.registry.lock();
        let group = registry.group_of(&file)?;

        let entries = group
            .iter()
            .map(|source| GroupEntry {
                source: source.clone(),
                output: self.mapper.map(source),
            })
            .collect();
        Some(FileGroup::new(entries))
    }

    /// Rebuilds every live process concurrently.
    ///
    /// Completes once every process has finished, whatever the individual
    /// outcomes. Failures are logged and collected into the report.
    pub async fn rebuild(&self) -> RebuildReport {
        let handles = self.registry.lock().all_handles();
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        for handle in handles {
            tasks.spawn(async move {
                let result = handle.rebuild().await;
                ProcessOutcome {
                    manifest: handle.manifest().to_path_buf(),
                    result,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let Err(err) = &outcome.result {
                        error!(manifest = %outcome.manifest.display(), error = %err, "rebuild failed");
                    }
                    outcomes.push(outcome);
                }
                Err(err) => error!(error = %err, "rebuild task aborted"),
            }
        }

        let report = RebuildReport {
            outcomes,
            elapsed: started.elapsed(),
        };
        info!(
            processes = report.outcomes.len(),
            failed = report.failure_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "rebuild finished"
        );
        report
    }

    /// Disposes every live process, then empties the registry.
    ///
    /// The registry is cleared even if disposal fails. Processes registered
    /// while disposal was running are disposed as well.
    pub async fn invalidate(&self) {
        let disposed = self.registry.lock().all_handles();
        let count = disposed.len();
        dispose_all(disposed.clone()).await;

        let leftover: Vec<ProcessHandle> = self
            .registry
            .lock()
            .drain()
            .into_iter()
            .filter(|handle| !disposed.iter().any(|d| d.same_process(handle)))
            .collect();
        let count = count + leftover.len();
        dispose_all(leftover).await;

        info!(processes = count, "build registry invalidated");
    }

    /// Disposes every process and releases the compile infrastructure.
    pub async fn stop(self) {
        self.invalidate().await;
        self.factory.shutdown().await;
        info!("build session stopped");
    }

    async fn ensure_project(&self, project: ResolvedProject) {
        // The registry lock is held across the claim so a start cannot
        // register between our check and our claim.
        let claim = {
            let registry = self.registry.lock();
            if registry.contains_manifest(&project.manifest) {
                return;
            }
            self.inflight.claim(&project.manifest, registry.generation())
        };

        match claim {
            Claim::Waiter(done) => {
                debug!(manifest = %project.manifest.display(), "waiting for in-flight start");
                inflight::finished(done).await;
            }
            Claim::Leader(guard) => self.start_project(project, guard).await,
        }
    }

    async fn start_project(&self, project: ResolvedProject, guard: StartGuard<'_>) {
        let options = BuildOptions {
            entry_files: project.members.iter().map(|file| native(file)).collect(),
            outbase: self.mapper.workspace_root().to_path_buf(),
            outdir: self.mapper.out_root().to_path_buf(),
            manifest: project.manifest.clone(),
            sourcemap: self.sourcemap,
        };

        let started = Instant::now();
        let process = match self.factory.start(options).await {
            Ok(process) => process,
            Err(err) => {
                error!(manifest = %project.manifest.display(), error = %err, "failed to start build");
                return;
            }
        };

        let handle = ProcessHandle::new(&project.manifest, process);
        let registered = {
            let mut registry = self.registry.lock();
            registry.generation() == guard.generation()
                && registry.register(&project.manifest, &project.members, handle.clone())
        };

        if registered {
            info!(
                manifest = %project.manifest.display(),
                files = project.members.len(),
                sourcemap = self.sourcemap.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "build started"
            );
        } else {
            warn!(
                manifest = %project.manifest.display(),
                "registry changed during start, discarding process"
            );
            dispose_all(vec![handle]).await;
        }
    }
}

/// Disposes handles concurrently, logging failures.
async fn dispose_all(handles: Vec<ProcessHandle>) {
    let mut tasks = JoinSet::new();
    for handle in handles {
        tasks.spawn(async move {
            if let Err(err) = handle.dispose().await {
                warn!(manifest = %handle.manifest().display(), error = %err, "dispose failed");
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "dispose task aborted");
        }
    }
}
