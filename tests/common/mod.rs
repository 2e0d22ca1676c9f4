//! Test doubles for the resolver and process factory.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use build_session::error::{BuildError, ConfigError};
use build_session::models::{BuildOptions, ResolvedProject};
use build_session::process::{BuildProcess, BuildProcessFactory};
use build_session::resolver::ConfigResolver;
use build_session::BuildSession;
use tokio::sync::Barrier;

pub const WORKSPACE_ROOT: &str = "/root";
pub const WORK_DIR: &str = "/out";

// ============================================================
// Resolver
// ============================================================

/// Resolves files against a fixed set of projects.
#[derive(Default)]
pub struct StaticResolver {
    projects: Vec<ResolvedProject>,
    broken: HashMap<PathBuf, ConfigError>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, manifest: &str, members: &[&str]) -> Self {
        self.projects.push(ResolvedProject {
            manifest: PathBuf::from(manifest),
            members: members.iter().map(PathBuf::from).collect(),
        });
        self
    }

    /// Resolving `file` fails with a parse error for `manifest`.
    pub fn with_broken(mut self, file: &str, manifest: &str, diagnostics: &[&str]) -> Self {
        self.broken.insert(
            PathBuf::from(file),
            ConfigError::Parse {
                manifest: PathBuf::from(manifest),
                diagnostics: diagnostics.join("\n"),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigResolver for StaticResolver {
    async fn resolve(&self, file: &Path) -> Result<ResolvedProject, ConfigError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ConfigError::Parse {
            manifest,
            diagnostics,
        }) = self.broken.get(file)
        {
            return Err(ConfigError::Parse {
                manifest: manifest.clone(),
                diagnostics: diagnostics.clone(),
            });
        }

        self.projects
            .iter()
            .find(|project| project.members.iter().any(|member| member == file))
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                file: file.to_path_buf(),
            })
    }
}

// ============================================================
// Process factory
// ============================================================

/// A process that counts its calls.
pub struct FakeProcess {
    pub manifest: PathBuf,
    rebuilds: AtomicUsize,
    disposals: AtomicUsize,
    fail_rebuild: bool,
    rebuild_barrier: Option<Arc<Barrier>>,
}

impl FakeProcess {
    pub fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildProcess for FakeProcess {
    async fn rebuild(&self) -> Result<(), BuildError> {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.rebuild_barrier {
            barrier.wait().await;
        }
        if self.fail_rebuild {
            return Err(BuildError::diagnostics([format!(
                "{}: error TS2322: Type 'string' is not assignable to type 'number'.",
                self.manifest.display()
            )]));
        }
        Ok(())
    }

    async fn dispose(&self) -> Result<(), BuildError> {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records every start and hands out [`FakeProcess`]es.
#[derive(Default)]
pub struct FakeFactory {
    starts: Mutex<Vec<BuildOptions>>,
    processes: Mutex<Vec<Arc<FakeProcess>>>,
    fail_start: Mutex<HashSet<PathBuf>>,
    fail_rebuild: HashSet<PathBuf>,
    start_delay: Option<Duration>,
    rebuild_barrier: Option<Arc<Barrier>>,
    shutdowns: AtomicUsize,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub fn with_failing_rebuild(mut self, manifest: &str) -> Self {
        self.fail_rebuild.insert(PathBuf::from(manifest));
        self
    }

    /// Every rebuild waits until `parties` rebuilds are in progress.
    pub fn with_rebuild_barrier(mut self, parties: usize) -> Self {
        self.rebuild_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub fn fail_start(&self, manifest: &str) {
        self.fail_start.lock().unwrap().insert(PathBuf::from(manifest));
    }

    pub fn allow_start(&self, manifest: &str) {
        self.fail_start.lock().unwrap().remove(Path::new(manifest));
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn starts(&self) -> Vec<BuildOptions> {
        self.starts.lock().unwrap().clone()
    }

    pub fn start_count_for(&self, manifest: &str) -> usize {
        self.starts
            .lock()
            .unwrap()
            .iter()
            .filter(|options| options.manifest == Path::new(manifest))
            .count()
    }

    pub fn processes(&self) -> Vec<Arc<FakeProcess>> {
        self.processes.lock().unwrap().clone()
    }

    pub fn processes_for(&self, manifest: &str) -> Vec<Arc<FakeProcess>> {
        self.processes()
            .into_iter()
            .filter(|process| process.manifest == Path::new(manifest))
            .collect()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildProcessFactory for FakeFactory {
    async fn start(&self, options: BuildOptions) -> Result<Arc<dyn BuildProcess>, BuildError> {
        self.starts.lock().unwrap().push(options.clone());

        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_start.lock().unwrap().contains(&options.manifest) {
            return Err(BuildError::diagnostics(["error: Could not resolve \"./missing\""]));
        }

        let process = Arc::new(FakeProcess {
            manifest: options.manifest.clone(),
            rebuilds: AtomicUsize::new(0),
            disposals: AtomicUsize::new(0),
            fail_rebuild: self.fail_rebuild.contains(&options.manifest),
            rebuild_barrier: self.rebuild_barrier.clone(),
        });
        self.processes.lock().unwrap().push(process.clone());
        Ok(process)
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================
// Fixtures
// ============================================================

pub const APP_MANIFEST: &str = "/root/app/tsconfig.json";
pub const LIB_MANIFEST: &str = "/root/lib/tsconfig.json";
pub const TOOLS_MANIFEST: &str = "/root/tools/tsconfig.json";

/// Three projects: app (two files), lib (one file), tools (one file).
pub fn workspace_resolver() -> StaticResolver {
    StaticResolver::new()
        .with_project(APP_MANIFEST, &["/root/app/src/a.ts", "/root/app/src/b.tsx"])
        .with_project(LIB_MANIFEST, &["/root/lib/index.ts"])
        .with_project(TOOLS_MANIFEST, &["/root/tools/cli.mts"])
        .with_broken(
            "/root/broken/x.ts",
            "/root/broken/tsconfig.json",
            &["error TS1005: '}' expected.", "error TS6046: Argument for '--target' option must be: 'es5'."],
        )
}

pub fn session_with(resolver: Arc<StaticResolver>, factory: Arc<FakeFactory>) -> BuildSession {
    BuildSession::new(WORKSPACE_ROOT, WORK_DIR, resolver, factory)
}
