use std::ffi::{OsStr, OsString};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{BuildProcess, BuildProcessFactory};
use crate::error::BuildError;
use crate::models::{BuildOptions, SourcemapPolicy};

/// Default compiler program.
pub const DEFAULT_COMPILER: &str = "esbuild";

/// Starts compile processes by running an esbuild-compatible CLI.
///
/// Each start and rebuild runs the compiler once over the project's entry
/// files. A non-zero exit becomes [`BuildError::Diagnostics`] holding the
/// compiler's stderr lines.
#[derive(Debug, Clone)]
pub struct CommandFactory {
    program: OsString,
    extra_args: Vec<OsString>,
}

impl CommandFactory {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments appended after the generated ones.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// The full argument list for a project.
    pub fn command_args(&self, options: &BuildOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = options
            .entry_files
            .iter()
            .map(|file| file.as_os_str().to_owned())
            .collect();

        args.push(flag("--outbase=", options.outbase.as_os_str()));
        args.push(flag("--outdir=", options.outdir.as_os_str()));
        args.push(flag("--tsconfig=", options.manifest.as_os_str()));
        match options.sourcemap {
            SourcemapPolicy::None => {}
            SourcemapPolicy::Inline => args.push("--sourcemap=inline".into()),
            SourcemapPolicy::External => args.push("--sourcemap=external".into()),
            SourcemapPolicy::Linked => args.push("--sourcemap".into()),
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl Default for CommandFactory {
    fn default() -> Self {
        Self::new(DEFAULT_COMPILER)
    }
}

fn flag(name: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(name);
    arg.push(value);
    arg
}

#[async_trait]
impl BuildProcessFactory for CommandFactory {
    async fn start(&self, options: BuildOptions) -> Result<Arc<dyn BuildProcess>, BuildError> {
        let process = CommandProcess {
            program: self.program.clone(),
            args: self.command_args(&options),
            disposed: AtomicBool::new(false),
        };
        process.run().await?;
        Ok(Arc::new(process))
    }
}

/// A project's compiler invocation, re-run on every rebuild.
#[derive(Debug)]
pub struct CommandProcess {
    program: OsString,
    args: Vec<OsString>,
    disposed: AtomicBool,
}

impl CommandProcess {
    async fn run(&self) -> Result<(), BuildError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            debug!(program = ?self.program, "compiler finished");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics: Vec<String> = stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        if diagnostics.is_empty() {
            diagnostics.push(format!(
                "{} exited with {}",
                self.program.to_string_lossy(),
                output.status
            ));
        }
        Err(BuildError::Diagnostics { diagnostics })
    }
}

#[async_trait]
impl BuildProcess for CommandProcess {
    async fn rebuild(&self) -> Result<(), BuildError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(BuildError::Disposed);
        }
        self.run().await
    }

    async fn dispose(&self) -> Result<(), BuildError> {
        self.disposed.store(true, Ordering::Release);
        Ok(())
    }
}
