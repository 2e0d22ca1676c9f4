//! Error types for project resolution and build processes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from resolving the project that owns a file.
///
/// These are the only errors that reach a caller of
/// [`BuildSession::compile`](crate::session::BuildSession::compile).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No manifest found for {}", .file.display())]
    NotFound { file: PathBuf },

    #[error("Invalid manifest {}:\n{diagnostics}", .manifest.display())]
    Parse {
        manifest: PathBuf,
        diagnostics: String,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from starting or rebuilding an incremental compile process.
///
/// Never propagated out of the session; reported through `tracing` and
/// collected into [`RebuildReport`](crate::models::RebuildReport).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Build failed:\n{}", .diagnostics.join("\n"))]
    Diagnostics { diagnostics: Vec<String> },

    #[error("Failed to run compiler: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build process was disposed")]
    Disposed,
}

impl BuildError {
    pub fn diagnostics(diagnostics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Diagnostics {
            diagnostics: diagnostics.into_iter().map(Into::into).collect(),
        }
    }
}

/// A sourcemap policy name other than `none`, `inline`, `external` or `linked`.
#[derive(Debug, Error)]
#[error("Unknown sourcemap policy '{0}', expected none, inline, external or linked")]
pub struct UnknownSourcemapPolicy(pub String);
