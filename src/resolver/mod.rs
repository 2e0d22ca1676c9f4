//! Locating the project that owns a source file.

mod manifest;

use std::path::Path;

use async_trait::async_trait;

pub use manifest::*;

use crate::error::ConfigError;
use crate::models::ResolvedProject;

/// Resolves a file to its owning project's manifest and ordered members.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    /// Fails with [`ConfigError::NotFound`] when no manifest is discoverable
    /// from the file's directory upward, or [`ConfigError::Parse`] when the
    /// manifest has diagnostics.
    async fn resolve(&self, file: &Path) -> Result<ResolvedProject, ConfigError>;
}
