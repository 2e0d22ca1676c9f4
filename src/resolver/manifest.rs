use std::path::{Path, PathBuf};

use async_trait::async_trait;
use glob::Pattern;
use serde_json::{Map, Value};
use tracing::debug;

use super::ConfigResolver;
use crate::error::ConfigError;
use crate::models::ResolvedProject;
use crate::paths::{normalize, relative_to};

/// Default manifest file name.
pub const DEFAULT_MANIFEST_NAME: &str = "tsconfig.json";

/// Used when a manifest lists neither `files` nor `include`.
const DEFAULT_INCLUDE: &[&str] = &["**/*.ts", "**/*.tsx", "**/*.mts", "**/*.cts"];

/// Used when a manifest has no `exclude`.
const DEFAULT_EXCLUDE: &[&str] = &["node_modules/**"];

/// Resolves projects from JSON manifests found by walking up the directory
/// tree.
///
/// A manifest lists its members with `files` (explicit paths, kept in order)
/// and `include` (glob patterns, matches sorted), minus anything matching an
/// `exclude` pattern. All paths are relative to the manifest's directory.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    manifest_name: String,
}

impl ManifestResolver {
    pub fn new(manifest_name: impl Into<String>) -> Self {
        Self {
            manifest_name: manifest_name.into(),
        }
    }

    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    /// The nearest manifest in `file`'s directory or any ancestor.
    pub fn find_manifest(&self, file: &Path) -> Option<PathBuf> {
        let mut dir = file.parent();
        while let Some(current) = dir {
            let candidate = current.join(&self.manifest_name);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    fn resolve_blocking(&self, file: &Path) -> Result<ResolvedProject, ConfigError> {
        let file = normalize(file);
        let manifest = self
            .find_manifest(&file)
            .ok_or_else(|| ConfigError::NotFound { file: file.clone() })?;
        debug!(file = %file.display(), manifest = %manifest.display(), "found manifest");
        load_manifest(&manifest)
    }
}

impl Default for ManifestResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_NAME)
    }
}

#[async_trait]
impl ConfigResolver for ManifestResolver {
    async fn resolve(&self, file: &Path) -> Result<ResolvedProject, ConfigError> {
        let resolver = self.clone();
        let owned = file.to_path_buf();
        tokio::task::spawn_blocking(move || resolver.resolve_blocking(&owned))
            .await
            .map_err(|err| ConfigError::Io {
                path: file.to_path_buf(),
                source: std::io::Error::other(err),
            })?
    }
}

/// Reads a manifest and expands its member list.
pub fn load_manifest(manifest: &Path) -> Result<ResolvedProject, ConfigError> {
    let text = std::fs::read_to_string(manifest).map_err(|source| ConfigError::Io {
        path: manifest.to_path_buf(),
        source,
    })?;
    let dir = manifest.parent().unwrap_or(Path::new(""));

    match parse_members(&text, dir) {
        Ok(members) if !members.is_empty() => Ok(ResolvedProject {
            manifest: manifest.to_path_buf(),
            members,
        }),
        Ok(_) => Err(ConfigError::Parse {
            manifest: manifest.to_path_buf(),
            diagnostics: format!(
                "No inputs were found in config file '{}'.",
                manifest.display()
            ),
        }),
        Err(diagnostics) => Err(ConfigError::Parse {
            manifest: manifest.to_path_buf(),
            diagnostics: diagnostics.join("\n"),
        }),
    }
}

/// Expands a manifest's member list, or returns every diagnostic found.
fn parse_members(text: &str, dir: &Path) -> Result<Vec<PathBuf>, Vec<String>> {
    // Manifests may carry comments and trailing commas.
    let value: Value = json5::from_str(text).map_err(|err| vec![err.to_string()])?;
    let Some(object) = value.as_object() else {
        return Err(vec!["Manifest must contain a JSON object.".to_string()]);
    };

    let mut diagnostics = Vec::new();
    let files = string_list(object, "files", &mut diagnostics);
    let include = string_list(object, "include", &mut diagnostics);
    let exclude = string_list(object, "exclude", &mut diagnostics);

    let include = match (&files, include) {
        (None, None) => Some(DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()),
        (_, include) => include,
    };
    let exclude = exclude.unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());

    let exclude: Vec<Pattern> = exclude
        .iter()
        .filter_map(|pattern| match Pattern::new(pattern) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                diagnostics.push(format!("Invalid exclude pattern '{pattern}': {err}"));
                None
            }
        })
        .collect();

    let mut members: Vec<PathBuf> = Vec::new();
    let mut push = |path: PathBuf| {
        if !members.contains(&path) {
            members.push(path);
        }
    };

    for file in files.unwrap_or_default() {
        let path = normalize(&dir.join(&file));
        if path.is_file() {
            push(path);
        } else {
            diagnostics.push(format!("File '{}' not found.", path.display()));
        }
    }

    for pattern in include.unwrap_or_default() {
        for path in expand_include(dir, &pattern, &mut diagnostics) {
            let relative = relative_to(&path, dir);
            if !exclude.iter().any(|p| p.matches_path(&relative)) {
                push(path);
            }
        }
    }

    if diagnostics.is_empty() {
        Ok(members)
    } else {
        Err(diagnostics)
    }
}

/// Reads an optional array-of-strings field, recording a diagnostic for every
/// malformed part.
fn string_list(
    object: &Map<String, Value>,
    key: &str,
    diagnostics: &mut Vec<String>,
) -> Option<Vec<String>> {
    let value = object.get(key)?;
    let Some(items) = value.as_array() else {
        diagnostics.push(format!("'{key}' must be an array of strings."));
        return None;
    };

    let mut list = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => list.push(s.to_string()),
            None => diagnostics.push(format!("'{key}[{index}]' must be a string, found {item}.")),
        }
    }
    Some(list)
}

/// Source files matching an include pattern, in sorted order.
fn expand_include(dir: &Path, pattern: &str, diagnostics: &mut Vec<String>) -> Vec<PathBuf> {
    let Some(dir_str) = dir.to_str() else {
        diagnostics.push(format!("Manifest directory '{}' is not valid UTF-8.", dir.display()));
        return Vec::new();
    };
    // The directory is matched literally; only the pattern may contain wildcards.
    let full = Path::new(&Pattern::escape(dir_str)).join(pattern);

    let paths = match glob::glob(&full.to_string_lossy()) {
        Ok(paths) => paths,
        Err(err) => {
            diagnostics.push(format!("Invalid include pattern '{pattern}': {err}"));
            return Vec::new();
        }
    };

    let mut matched: Vec<PathBuf> = paths
        .filter_map(Result::ok)
        .filter(|path| path.is_file() && is_source_file(path))
        .map(|path| normalize(&path))
        .collect();
    matched.sort();
    matched
}

fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
        return false;
    }
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("ts" | "tsx" | "mts" | "cts" | "js" | "jsx")
    )
}
