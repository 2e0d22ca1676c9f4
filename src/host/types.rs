//! Request and response types for the stdio host.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{FileGroup, RebuildReport};

// ============================================================
// Request Types
// ============================================================

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Compile { file: PathBuf },
    FileGroup { file: PathBuf },
    Rebuild,
    Invalidate,
    Stop,
}

// ============================================================
// Response Types
// ============================================================

/// One line of output: `{"ok": true, ...body}` or `{"ok": false, "error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl Response {
    pub fn ok(body: ResponseBody) -> Self {
        Self { ok: true, body }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            body: ResponseBody::Error {
                error: error.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Compiled { output: PathBuf },
    Group { group: FileGroup },
    Rebuilt(RebuildSummary),
    Error { error: String },
    Done {},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub processes: usize,
    pub failed: Vec<FailedRebuild>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRebuild {
    pub manifest: PathBuf,
    pub error: String,
}

impl From<&RebuildReport> for RebuildSummary {
    fn from(report: &RebuildReport) -> Self {
        Self {
            processes: report.outcomes.len(),
            failed: report
                .failures()
                .filter_map(|outcome| {
                    let err = outcome.result.as_ref().err()?;
                    Some(FailedRebuild {
                        manifest: outcome.manifest.clone(),
                        error: err.to_string(),
                    })
                })
                .collect(),
            elapsed_ms: report.elapsed.as_millis() as u64,
        }
    }
}
