//! Domain models for build sessions.
//!
//! # Core Concepts
//!
//! - [`ResolvedProject`]: A manifest plus its ordered member files, as
//!   reported by a [`ConfigResolver`](crate::resolver::ConfigResolver).
//! - [`FileGroup`]: The compilation group of a file, each member paired with
//!   its output path.
//! - [`BuildOptions`]: Everything a [`BuildProcessFactory`](crate::process::BuildProcessFactory)
//!   needs to start an incremental compile process.
//! - [`RebuildReport`]: Per-process outcomes of a rebuild fan-out.

mod build;
mod project;

pub use build::*;
pub use project::*;
