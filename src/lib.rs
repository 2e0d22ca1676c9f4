//! Incremental build sessions for multi-project source trees.
//!
//! Given any source file, a [`BuildSession`](session::BuildSession) finds the
//! project that owns it, makes sure an incremental compile process exists for
//! that project, and reports where the compiled output lands.

pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod paths;
pub mod process;
pub mod registry;
pub mod resolver;
pub mod session;

pub use error::{BuildError, ConfigError};
pub use session::BuildSession;
