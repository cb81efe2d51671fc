//! High-level operations.
//!
//! This module contains the implementation of sls-rust commands.

pub mod errors;
pub mod hooks;
pub mod rust_build;

pub use errors::{BuildError, ServiceError};
pub use hooks::{negotiate_hooks, Hook, HostVersion};
pub use rust_build::{build, plan, select_units, BuildOptions, BuildReport, BuildResult};
