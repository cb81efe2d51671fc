//! sls-rust - Rust function builds for serverless deployments
//!
//! This crate provides the build step a deployment pipeline runs before
//! packaging: it picks the functions that use the Rust runtime, builds them
//! in one docker (or local cargo) invocation, and points each function at
//! its prebuilt lambda zip.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// Only available when compiling tests. Provides a recording build runner
/// and service descriptor fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{service::Service, unit::BuildUnit};

pub use ops::{BuildError, BuildOptions, BuildResult};
pub use util::context::GlobalContext;
