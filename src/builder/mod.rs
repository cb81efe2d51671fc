//! Rust function builds.
//!
//! This module plans the single build step for a service, runs it, and
//! rewrites function metadata once it succeeds.

pub mod artifact;
pub mod docker;
pub mod executor;
pub mod local;
pub mod plan;

pub use artifact::{artifact_path, rewrite_units, ArtifactProfile, BuiltArtifact};
pub use docker::docker_build_args;
pub use executor::{BuildOutcome, BuildRunner, SystemRunner};
pub use plan::{BuildInvocation, BuildPlan, LocalBuild, WorkingPaths};
