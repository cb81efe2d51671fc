//! Build plan generation.
//!
//! A BuildPlan describes the single build step for a service: either a
//! `docker run` against the lambda build image, or a local `cargo build`
//! followed by bundling each binary into a lambda zip.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::artifact::{artifact_dir, ArtifactProfile};
use crate::builder::docker::docker_build_args;
use crate::builder::local::{local_build_args, local_build_env, local_output_dir, CARGO};
use crate::util::config::BuildConfig;
use crate::util::GlobalContext;

/// Host paths a build reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingPaths {
    /// Source tree to build
    pub source_path: PathBuf,
    /// Cargo crate registry cache
    pub cargo_registry: PathBuf,
    /// Cargo git checkout cache
    pub cargo_downloads: PathBuf,
}

impl WorkingPaths {
    /// Working paths for a source tree, with caches taken from the context.
    pub fn new(source_path: impl Into<PathBuf>, ctx: &GlobalContext) -> Self {
        WorkingPaths {
            source_path: source_path.into(),
            cargo_registry: ctx.cargo_registry(),
            cargo_downloads: ctx.cargo_downloads(),
        }
    }
}

/// A fully assembled command line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInvocation {
    executable: String,
    arguments: Vec<String>,
    working_paths: WorkingPaths,
}

impl BuildInvocation {
    pub fn new(
        executable: impl Into<String>,
        arguments: Vec<String>,
        working_paths: WorkingPaths,
    ) -> Self {
        BuildInvocation {
            executable: executable.into(),
            arguments,
            working_paths,
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn working_paths(&self) -> &WorkingPaths {
        &self.working_paths
    }

    /// Display the command for logs.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.executable.clone()];
        parts.extend(self.arguments.iter().cloned());
        parts.join(" ")
    }
}

/// A local cargo build plus the bundling that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBuild {
    /// The cargo command
    pub invocation: BuildInvocation,
    /// Variables set on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Where cargo leaves the compiled binaries
    pub output_dir: PathBuf,
    /// Where the lambda zips are written
    pub artifact_dir: PathBuf,
    /// Binaries to bundle, in unit order
    pub binaries: Vec<String>,
}

/// The build step for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildPlan {
    /// Build inside the lambda build image
    Docker(BuildInvocation),
    /// Build with the host's cargo toolchain
    Local(LocalBuild),
}

impl BuildPlan {
    /// Plan the build for the given configuration.
    ///
    /// `binaries` is only consulted by local builds, which bundle each binary
    /// themselves; the build image bundles everything it compiles.
    pub fn new(
        config: &BuildConfig,
        ctx: &GlobalContext,
        source_path: &Path,
        binaries: Vec<String>,
        platform: &str,
    ) -> Self {
        let paths = WorkingPaths::new(source_path, ctx);

        if config.dockerless {
            let args = local_build_args(config, platform);
            let profile = ArtifactProfile::from_profile(config.profile.as_deref());

            return BuildPlan::Local(LocalBuild {
                invocation: BuildInvocation::new(CARGO, args, paths),
                env: local_build_env(ctx.env(), platform),
                output_dir: local_output_dir(source_path, profile, platform),
                artifact_dir: artifact_dir(source_path, profile),
                binaries,
            });
        }

        let args = docker_build_args(config, &paths, ctx.env());
        BuildPlan::Docker(BuildInvocation::new(ctx.env().docker_cli(), args, paths))
    }

    /// The command this plan runs.
    pub fn invocation(&self) -> &BuildInvocation {
        match self {
            BuildPlan::Docker(invocation) => invocation,
            BuildPlan::Local(local) => &local.invocation,
        }
    }

    /// Whether this plan uses the local toolchain.
    pub fn is_local(&self) -> bool {
        matches!(self, BuildPlan::Local(_))
    }
}
