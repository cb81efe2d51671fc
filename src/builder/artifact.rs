//! Artifact paths and post-build metadata rewriting.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::runtime::{is_rust_runtime, BASE_RUNTIME};
use crate::core::Service;
use crate::util::config::DEV_PROFILE;

/// Which output directory a build lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactProfile {
    Debug,
    Release,
}

impl ArtifactProfile {
    /// `dev` selects debug; any other profile, or none, selects release.
    pub fn from_profile(profile: Option<&str>) -> Self {
        match profile {
            Some(DEV_PROFILE) => ArtifactProfile::Debug,
            _ => ArtifactProfile::Release,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            ArtifactProfile::Debug => "debug",
            ArtifactProfile::Release => "release",
        }
    }
}

/// `<source>/target/lambda/<debug|release>`
pub fn artifact_dir(source_path: &Path, profile: ArtifactProfile) -> PathBuf {
    source_path
        .join("target")
        .join("lambda")
        .join(profile.dir_name())
}

/// `<source>/target/lambda/<debug|release>/<binary>.zip`
pub fn artifact_path(source_path: &Path, profile: ArtifactProfile, binary: &str) -> PathBuf {
    artifact_dir(source_path, profile).join(format!("{}.zip", binary))
}

/// A unit after rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltArtifact {
    /// Function name
    pub function: String,
    /// Binary the artifact was built from
    pub binary: String,
    /// Artifact handed to packaging
    pub artifact: PathBuf,
    /// Runtime after rewriting
    pub runtime: String,
}

/// Point every selected unit at its prebuilt artifact and swap the Rust
/// runtime for the base runtime, on the units and on the service default.
///
/// Only call after a successful build. Units not named in `selected` are
/// left untouched.
pub fn rewrite_units(
    service: &mut Service,
    selected: &[String],
    source_path: &Path,
    profile: ArtifactProfile,
) -> Vec<BuiltArtifact> {
    let mut built = Vec::with_capacity(selected.len());

    for unit in service
        .units
        .iter_mut()
        .filter(|u| selected.contains(&u.name))
    {
        let binary = unit.binary_name().to_string();
        let artifact = artifact_path(source_path, profile, &binary);
        unit.package_artifact = Some(artifact.clone());

        if unit.declared_runtime.as_deref().is_some_and(is_rust_runtime) {
            unit.declared_runtime = Some(BASE_RUNTIME.to_string());
        }
        if is_rust_runtime(&unit.effective_runtime) {
            unit.effective_runtime = BASE_RUNTIME.to_string();
        }

        tracing::debug!("`{}` -> {}", unit.name, artifact.display());
        built.push(BuiltArtifact {
            function: unit.name.clone(),
            binary,
            artifact,
            runtime: unit.effective_runtime.clone(),
        });
    }

    if service.provider.runtime.as_deref().is_some_and(is_rust_runtime) {
        service.provider.runtime = Some(BASE_RUNTIME.to_string());
    }

    built
}
