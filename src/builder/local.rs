//! Local (dockerless) builds with the host's cargo toolchain.
//!
//! Lambda runs Linux, so on hosts that can cross-compile to musl the build
//! targets `x86_64-unknown-linux-musl`. macOS and Windows need a musl-capable
//! linker configured through the environment. After cargo finishes, each
//! binary is zipped as an executable `bootstrap` entry, the layout the
//! custom runtime expects.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::builder::artifact::ArtifactProfile;
use crate::util::config::BuildConfig;
use crate::util::context::Environment;
use crate::util::fs;

/// The cargo executable.
pub const CARGO: &str = "cargo";

/// Target triple for lambda binaries.
pub const MUSL_TARGET: &str = "x86_64-unknown-linux-musl";

/// Host platforms (as in `std::env::consts::OS`) that build for musl.
pub const MUSL_PLATFORMS: &[&str] = &["linux", "macos", "windows"];

/// Entry name the custom runtime executes.
pub const BOOTSTRAP: &str = "bootstrap";

fn targets_musl(platform: &str) -> bool {
    MUSL_PLATFORMS.contains(&platform)
}

/// Arguments for `cargo`.
pub fn local_build_args(config: &BuildConfig, platform: &str) -> Vec<String> {
    let mut args = vec!["build".to_string()];

    if !config.is_dev() {
        args.push("--release".to_string());
    }

    if targets_musl(platform) {
        args.push("--target".to_string());
        args.push(MUSL_TARGET.to_string());
    }

    args.extend(config.cargo_flags.split_whitespace().map(str::to_string));

    if let Some(ref package) = config.cargo_package {
        args.push("-p".to_string());
        args.push(package.clone());
    }

    args
}

/// Variables set on top of the inherited environment.
///
/// macOS uses the `x86_64-linux-musl-gcc` cross linker and Windows uses
/// `rust-lld`; `RUSTFLAGS` keeps whatever the caller already had.
pub fn local_build_env(env: &Environment, platform: &str) -> BTreeMap<String, String> {
    let linker = match platform {
        "macos" => "x86_64-linux-musl-gcc",
        "windows" => "rust-lld",
        _ => return BTreeMap::new(),
    };

    let rustflags = format!("{} -Clinker={}", env.get("RUSTFLAGS").unwrap_or(""), linker);

    BTreeMap::from([
        ("RUSTFLAGS".to_string(), rustflags.trim_start().to_string()),
        ("TARGET_CC".to_string(), linker.to_string()),
        ("CC_x86_64_unknown_linux_musl".to_string(), linker.to_string()),
    ])
}

/// Directory cargo writes binaries to.
pub fn local_output_dir(source_path: &Path, profile: ArtifactProfile, platform: &str) -> PathBuf {
    let mut dir = source_path.join("target");
    if targets_musl(platform) {
        dir.push(MUSL_TARGET);
    }
    dir.join(profile.dir_name())
}

/// Zip each binary from `output_dir` into `<artifact_dir>/<binary>.zip`.
pub fn bundle_binaries(output_dir: &Path, artifact_dir: &Path, binaries: &[String]) -> Result<Vec<PathBuf>> {
    fs::ensure_dir(artifact_dir)?;

    binaries
        .iter()
        .map(|binary| {
            let source = output_dir.join(binary);
            let dest = artifact_dir.join(format!("{}.zip", binary));
            bundle_binary(&source, &dest)?;
            tracing::debug!("bundled {} -> {}", source.display(), dest.display());
            Ok(dest)
        })
        .collect()
}

/// Write `source` into a new zip at `dest` as an executable `bootstrap`.
pub fn bundle_binary(source: &Path, dest: &Path) -> Result<()> {
    let bytes = fs::read(source)?;

    let file = fs::create_file(dest)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().unix_permissions(0o755);

    zip.start_file(BOOTSTRAP, options)
        .with_context(|| format!("failed to start zip entry in {}", dest.display()))?;
    zip.write_all(&bytes)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    zip.finish()
        .with_context(|| format!("failed to finish {}", dest.display()))?;

    Ok(())
}
