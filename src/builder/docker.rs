//! `docker run` argument assembly for the lambda build image.
//!
//! The build image reads its settings from environment variables: `PROFILE`
//! picks the cargo profile and `CARGO_FLAGS` is appended to `cargo build`.
//! The source tree and both cargo caches are bind mounted so repeated builds
//! reuse downloaded crates.

use crate::builder::plan::WorkingPaths;
use crate::util::config::BuildConfig;
use crate::util::context::Environment;

/// Source mount point inside the build image.
pub const CONTAINER_CODE_PATH: &str = "/code";

/// Crate registry cache mount point inside the build image.
pub const CONTAINER_REGISTRY_PATH: &str = "/cargo/registry";

/// Git checkout cache mount point inside the build image.
pub const CONTAINER_GIT_PATH: &str = "/cargo/git";

/// Host variable forwarded into the container unchanged.
pub const PASSTHROUGH_ENV: &str = "CARGO_TERM_COLOR";

/// Assemble the arguments for the container CLI.
///
/// The result depends only on its inputs, and its order is stable:
/// fixed prefix, `SLS_DOCKER_ARGS`, `PROFILE`, `CARGO_FLAGS`, image.
pub fn docker_build_args(
    config: &BuildConfig,
    paths: &WorkingPaths,
    env: &Environment,
) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        "-t".to_string(),
        "-e".to_string(),
        PASSTHROUGH_ENV.to_string(),
        "-v".to_string(),
        mount(&paths.source_path.display().to_string(), CONTAINER_CODE_PATH),
        "-v".to_string(),
        mount(
            &paths.cargo_registry.display().to_string(),
            CONTAINER_REGISTRY_PATH,
        ),
        "-v".to_string(),
        mount(&paths.cargo_downloads.display().to_string(), CONTAINER_GIT_PATH),
    ];

    args.extend(env.docker_args());

    if let Some(ref profile) = config.profile {
        args.push("-e".to_string());
        args.push(format!("PROFILE={}", profile));
    }

    let cargo_flags = cargo_flags(&config.cargo_flags, config.cargo_package.as_deref());
    if !cargo_flags.is_empty() {
        args.push("-e".to_string());
        args.push(format!("CARGO_FLAGS={}", cargo_flags));
    }

    args.push(image_reference(config));

    args.retain(|arg| !arg.is_empty());
    args
}

/// Combine configured flags with package selection.
///
/// With a package and no flags the result is `" -p <package>"`; the leading
/// space is kept so the image appends it verbatim.
pub fn cargo_flags(flags: &str, package: Option<&str>) -> String {
    match package {
        Some(package) => format!("{} -p {}", flags, package),
        None => flags.to_string(),
    }
}

/// Image reference, `<tag>:<image>` in that order.
pub fn image_reference(config: &BuildConfig) -> String {
    format!("{}:{}", config.docker_tag, config.docker_image)
}

fn mount(host: &str, container: &str) -> String {
    format!("{}:{}", host, container)
}
