//! Lifecycle hooks the build step attaches to.
//!
//! The host calls the same build entry point at every hook it registers.
//! The local invoke hook is only registered for host versions 1.38 and 1.39.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::Serialize;
use thiserror::Error;

/// A host lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Hook {
    /// Before deployment artifacts are packaged
    PackageArtifacts,
    /// Before a single function is packaged for deployment
    DeployFunction,
    /// Before the offline emulator starts
    OfflineStart,
    /// Before the offline emulator initializes
    OfflineStartInit,
    /// Before a function is invoked locally
    InvokeLocal,
}

impl Hook {
    /// Every hook, in registration order.
    pub const ALL: [Hook; 5] = [
        Hook::PackageArtifacts,
        Hook::DeployFunction,
        Hook::OfflineStart,
        Hook::OfflineStartInit,
        Hook::InvokeLocal,
    ];

    /// Hooks registered regardless of host version.
    pub const BASE: [Hook; 4] = [
        Hook::PackageArtifacts,
        Hook::DeployFunction,
        Hook::OfflineStart,
        Hook::OfflineStartInit,
    ];

    /// The host's name for this hook.
    pub const fn name(self) -> &'static str {
        match self {
            Hook::PackageArtifacts => "before:package:createDeploymentArtifacts",
            Hook::DeployFunction => "before:deploy:function:packageFunction",
            Hook::OfflineStart => "before:offline:start",
            Hook::OfflineStartInit => "before:offline:start:init",
            Hook::InvokeLocal => "before:invoke:local:invoke",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Hook> for &'static str {
    fn from(hook: Hook) -> Self {
        hook.name()
    }
}

impl FromStr for Hook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .into_iter()
            .find(|hook| hook.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown hook '{}'; expected one of: {}",
                    s,
                    Hook::ALL.map(Hook::name).join(", ")
                )
            })
    }
}

/// Error parsing a host version string.
#[derive(Debug, Error)]
#[error("invalid host version `{input}`")]
pub struct InvalidHostVersion {
    pub input: String,
    #[source]
    pub source: semver::Error,
}

/// Major and minor version of the host pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostVersion {
    pub major: u64,
    pub minor: u64,
}

impl HostVersion {
    pub fn new(major: u64, minor: u64) -> Self {
        HostVersion { major, minor }
    }
}

impl From<&Version> for HostVersion {
    fn from(version: &Version) -> Self {
        HostVersion::new(version.major, version.minor)
    }
}

impl FromStr for HostVersion {
    type Err = InvalidHostVersion;

    /// Accepts full semver (`1.39.1`, `1.39.1-beta.2`) as well as a leading
    /// `v` and `major.minor` shorthand (`1.39`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('v');
        let padded = if trimmed.matches('.').count() == 1 {
            format!("{}.0", trimmed)
        } else {
            trimmed.to_string()
        };

        Version::parse(&padded)
            .map(|v| HostVersion::from(&v))
            .map_err(|source| InvalidHostVersion {
                input: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Minor versions of host 1.x that get the local invoke hook, `[start, end)`.
const INVOKE_HOOK_MINORS: std::ops::Range<u64> = 38..40;

/// Whether a host version gets the local invoke hook.
pub fn includes_invoke_hook(version: HostVersion) -> bool {
    version.major == 1 && INVOKE_HOOK_MINORS.contains(&version.minor)
}

/// Hooks to register for a host. An unknown version gets the base set.
pub fn negotiate_hooks(version: Option<HostVersion>) -> Vec<Hook> {
    let mut hooks = Hook::BASE.to_vec();
    if version.is_some_and(includes_invoke_hook) {
        hooks.push(Hook::InvokeLocal);
    }
    hooks
}
