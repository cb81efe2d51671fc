//! Service descriptors.
//!
//! A service is the host pipeline's description of what it deploys:
//! a provider, a set of functions and a `custom.rust` section for build
//! settings. This module reads the host's `serverless.yml` (or `.yaml` /
//! `.json`) into the typed [`Service`] model the build operates on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::core::unit::BuildUnit;
use crate::util::config::BuildConfigOverrides;
use crate::util::fs;

/// Descriptor file names, in lookup order.
pub const DESCRIPTOR_NAMES: &[&str] = &["serverless.yml", "serverless.yaml", "serverless.json"];

/// Error locating a service descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("could not find serverless.yml in `{}` or any parent directory", dir.display())]
    NotFound { dir: PathBuf },
}

/// Find the service descriptor starting from `dir` and searching upward.
pub fn find_descriptor(dir: &Path) -> Result<PathBuf, DescriptorError> {
    let mut current = dir.to_path_buf();
    loop {
        for name in DESCRIPTOR_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        if !current.pop() {
            return Err(DescriptorError::NotFound {
                dir: dir.to_path_buf(),
            });
        }
    }
}

/// Deployment provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    /// Provider name, e.g. `aws`
    pub name: String,

    /// Service-wide default runtime
    pub runtime: Option<String>,
}

/// A loaded service.
#[derive(Debug, Clone)]
pub struct Service {
    /// Directory containing the descriptor
    root: PathBuf,

    /// Descriptor the service was read from, if any
    descriptor: Option<PathBuf>,

    /// Provider settings
    pub provider: Provider,

    /// Declared functions, ordered by name
    pub units: Vec<BuildUnit>,

    /// Build settings from `custom.rust`
    pub rust: BuildConfigOverrides,
}

impl Service {
    /// Create a service from parts.
    pub fn new(root: impl Into<PathBuf>, provider: Provider, units: Vec<BuildUnit>) -> Self {
        Service {
            root: root.into(),
            descriptor: None,
            provider,
            units,
            rust: BuildConfigOverrides::default(),
        }
    }

    /// Load a service from a descriptor file. The format follows the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let root = path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let descriptor: ServiceDescriptor = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse service descriptor: {}", path.display()))?,
            _ => serde_yaml::from_str(&contents)
                .with_context(|| format!("failed to parse service descriptor: {}", path.display()))?,
        };

        let mut service = descriptor.into_service(root);
        service.descriptor = Some(path.to_path_buf());
        tracing::debug!(
            "loaded {} function(s) from {}",
            service.units.len(),
            path.display()
        );
        Ok(service)
    }

    /// Parse a YAML descriptor rooted at `root`.
    pub fn from_yaml(root: impl Into<PathBuf>, yaml: &str) -> Result<Self> {
        let descriptor: ServiceDescriptor =
            serde_yaml::from_str(yaml).context("failed to parse service descriptor")?;
        Ok(descriptor.into_service(root.into()))
    }

    /// Get the service root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the descriptor path, if the service was loaded from disk.
    pub fn descriptor_path(&self) -> Option<&Path> {
        self.descriptor.as_deref()
    }

    /// Service-wide default runtime.
    pub fn default_runtime(&self) -> Option<&str> {
        self.provider.runtime.as_deref()
    }

    /// Look up a unit by name.
    pub fn unit(&self, name: &str) -> Option<&BuildUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Names of all declared units.
    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }
}

/// Native descriptor shape. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct ServiceDescriptor {
    provider: ProviderDescriptor,
    #[serde(default)]
    functions: Option<BTreeMap<String, Option<FunctionDescriptor>>>,
    #[serde(default)]
    custom: Option<CustomDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ProviderDescriptor {
    name: String,
    #[serde(default)]
    runtime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionDescriptor {
    #[serde(default)]
    handler: Option<String>,
    #[serde(default)]
    runtime: Option<String>,
    #[serde(default)]
    rust: Option<FunctionRustDescriptor>,
    #[serde(default)]
    package: Option<FunctionPackageDescriptor>,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionRustDescriptor {
    #[serde(default)]
    binary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionPackageDescriptor {
    #[serde(default)]
    artifact: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomDescriptor {
    #[serde(default)]
    rust: Option<BuildConfigOverrides>,
}

impl ServiceDescriptor {
    fn into_service(self, root: PathBuf) -> Service {
        let default_runtime = self.provider.runtime.clone();

        let units = self
            .functions
            .unwrap_or_default()
            .into_iter()
            .map(|(name, function)| {
                let function = function.unwrap_or_default();
                let mut unit = BuildUnit::new(name, function.runtime, default_runtime.as_deref());
                unit.handler = function.handler;
                unit.binary = function.rust.and_then(|r| r.binary);
                unit.package_artifact = function.package.and_then(|p| p.artifact);
                unit
            })
            .collect();

        Service {
            root,
            descriptor: None,
            provider: Provider {
                name: self.provider.name,
                runtime: self.provider.runtime,
            },
            units,
            rust: self.custom.and_then(|c| c.rust).unwrap_or_default(),
        }
    }
}
