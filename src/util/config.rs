//! Build configuration.
//!
//! Configuration is layered, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. Project config: `.sls-rust/config.toml` (`[build]` table)
//! 3. The service descriptor's `custom.rust` section
//! 4. Command-line flags
//!
//! Every layer is a [`BuildConfigOverrides`]; they are merged and then
//! resolved once into an immutable [`BuildConfig`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default tag half of the image reference.
pub const DEFAULT_DOCKER_TAG: &str = "latest";

/// Default build image.
pub const DEFAULT_DOCKER_IMAGE: &str = "softprops/lambda-rust";

/// The profile name that selects debug output.
pub const DEV_PROFILE: &str = "dev";

/// Caller-supplied configuration, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfigOverrides {
    /// Extra flags handed to cargo inside the build image
    pub cargo_flags: Option<String>,

    /// Tag half of the image reference
    pub docker_tag: Option<String>,

    /// Image half of the image reference
    pub docker_image: Option<String>,

    /// Build with the local cargo toolchain instead of docker
    pub dockerless: Option<bool>,

    /// Directory mounted as the build source (defaults to the service root)
    pub docker_path: Option<PathBuf>,

    /// Cargo package to build (`-p`)
    pub cargo_package: Option<String>,

    /// Build profile; `dev` builds debug, anything else release
    pub profile: Option<String>,
}

impl BuildConfigOverrides {
    /// Load overrides from the `[build]` table of a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let file: ProjectConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        Ok(file.build)
    }

    /// Load overrides with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another layer into this one (other takes precedence).
    pub fn merge(&mut self, other: BuildConfigOverrides) {
        if other.cargo_flags.is_some() {
            self.cargo_flags = other.cargo_flags;
        }
        if other.docker_tag.is_some() {
            self.docker_tag = other.docker_tag;
        }
        if other.docker_image.is_some() {
            self.docker_image = other.docker_image;
        }
        if other.dockerless.is_some() {
            self.dockerless = other.dockerless;
        }
        if other.docker_path.is_some() {
            self.docker_path = other.docker_path;
        }
        if other.cargo_package.is_some() {
            self.cargo_package = other.cargo_package;
        }
        if other.profile.is_some() {
            self.profile = other.profile;
        }
    }
}

/// On-disk shape of `.sls-rust/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProjectConfig {
    build: BuildConfigOverrides,
}

/// Get the project config path (`.sls-rust/config.toml`).
pub fn project_config_path(service_root: &Path) -> PathBuf {
    service_root.join(".sls-rust").join("config.toml")
}

/// Fully resolved build configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub cargo_flags: String,
    pub docker_tag: String,
    pub docker_image: String,
    pub dockerless: bool,
    pub docker_path: Option<PathBuf>,
    pub cargo_package: Option<String>,
    pub profile: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            cargo_flags: String::new(),
            docker_tag: DEFAULT_DOCKER_TAG.to_string(),
            docker_image: DEFAULT_DOCKER_IMAGE.to_string(),
            dockerless: false,
            docker_path: None,
            cargo_package: None,
            profile: None,
        }
    }
}

impl BuildConfig {
    /// Apply overrides onto the defaults.
    ///
    /// Empty tag or image overrides are ignored so the image reference is
    /// never half blank. Empty package and profile strings count as unset.
    pub fn resolve(overrides: &BuildConfigOverrides) -> Self {
        let defaults = BuildConfig::default();

        BuildConfig {
            cargo_flags: overrides.cargo_flags.clone().unwrap_or(defaults.cargo_flags),
            docker_tag: non_empty(overrides.docker_tag.as_deref())
                .unwrap_or(defaults.docker_tag),
            docker_image: non_empty(overrides.docker_image.as_deref())
                .unwrap_or(defaults.docker_image),
            dockerless: overrides.dockerless.unwrap_or(defaults.dockerless),
            docker_path: overrides.docker_path.clone(),
            cargo_package: non_empty(overrides.cargo_package.as_deref()),
            profile: non_empty(overrides.profile.as_deref()),
        }
    }

    /// Directory the build runs against: `docker_path` resolved against the
    /// service root, or the service root itself.
    pub fn source_path(&self, service_root: &Path) -> PathBuf {
        match self.docker_path {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => service_root.join(path),
            None => service_root.to_path_buf(),
        }
    }

    /// Whether the configured profile selects a debug build.
    pub fn is_dev(&self) -> bool {
        self.profile.as_deref() == Some(DEV_PROFILE)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = BuildConfig::resolve(&BuildConfigOverrides::default());
        assert_eq!(config.cargo_flags, "");
        assert_eq!(config.docker_tag, "latest");
        assert_eq!(config.docker_image, "softprops/lambda-rust");
        assert!(!config.dockerless);
        assert!(config.docker_path.is_none());
        assert!(config.cargo_package.is_none());
        assert!(config.profile.is_none());
    }

    #[test]
    fn test_empty_tag_and_image_keep_defaults() {
        let overrides = BuildConfigOverrides {
            docker_tag: Some(String::new()),
            docker_image: Some(String::new()),
            cargo_package: Some(String::new()),
            ..Default::default()
        };

        let config = BuildConfig::resolve(&overrides);
        assert_eq!(config.docker_tag, DEFAULT_DOCKER_TAG);
        assert_eq!(config.docker_image, DEFAULT_DOCKER_IMAGE);
        assert!(config.cargo_package.is_none());
    }

    #[test]
    fn test_config_merge() {
        let mut base = BuildConfigOverrides {
            cargo_flags: Some("--features a".to_string()),
            profile: Some("dev".to_string()),
            ..Default::default()
        };

        base.merge(BuildConfigOverrides {
            cargo_flags: Some("--features b".to_string()),
            dockerless: Some(true),
            ..Default::default()
        });

        assert_eq!(base.cargo_flags.as_deref(), Some("--features b"));
        assert_eq!(base.profile.as_deref(), Some("dev")); // Not overridden
        assert_eq!(base.dockerless, Some(true));
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
cargoFlags = "--features fast"
dockerTag = "0.4.0-rust-1.70"
dockerless = true
"#,
        )
        .unwrap();

        let overrides = BuildConfigOverrides::load(&config_path).unwrap();
        assert_eq!(overrides.cargo_flags.as_deref(), Some("--features fast"));
        assert_eq!(overrides.docker_tag.as_deref(), Some("0.4.0-rust-1.70"));
        assert_eq!(overrides.dockerless, Some(true));
        assert!(overrides.docker_image.is_none());
    }

    #[test]
    fn test_config_load_or_default_on_broken_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[build\n").unwrap();

        assert_eq!(
            BuildConfigOverrides::load_or_default(&config_path),
            BuildConfigOverrides::default()
        );
    }

    #[test]
    fn test_source_path() {
        let root = Path::new("/srv/service");
        let mut config = BuildConfig::default();
        assert_eq!(config.source_path(root), PathBuf::from("/srv/service"));

        config.docker_path = Some(PathBuf::from(".."));
        assert_eq!(config.source_path(root), PathBuf::from("/srv/service/.."));

        config.docker_path = Some(PathBuf::from("/work"));
        assert_eq!(config.source_path(root), PathBuf::from("/work"));
    }

    #[test]
    fn test_is_dev() {
        let mut config = BuildConfig::default();
        assert!(!config.is_dev());

        config.profile = Some("dev".to_string());
        assert!(config.is_dev());

        config.profile = Some("release".to_string());
        assert!(!config.is_dev());
    }
}
