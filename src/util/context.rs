//! Global context for build operations.
//!
//! Provides centralized access to the working directory, the user's home and
//! a snapshot of the environment variables the build reads. Taking the
//! snapshot once keeps argument assembly a pure function of its inputs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

/// Extra arguments appended to `docker run`, whitespace separated.
pub const DOCKER_ARGS_ENV: &str = "SLS_DOCKER_ARGS";

/// Override for the container CLI executable.
pub const DOCKER_CLI_ENV: &str = "SLS_DOCKER_CLI";

/// Override for the cargo home holding the registry and git caches.
pub const CARGO_HOME_ENV: &str = "CARGO_HOME";

/// Container CLI used when no override is set.
pub const DEFAULT_DOCKER_CLI: &str = "docker";

/// Snapshot of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment. Variables whose name or
    /// value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        Environment {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Build an environment from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Environment {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Extra docker arguments from `SLS_DOCKER_ARGS`, split on whitespace.
    pub fn docker_args(&self) -> Vec<String> {
        self.get(DOCKER_ARGS_ENV)
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Container CLI executable, `docker` unless overridden.
    pub fn docker_cli(&self) -> &str {
        self.get(DOCKER_CLI_ENV)
            .filter(|cli| !cli.is_empty())
            .unwrap_or(DEFAULT_DOCKER_CLI)
    }
}

/// Global context containing paths and environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// User home directory, if one could be determined
    home: Option<PathBuf>,

    /// Environment snapshot
    env: Environment,
}

impl GlobalContext {
    /// Create a new GlobalContext from the running process.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let home = BaseDirs::new().map(|b| b.home_dir().to_path_buf());

        Ok(GlobalContext {
            cwd,
            home,
            env: Environment::from_process(),
        })
    }

    /// Replace the environment snapshot.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Replace the home directory.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = Some(home);
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the environment snapshot.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Cargo home: `$CARGO_HOME`, else `~/.cargo`.
    pub fn cargo_home(&self) -> PathBuf {
        if let Some(home) = self.env.get(CARGO_HOME_ENV).filter(|h| !h.is_empty()) {
            return PathBuf::from(home);
        }

        match self.home {
            Some(ref home) => home.join(".cargo"),
            None => {
                tracing::warn!("could not determine home directory, using ./.cargo");
                PathBuf::from(".cargo")
            }
        }
    }

    /// Crate registry cache mounted into the build container.
    pub fn cargo_registry(&self) -> PathBuf {
        self.cargo_home().join("registry")
    }

    /// Git checkout cache mounted into the build container.
    pub fn cargo_downloads(&self) -> PathBuf {
        self.cargo_home().join("git")
    }
}
