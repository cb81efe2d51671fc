//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use sls_rust::ops::{Hook, HostVersion};

/// sls-rust - Build Rust functions for serverless deployments
#[derive(Parser)]
#[command(name = "sls-rust")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the service's Rust functions
    Build(BuildArgs),

    /// List the lifecycle hooks the build runs at
    Hooks(HooksArgs),

    /// Show the build toolchain that would be used
    Toolchain,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Directory to search for serverless.yml (defaults to current directory)
    #[arg(long)]
    pub service_dir: Option<PathBuf>,

    /// Build only this function
    #[arg(short, long)]
    pub function: Option<String>,

    /// Lifecycle hook the host is running; the build is skipped if the hook
    /// is not registered for the host version
    #[arg(long)]
    pub hook: Option<Hook>,

    /// Host pipeline version, e.g. 1.39.1
    #[arg(long, env = "SLS_HOST_VERSION")]
    pub host_version: Option<HostVersion>,

    /// Extra cargo flags
    #[arg(long)]
    pub cargo_flags: Option<String>,

    /// Cargo package to build
    #[arg(short = 'p', long)]
    pub cargo_package: Option<String>,

    /// Build profile (`dev` builds debug)
    #[arg(long)]
    pub profile: Option<String>,

    /// Tag half of the build image reference
    #[arg(long)]
    pub docker_tag: Option<String>,

    /// Image half of the build image reference
    #[arg(long)]
    pub docker_image: Option<String>,

    /// Directory mounted as the build source
    #[arg(long)]
    pub docker_path: Option<PathBuf>,

    /// Build with the local cargo toolchain instead of docker
    #[arg(long)]
    pub dockerless: bool,

    /// Print the build plan as JSON without building
    #[arg(long)]
    pub plan: bool,

    /// Print the build result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct HooksArgs {
    /// Host pipeline version, e.g. 1.39.1
    #[arg(long, env = "SLS_HOST_VERSION")]
    pub host_version: Option<HostVersion>,

    /// Print hooks as a JSON array
    #[arg(long)]
    pub json: bool,
}
