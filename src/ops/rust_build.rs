//! Implementation of `sls-rust build`.
//!
//! One call builds every selected function in a single step:
//! select -> plan -> run -> rewrite. Function metadata is only touched
//! after the build reports success.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::{rewrite_units, ArtifactProfile, BuildPlan, BuildRunner, BuiltArtifact};
use crate::core::runtime::{is_supported_provider, RUST_RUNTIME};
use crate::core::{BuildUnit, Service};
use crate::ops::errors::BuildError;
use crate::util::config::{project_config_path, BuildConfig, BuildConfigOverrides};
use crate::util::fs::normalize_path;
use crate::util::GlobalContext;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Build only this function (all functions when unset)
    pub function: Option<String>,

    /// Command-line overrides, applied over the service's `custom.rust`
    pub overrides: BuildConfigOverrides,

    /// Host platform, as in `std::env::consts::OS` (current host when unset)
    pub platform: Option<String>,
}

/// What a build step did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildResult {
    /// The provider is not one builds run for
    Skipped { provider: String },

    /// Every selected function was built and rewritten
    Built(BuildReport),
}

/// Summary of a successful build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Resolved configuration
    pub config: BuildConfig,
    /// Directory the build ran against
    pub source_path: PathBuf,
    /// Service default runtime after rewriting
    pub provider_runtime: Option<String>,
    /// One entry per built function
    pub artifacts: Vec<BuiltArtifact>,
}

/// Select the functions that need a Rust build.
///
/// With `only` set, that function alone is considered. Errors if the
/// function is not declared, or if nothing selected uses the Rust runtime.
pub fn select_units(units: &[BuildUnit], only: Option<&str>) -> Result<Vec<String>, BuildError> {
    let candidates: Vec<&BuildUnit> = match only {
        Some(name) => {
            let unit = units.iter().find(|u| u.name == name).ok_or_else(|| {
                BuildError::UnknownFunction {
                    name: name.to_string(),
                    available: units.iter().map(|u| u.name.clone()).collect(),
                }
            })?;
            vec![unit]
        }
        None => units.iter().collect(),
    };

    let selected: Vec<String> = candidates
        .into_iter()
        .filter(|u| u.is_rust())
        .map(|u| u.name.clone())
        .collect();

    if selected.is_empty() {
        return Err(BuildError::NoMatchingUnits {
            runtime: RUST_RUNTIME.to_string(),
        });
    }

    Ok(selected)
}

/// Merge configuration layers for a service.
///
/// Precedence, lowest first: project config file, `custom.rust`, options.
pub fn resolve_config(service: &Service, opts: &BuildOptions) -> BuildConfig {
    let mut overrides = BuildConfigOverrides::load_or_default(&project_config_path(service.root()));
    overrides.merge(service.rust.clone());
    overrides.merge(opts.overrides.clone());
    BuildConfig::resolve(&overrides)
}

/// Plan the build for a service without running it.
///
/// Returns `Ok(None)` when the provider is not supported.
pub fn plan(
    service: &Service,
    ctx: &GlobalContext,
    opts: &BuildOptions,
) -> Result<Option<(BuildPlan, BuildConfig, Vec<String>)>, BuildError> {
    if !is_supported_provider(&service.provider.name) {
        return Ok(None);
    }

    let selected = select_units(&service.units, opts.function.as_deref())?;
    let config = resolve_config(service, opts);
    let source_path = normalize_path(&config.source_path(service.root()));

    let binaries = binaries_for(service, &selected);
    let platform = opts
        .platform
        .clone()
        .unwrap_or_else(|| std::env::consts::OS.to_string());

    let plan = BuildPlan::new(&config, ctx, &source_path, binaries, &platform);
    Ok(Some((plan, config, selected)))
}

/// Build the service's Rust functions and rewrite their metadata.
pub fn build(
    service: &mut Service,
    ctx: &GlobalContext,
    opts: &BuildOptions,
    runner: &mut dyn BuildRunner,
) -> Result<BuildResult, BuildError> {
    let Some((plan, config, selected)) = plan(service, ctx, opts)? else {
        tracing::debug!(
            "provider `{}` is not supported, skipping Rust build",
            service.provider.name
        );
        return Ok(BuildResult::Skipped {
            provider: service.provider.name.clone(),
        });
    };

    tracing::info!("Building {} Rust function(s): {}", selected.len(), selected.join(", "));
    tracing::debug!("{}", plan.invocation().display_command());

    let outcome = runner.run(&plan);
    if outcome.is_failure() {
        tracing::error!("Rust build encountered an error: {}", outcome);
        return Err(BuildError::BuildExecution {
            spawn_error: outcome.spawn_error,
            status: outcome.exit_status,
        });
    }

    let source_path = plan.invocation().working_paths().source_path.clone();
    let profile = ArtifactProfile::from_profile(config.profile.as_deref());
    let artifacts = rewrite_units(service, &selected, &source_path, profile);

    Ok(BuildResult::Built(BuildReport {
        config,
        source_path,
        provider_runtime: service.provider.runtime.clone(),
        artifacts,
    }))
}

/// Binary names for the selected units, in unit order without duplicates.
fn binaries_for(service: &Service, selected: &[String]) -> Vec<String> {
    let mut binaries: Vec<String> = Vec::new();
    for unit in service.units.iter().filter(|u| selected.contains(&u.name)) {
        let binary = unit.binary_name();
        if !binaries.iter().any(|b| b == binary) {
            binaries.push(binary.to_string());
        }
    }
    binaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildOutcome;
    use crate::test_support::{fixtures, RecordingRunner};
    use crate::util::context::{Environment, CARGO_HOME_ENV};

    fn context() -> GlobalContext {
        GlobalContext::new()
            .unwrap()
            .with_env(Environment::from_pairs([(CARGO_HOME_ENV, "/cargo")]))
    }

    fn service(yaml: &str) -> Service {
        Service::from_yaml("/srv/app", yaml).unwrap()
    }

    #[test]
    fn test_select_by_runtime() {
        let service = service(fixtures::MIXED_SERVICE);
        let selected = select_units(&service.units, None).unwrap();
        assert_eq!(selected, vec!["api", "worker"]);
    }

    #[test]
    fn test_select_single_function() {
        let service = service(fixtures::MIXED_SERVICE);
        assert_eq!(select_units(&service.units, Some("worker")).unwrap(), vec!["worker"]);

        let err = select_units(&service.units, Some("web")).unwrap_err();
        assert!(matches!(err, BuildError::NoMatchingUnits { .. }));

        let err = select_units(&service.units, Some("missing")).unwrap_err();
        assert!(matches!(err, BuildError::UnknownFunction { .. }));
    }

    #[test]
    fn test_aws_single_rust_function_scenario() {
        let mut service = service(fixtures::SINGLE_RUST_SERVICE);
        let mut runner = RecordingRunner::new(BuildOutcome::success());

        let result = build(&mut service, &context(), &BuildOptions::default(), &mut runner).unwrap();

        let plan = runner.single_plan();
        let args = plan.invocation().arguments();
        assert!(!args.iter().any(|a| a.starts_with("PROFILE=")));
        assert!(!args.iter().any(|a| a.contains("-p ")));
        assert_eq!(args.last().map(String::as_str), Some("latest:softprops/lambda-rust"));

        let BuildResult::Built(report) = result else {
            panic!("expected a build");
        };
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(
            report.artifacts[0].artifact,
            PathBuf::from("/srv/app/target/lambda/release/hello.zip")
        );
        assert_eq!(report.artifacts[0].runtime, "provided.al2");
        assert_eq!(
            service.unit("hello").unwrap().declared_runtime.as_deref(),
            Some("provided.al2")
        );
    }

    #[test]
    fn test_other_provider_is_noop() {
        let mut service = service(fixtures::OTHER_PROVIDER_SERVICE);
        let mut runner = RecordingRunner::new(BuildOutcome::success());

        let result = build(&mut service, &context(), &BuildOptions::default(), &mut runner).unwrap();

        assert!(matches!(result, BuildResult::Skipped { ref provider } if provider == "azure"));
        assert!(runner.plans().is_empty());
    }

    #[test]
    fn test_no_rust_functions_fails_before_build() {
        let mut service = service(fixtures::NO_RUST_SERVICE);
        let mut runner = RecordingRunner::new(BuildOutcome::success());

        let err = build(&mut service, &context(), &BuildOptions::default(), &mut runner).unwrap_err();

        assert!(matches!(err, BuildError::NoMatchingUnits { ref runtime } if runtime == "rust"));
        assert!(runner.plans().is_empty());
    }

    #[test]
    fn test_failed_build_leaves_metadata_alone() {
        let mut service = service(fixtures::MIXED_SERVICE);
        let before = service.units.clone();
        let mut runner = RecordingRunner::new(BuildOutcome::exited(101));

        let err = build(&mut service, &context(), &BuildOptions::default(), &mut runner).unwrap_err();

        assert!(matches!(
            err,
            BuildError::BuildExecution {
                status: Some(101),
                spawn_error: None
            }
        ));
        assert_eq!(service.units, before);
        assert_eq!(service.default_runtime(), Some("rust"));
    }

    #[test]
    fn test_spawn_error_is_surfaced() {
        let mut service = service(fixtures::SINGLE_RUST_SERVICE);
        let mut runner = RecordingRunner::new(BuildOutcome::spawn_failed("docker: not found"));

        let err = build(&mut service, &context(), &BuildOptions::default(), &mut runner).unwrap_err();
        assert!(err.to_string().contains("docker: not found"));
        assert!(service.unit("hello").unwrap().package_artifact.is_none());
    }

    #[test]
    fn test_mixed_service_rewrites_rust_units_only() {
        let mut service = service(fixtures::MIXED_SERVICE);
        let mut runner = RecordingRunner::new(BuildOutcome::success());
        let opts = BuildOptions {
            overrides: BuildConfigOverrides {
                profile: Some("dev".to_string()),
                cargo_package: Some("app".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        build(&mut service, &context(), &opts, &mut runner).unwrap();

        let args = runner.single_plan().invocation().arguments().to_vec();
        assert!(args.contains(&"PROFILE=dev".to_string()));
        assert!(args.contains(&"CARGO_FLAGS=--locked -p app".to_string()));

        assert_eq!(
            service.unit("api").unwrap().package_artifact,
            Some(PathBuf::from("/srv/app/target/lambda/debug/api.zip"))
        );
        assert_eq!(
            service.unit("worker").unwrap().package_artifact,
            Some(PathBuf::from("/srv/app/target/lambda/debug/jobs.zip"))
        );
        assert!(service.unit("web").unwrap().package_artifact.is_none());
        assert_eq!(service.default_runtime(), Some("provided.al2"));
    }

    #[test]
    fn test_dockerless_plan_lists_binaries() {
        let service = service(fixtures::MIXED_SERVICE);
        let opts = BuildOptions {
            overrides: BuildConfigOverrides {
                dockerless: Some(true),
                ..Default::default()
            },
            platform: Some("linux".to_string()),
            ..Default::default()
        };

        let (plan, _, _) = plan(&service, &context(), &opts).unwrap().unwrap();
        let BuildPlan::Local(local) = plan else {
            panic!("expected a local plan");
        };
        assert_eq!(local.binaries, vec!["api", "jobs"]);
        assert_eq!(
            local.invocation.arguments(),
            &["build", "--release", "--target", "x86_64-unknown-linux-musl", "--locked"]
        );
    }

    #[test]
    fn test_options_override_service_config() {
        let service = service(fixtures::MIXED_SERVICE);
        let opts = BuildOptions {
            overrides: BuildConfigOverrides {
                cargo_flags: Some("--offline".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = resolve_config(&service, &opts);
        assert_eq!(config.cargo_flags, "--offline");
        assert_eq!(config.docker_tag, "0.4.0");
    }
}
