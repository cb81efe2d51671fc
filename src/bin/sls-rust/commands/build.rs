//! `sls-rust build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use sls_rust::builder::SystemRunner;
use sls_rust::core::{find_descriptor, Service, SUPPORTED_PROVIDER};
use sls_rust::ops::{self, negotiate_hooks, BuildOptions, BuildResult, ServiceError};
use sls_rust::util::config::BuildConfigOverrides;
use sls_rust::util::diagnostic::{self, Diagnostic};
use sls_rust::util::GlobalContext;

pub fn execute(args: BuildArgs, color: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;

    if let Some(hook) = args.hook {
        if !negotiate_hooks(args.host_version).contains(&hook) {
            tracing::info!("`{}` is not registered for this host version, skipping", hook);
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "hook_not_registered", "hook": hook })
                );
            }
            return Ok(());
        }
    }

    let dir = args
        .service_dir
        .clone()
        .unwrap_or_else(|| ctx.cwd().to_path_buf());
    let descriptor = find_descriptor(&dir)?;
    let mut service = Service::load(&descriptor)?;

    let opts = BuildOptions {
        function: args.function.clone(),
        overrides: overrides_from_args(&args),
        platform: None,
    };

    if args.plan {
        let plan = ops::plan(&service, &ctx, &opts)
            .map_err(|e| ServiceError::new(&descriptor, e))?
            .map(|(plan, _, _)| plan);
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let mut runner = SystemRunner::new();
    let result = ops::build(&mut service, &ctx, &opts, &mut runner)
        .map_err(|e| ServiceError::new(&descriptor, e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        BuildResult::Skipped { provider } => {
            let diag = Diagnostic::warning(format!("skipped Rust build for provider `{}`", provider))
                .with_context(format!("only `{}` services are built", SUPPORTED_PROVIDER));
            diagnostic::emit(&diag, color);
        }
        BuildResult::Built(report) => {
            for artifact in &report.artifacts {
                eprintln!(
                    "    Finished `{}` -> {}",
                    artifact.function,
                    artifact.artifact.display()
                );
            }
        }
    }

    Ok(())
}

fn overrides_from_args(args: &BuildArgs) -> BuildConfigOverrides {
    BuildConfigOverrides {
        cargo_flags: args.cargo_flags.clone(),
        docker_tag: args.docker_tag.clone(),
        docker_image: args.docker_image.clone(),
        dockerless: args.dockerless.then_some(true),
        docker_path: args.docker_path.clone(),
        cargo_package: args.cargo_package.clone(),
        profile: args.profile.clone(),
    }
}
