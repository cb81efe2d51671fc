//! Build error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A fatal error that stops the build step.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    #[error(
        "no functions with the `{runtime}` runtime found; use `runtime: {runtime}` in either \
         the `provider` or `functions` section of the service"
    )]
    #[diagnostic(code(sls_rust::select::no_matching_units))]
    NoMatchingUnits { runtime: String },

    #[error("function `{name}` is not declared in the service")]
    #[diagnostic(code(sls_rust::select::unknown_function))]
    UnknownFunction { name: String, available: Vec<String> },

    #[error("Rust build failed: {}, exit status: {}", display_opt(.spawn_error), display_opt(.status))]
    #[diagnostic(code(sls_rust::build::failed))]
    BuildExecution {
        spawn_error: Option<String>,
        status: Option<i32>,
    },
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

impl BuildError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::NoMatchingUnits { runtime } => {
                Diagnostic::error(format!("no functions use the `{}` runtime", runtime))
                    .with_suggestion(suggestions::DECLARE_RUNTIME)
            }

            BuildError::UnknownFunction { name, available } => {
                let mut diag = Diagnostic::error(format!("function `{}` not found", name));
                if !available.is_empty() {
                    diag = diag.with_context(format!("available functions: {}", available.join(", ")));
                }
                diag.with_suggestion(suggestions::FUNCTION_NOT_FOUND)
            }

            BuildError::BuildExecution { spawn_error, status } => {
                let mut diag = Diagnostic::error("Rust build failed");
                if let Some(err) = spawn_error {
                    diag = diag.with_context(format!("error: {}", err));
                }
                if let Some(status) = status {
                    diag = diag.with_context(format!("exit status: {}", status));
                }

                if status.is_none() && spawn_error.is_some() {
                    diag.with_suggestion(suggestions::DOCKER_MISSING)
                } else {
                    diag.with_suggestion(suggestions::BUILD_FAILED)
                }
            }
        }
    }
}

/// A [`BuildError`] for the service read from `descriptor`.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ServiceError {
    pub descriptor: PathBuf,
    #[source]
    pub source: BuildError,
}

impl ServiceError {
    pub fn new(descriptor: impl Into<PathBuf>, source: BuildError) -> Self {
        ServiceError {
            descriptor: descriptor.into(),
            source,
        }
    }

    /// The build error's diagnostic. Selection errors point at the descriptor.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = self.source.to_diagnostic();
        match self.source {
            BuildError::BuildExecution { .. } => diag,
            BuildError::NoMatchingUnits { .. } | BuildError::UnknownFunction { .. } => {
                diag.with_location(self.descriptor.clone())
            }
        }
    }
}
