//! Build units: the functions a service declares.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::runtime::is_rust_runtime;

/// A named deployable function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildUnit {
    /// Function name as declared in the descriptor
    pub name: String,

    /// Handler string, conventionally `<package>.<binary>` for Rust functions
    pub handler: Option<String>,

    /// Runtime declared on the function itself
    pub declared_runtime: Option<String>,

    /// Declared runtime, or the service-wide default when none is declared.
    /// Empty when neither is set.
    pub effective_runtime: String,

    /// Explicit binary name from the function's `rust.binary` setting
    pub binary: Option<String>,

    /// Prebuilt artifact handed to packaging
    pub package_artifact: Option<PathBuf>,
}

impl BuildUnit {
    /// Create a unit, resolving its effective runtime against the default.
    pub fn new(
        name: impl Into<String>,
        declared_runtime: Option<String>,
        default_runtime: Option<&str>,
    ) -> Self {
        let effective_runtime = declared_runtime
            .clone()
            .or_else(|| default_runtime.map(str::to_string))
            .unwrap_or_default();

        BuildUnit {
            name: name.into(),
            handler: None,
            declared_runtime,
            effective_runtime,
            binary: None,
            package_artifact: None,
        }
    }

    /// Set the handler.
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Set an explicit binary name.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Whether this unit needs a Rust build.
    pub fn is_rust(&self) -> bool {
        is_rust_runtime(&self.effective_runtime)
    }

    /// Name of the compiled binary for this unit.
    ///
    /// An explicit `binary` wins. Otherwise a `<package>.<binary>` handler
    /// yields its binary half, a plain handler is used as-is, and a unit
    /// without a handler falls back to its own name.
    pub fn binary_name(&self) -> &str {
        if let Some(ref binary) = self.binary {
            return binary;
        }

        match self.handler.as_deref() {
            Some(handler) => match handler.split_once('.') {
                Some((_, binary)) if !binary.is_empty() => binary,
                _ => handler,
            },
            None => &self.name,
        }
    }
}
