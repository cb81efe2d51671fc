//! Runtime and provider identifiers.

/// Runtime identifier that marks a function as needing a Rust build.
pub const RUST_RUNTIME: &str = "rust";

/// Generic custom runtime substituted once a Rust function has been built.
pub const BASE_RUNTIME: &str = "provided.al2";

/// The only deployment provider builds run for.
pub const SUPPORTED_PROVIDER: &str = "aws";

/// Whether a runtime identifier is the one this crate builds.
pub fn is_rust_runtime(runtime: &str) -> bool {
    runtime == RUST_RUNTIME
}

/// Whether builds should run for the given provider.
pub fn is_supported_provider(provider: &str) -> bool {
    provider == SUPPORTED_PROVIDER
}
