//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod process;

pub use config::BuildConfig;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
