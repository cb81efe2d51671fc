//! Command implementations

pub mod build;
pub mod hooks;
pub mod toolchain;
