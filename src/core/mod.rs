//! Core data structures.
//!
//! - Runtime and provider identifiers
//! - Build units (functions)
//! - Services and the descriptor adapter

pub mod runtime;
pub mod service;
pub mod unit;

pub use runtime::{BASE_RUNTIME, RUST_RUNTIME, SUPPORTED_PROVIDER};
pub use service::{find_descriptor, DescriptorError, Provider, Service, DESCRIPTOR_NAMES};
pub use unit::BuildUnit;
