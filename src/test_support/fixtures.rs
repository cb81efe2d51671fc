//! Service descriptor fixtures.

/// One Rust function on aws, no build settings.
pub const SINGLE_RUST_SERVICE: &str = r#"
service: hello
provider:
  name: aws
functions:
  hello:
    handler: hello
    runtime: rust
"#;

/// Rust functions by default, one node function, and build settings.
///
/// `api` inherits the default runtime, `worker` names its binary explicitly.
pub const MIXED_SERVICE: &str = r#"
service: mixed
provider:
  name: aws
  runtime: rust
custom:
  rust:
    cargoFlags: "--locked"
    dockerTag: "0.4.0"
functions:
  api:
    handler: app.api
  worker:
    handler: app.worker
    runtime: rust
    rust:
      binary: jobs
  web:
    handler: index.handler
    runtime: nodejs18.x
"#;

/// A supported provider with no Rust functions.
pub const NO_RUST_SERVICE: &str = r#"
service: web
provider:
  name: aws
  runtime: nodejs18.x
functions:
  web:
    handler: index.handler
"#;

/// A Rust function on a provider builds do not run for.
pub const OTHER_PROVIDER_SERVICE: &str = r#"
service: elsewhere
provider:
  name: azure
functions:
  hello:
    handler: hello
    runtime: rust
"#;
