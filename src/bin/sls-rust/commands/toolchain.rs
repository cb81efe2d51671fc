//! `sls-rust toolchain` command

use anyhow::Result;

use sls_rust::builder::local::CARGO;
use sls_rust::util::process::find_executable;
use sls_rust::util::GlobalContext;

pub fn execute() -> Result<()> {
    let ctx = GlobalContext::new()?;
    let docker = ctx.env().docker_cli();

    println!("Toolchain:");
    println!();

    match find_executable(docker) {
        Some(path) => println!("  Container CLI: {}", path.display()),
        None => println!("  Container CLI: {} (not found)", docker),
    }

    match find_executable(CARGO) {
        Some(path) => println!("  Cargo:         {}", path.display()),
        None => println!("  Cargo:         not found (only needed for dockerless builds)"),
    }

    println!();
    println!("Caches:");
    println!("  Registry:      {}", ctx.cargo_registry().display());
    println!("  Git:           {}", ctx.cargo_downloads().display());

    Ok(())
}
