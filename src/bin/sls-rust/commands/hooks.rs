//! `sls-rust hooks` command

use anyhow::Result;

use crate::cli::HooksArgs;
use sls_rust::ops::negotiate_hooks;

pub fn execute(args: HooksArgs) -> Result<()> {
    let hooks = negotiate_hooks(args.host_version);

    if args.json {
        println!("{}", serde_json::to_string(&hooks)?);
    } else {
        for hook in hooks {
            println!("{}", hook);
        }
    }

    Ok(())
}
