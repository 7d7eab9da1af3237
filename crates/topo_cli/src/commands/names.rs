//! Names command - Print the instance names a virtual machine expands into.

use anyhow::Result;
use clap::Args;

use topo_core::expand;

#[derive(Args)]
pub struct NamesArgs {
    /// Base name of the virtual machine
    #[arg(short, long)]
    pub name: String,

    /// Number of instances
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,
}

pub fn execute(args: NamesArgs) -> Result<()> {
    for name in expand(&args.name, args.count) {
        println!("{}", name);
    }
    Ok(())
}
