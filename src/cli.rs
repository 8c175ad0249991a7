use crate::command::CargoCommand;
use clap::Parser;

#[derive(Parser)]
#[command(name = "cargo-inject", bin_name = "cargo", version)]
pub struct CargoCli {
    #[command(subcommand)]
    pub command: CargoCommand,
}
