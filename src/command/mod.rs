pub mod inject;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum CargoCommand {
    /// Inject a dependency line and feature block into every crate manifest.
    Inject(inject::InjectArgs),
}
