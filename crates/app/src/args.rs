pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "byte-store")]
#[command(about = "Versioned, optionally encrypted byte records on a ledger")]
pub struct Args {
    /// Path to the byte-store directory (defaults to ~/.byte-store)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
