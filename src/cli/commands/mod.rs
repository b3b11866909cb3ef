//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `sync`: the lyrics run over a collection
//! - `fetch`: a single song by provider id
//! - `fix`: legacy timestamp upgrade of existing `.lrc` files

mod fetch;
mod fix;
mod sync;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

pub use fetch::cmd_fetch;
pub use fix::cmd_fix;
pub use sync::cmd_sync;

use crate::providers::ProviderKind;

/// Fetches synced lyrics for a tagged music collection
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch lyrics for every audio file in a collection
    Sync(SyncArgs),
    /// Fetch lyrics for a single song
    Fetch {
        /// The lyrics provider to use (genie, qq, qqm, qqmusic, vibe)
        #[arg(short = 'P', long, default_value = "genie")]
        provider: ProviderKind,
        /// Write the lyrics to PATH (default: <song title>.<ext> in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Provider song id, as found in the song's page URL
        song_id: u64,
    },
    /// Rewrite legacy [mm:ss:xx] timestamps in .lrc files to [mm:ss.xx]
    Fix {
        /// Path to the music collection
        collection_path: PathBuf,
    },
}

/// Options of the `sync` command
#[derive(Args)]
pub struct SyncArgs {
    /// Skip albums whose artist has no URL for the used provider
    #[arg(short = 'a', long)]
    pub check_artist: bool,
    /// Fetch lyrics without writing them to files
    #[arg(short = 'n', long)]
    pub dry_run: bool,
    /// Upgrade existing static lyrics to synced lyrics if possible
    #[arg(short, long)]
    pub upgrade: bool,
    /// Fetch lyrics for all tracks, even if they already have them.
    /// THIS WILL OVERWRITE EXISTING LYRICS FILES!
    #[arg(short, long)]
    pub force: bool,
    /// Skip instrumental tracks
    #[arg(short = 'I', long)]
    pub skip_instrumentals: bool,
    /// Write an HTML report of artists and releases missing provider URLs
    #[arg(
        short = 'R',
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = "report.html"
    )]
    pub report: Option<PathBuf>,
    /// The lyrics provider to use (default: genie, or the config file value)
    #[arg(short = 'P', long)]
    pub provider: Option<ProviderKind>,
    /// Number of files processed concurrently (default: 4)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,
    /// Registry web service root
    #[arg(long, env = "LYRIKS_REGISTRY_URL")]
    pub registry_url: Option<String>,
    /// Seconds between registry requests (custom registry only)
    #[arg(long)]
    pub rate_limit: Option<f64>,
    /// Path to the music collection
    pub collection_path: PathBuf,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Sync(args) => cmd_sync(&rt, args),
        Commands::Fetch {
            provider,
            output,
            song_id,
        } => cmd_fetch(&rt, *provider, output.as_deref(), *song_id),
        Commands::Fix { collection_path } => cmd_fix(collection_path),
    }
}
