//! lyriks - fetches synced lyrics for a tagged music collection.
//!
//! Files are resolved to MusicBrainz releases through their tags, matched to
//! songs of a lyrics provider (Genie, QQ Music or Vibe) via the album links
//! attached to the release, and the lyrics are written next to each file as
//! `.lrc` (synced) or `.txt` (static).

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lyrics;
pub mod mapping;
pub mod model;
pub mod musicbrainz;
pub mod providers;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod scanner;
pub mod tags;
#[cfg(test)]
pub mod test_utils;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    let args = cli::Cli::parse();

    // Initialize logging
    let directive = if args.verbose { "lyriks=debug" } else { "lyriks=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    match cli::run_command(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<error::Error>()
                .map(error::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
