//! tdedupe - Pause torrents whose content is already covered by a collection.
//!
//! Connects to a Transmission daemon, finds torrents that share a name,
//! picks the largest one as the collection and pauses the smaller episode torrents
//! whose files are already part of that collection.

mod config;
mod dedupe;
mod logger;
mod manifest;
mod stats;
mod transmission;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::dedupe::TorrentDedupe;

/// Pause episode torrents that are already included in a collection torrent.
///
/// Torrents with an identical name are grouped and the largest one is treated as the collection.
/// Smaller torrents whose files are found in the collection are paused.
/// Groups where every torrent has the same size are never touched.
#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Pause episode torrents already included in a collection torrent"
)]
pub struct Args {
    /// Transmission RPC host
    #[arg(short = 'H', long, name = "HOST")]
    host: Option<String>,

    /// Transmission RPC port
    #[arg(short = 'P', long, name = "PORT")]
    port: Option<u16>,

    /// Connect using HTTPS
    #[arg(short = 's', long)]
    https: bool,

    /// Transmission RPC username
    #[arg(short = 'u', long, name = "USER")]
    username: Option<String>,

    /// Transmission RPC password
    #[arg(short = 'w', long, name = "PASS")]
    password: Option<String>,

    /// Only process torrents whose name ends with one of these suffixes
    #[arg(short = 'x', long = "suffix", name = "SUFFIX", value_delimiter = ',')]
    suffixes: Vec<String>,

    /// Size difference in bytes that still counts as the same size
    #[arg(short = 't', long = "tolerance", name = "BYTES")]
    size_tolerance: Option<u64>,

    /// Fraction of episode files that must be found in the collection
    #[arg(short = 'm', long = "match-ratio", name = "RATIO")]
    min_match_ratio: Option<f64>,

    /// Extra episode marker patterns (regex)
    #[arg(short = 'g', long = "marker", num_args = 1, action = clap::ArgAction::Append, name = "PATTERN")]
    marker_patterns: Vec<String>,

    /// Number of attempts when fetching the torrent list
    #[arg(short = 'r', long, name = "COUNT")]
    retries: Option<u32>,

    /// Only print what would be paused
    #[arg(short = 'p', long)]
    dryrun: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    yes: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle shell completion generation
    if let Some(ref shell) = args.completion {
        torrent_dedupe::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        TorrentDedupe::new(args)?.run().await
    }
}
