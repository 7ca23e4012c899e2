//! Command-line surface for `rrsync`.
//!
//! A deliberately small subset of upstream rsync's flags: the ones that map
//! onto what [`engine`] and [`daemon`] actually implement today. Unknown
//! long flags are rejected by `clap` rather than silently ignored.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rrsync", version, about = "A wire-compatible rsync engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Local copy source, when no subcommand is given.
    pub source: Option<PathBuf>,
    /// Local copy destination, when no subcommand is given.
    pub dest: Option<PathBuf>,

    /// Recurse into directories.
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Preserve modification times.
    #[arg(short = 't', long)]
    pub times: bool,

    /// Preserve permissions.
    #[arg(short = 'p', long)]
    pub perms: bool,

    /// Preserve owner (requires privileges for numeric_ids-less transfers).
    #[arg(short = 'o', long)]
    pub owner: bool,

    /// Preserve group.
    #[arg(short = 'g', long)]
    pub group: bool,

    /// Preserve symlinks as symlinks instead of skipping them.
    #[arg(short = 'l', long)]
    pub links: bool,

    /// Delete extraneous destination files not present on the source.
    #[arg(long)]
    pub delete: bool,

    /// Transfer files even when size and mtime already match.
    #[arg(long)]
    pub ignore_times: bool,

    /// Use numeric uid/gid values instead of resolving names.
    #[arg(long)]
    pub numeric_ids: bool,

    /// Print a summary of the transfer after it completes.
    #[arg(long)]
    pub stats: bool,

    /// Increase logging verbosity; repeatable.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Maximum times the receiver asks the sender to redo a file.
    #[arg(long, default_value_t = 2)]
    pub max_redo: u32,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run as a daemon, serving the given modules over TCP.
    Daemon {
        /// `NAME=PATH` pairs, one per exported module.
        #[arg(long = "module", value_name = "NAME=PATH")]
        modules: Vec<String>,
        /// Address to listen on.
        #[arg(long, default_value = "0.0.0.0:873")]
        address: String,
    },
    /// List the modules a daemon exports.
    List {
        /// Daemon address, `host:port`.
        address: String,
    },
    /// Run the server side of the handshake over stdin/stdout, as a remote
    /// shell would invoke it. No transfer is driven past the handshake;
    /// only local-copy sessions run a full Generator/Sender/Receiver today.
    Server {
        #[arg(long)]
        recursive: bool,
    },
}
