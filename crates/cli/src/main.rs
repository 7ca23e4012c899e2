//! `rrsync`: a thin command-line front end over [`engine`] and [`daemon`].
//!
//! Local-to-local copies run the full Generator/Sender/Receiver pipeline
//! from [`engine::run_local_copy`]. `daemon`/`list`/`server` drive the
//! `@RSYNCD:` handshake from [`daemon`] and [`rsync_io::negotiate_session`];
//! no cross-process transfer is wired up past the handshake yet, since
//! [`engine`]'s roles only run together inside one process today.

extern crate rrsync_core as rcore;

mod args;
mod daemon_config;
mod logging;

use std::io;
use std::net::{TcpListener, TcpStream};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use metadata::UnixFileAttributeManager;
use protocol::BufferedChannel;
use rsync_io::{negotiate_session, HandshakeOptions, Role};

use args::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match &cli.command {
        Some(Command::Daemon { modules, address }) => run_daemon(modules, address),
        Some(Command::List { address }) => run_list(address),
        Some(Command::Server { recursive }) => run_server(*recursive),
        None => run_local_copy(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rrsync: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_local_copy(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = cli.source.as_ref().ok_or("missing source argument")?;
    let dest = cli.dest.as_ref().ok_or("missing destination argument")?;

    let source_attrs = UnixFileAttributeManager;
    let dest_attrs = UnixFileAttributeManager;

    let options = engine::ExecutorOptions {
        generator: engine::GeneratorOptions {
            preserve_user: cli.owner,
            preserve_group: cli.group,
            preserve_links: cli.links,
            preserve_permissions: cli.perms,
            preserve_times: cli.times,
            numeric_ids: cli.numeric_ids,
            ignore_times: cli.ignore_times,
            always_itemize: false,
            delete: cli.delete,
            file_selection: if cli.recursive {
                engine::FileSelection::Recursive
            } else {
                engine::FileSelection::Single
            },
            verbosity: cli.verbose,
        },
        sender: engine::SenderOptions {
            preserve_links: cli.links,
            interruptible: true,
        },
        receiver: engine::ReceiverOptions {
            preserve_user: cli.owner,
            preserve_group: cli.group,
            preserve_permissions: cli.perms,
            preserve_times: cli.times,
            numeric_ids: cli.numeric_ids,
            defer_write: false,
            max_redo_attempts: cli.max_redo,
        },
        checksum_seed: generate_seed(),
    };

    let started = Instant::now();
    let entries = engine::run_local_copy(source, dest, &source_attrs, &dest_attrs, options)?;
    let elapsed = started.elapsed();

    if cli.stats {
        let stats = rcore::TransferStats::new();
        for entry in &entries {
            if !entry.is_root() {
                stats.add_file(entry.metadata().size);
            }
        }
        print!("{}", rcore::format_stats(&stats.snapshot(), elapsed));
    }

    Ok(())
}

fn generate_seed() -> i32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as i32)
        .unwrap_or(0)
}

fn run_daemon(module_specs: &[String], address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(daemon_config::parse_modules(module_specs)?);
    let listener = TcpListener::bind(address)?;
    tracing::info!(%address, modules = config.modules.len(), "daemon listening");

    for stream in listener.incoming() {
        let stream = stream?;
        let config = Arc::clone(&config);
        std::thread::spawn(move || {
            if let Err(err) = serve_connection(stream, &config) {
                tracing::warn!(%err, "daemon connection ended with an error");
            }
        });
    }
    Ok(())
}

fn serve_connection(stream: TcpStream, config: &daemon::DaemonConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut channel = BufferedChannel::new(stream);
    match daemon::handle_connection(&mut channel, config)? {
        daemon::SessionOutcome::Listed => Ok(()),
        daemon::SessionOutcome::ModuleGranted(module) => {
            tracing::info!(module = %module.name, "module granted, completing handshake");
            negotiate_session(&mut channel, Role::Server, &[], HandshakeOptions::default())?;
            Ok(())
        }
    }
}

fn run_list(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stream = TcpStream::connect(address)?;
    let mut channel = BufferedChannel::new(stream);
    for line in daemon::list_modules(&mut channel)? {
        println!("{line}");
    }
    Ok(())
}

fn run_server(recursive: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut channel = BufferedChannel::new(rsync_io::combined::Combined::new(stdin, stdout));
    negotiate_session(&mut channel, Role::Server, &[], HandshakeOptions { recursive })?;
    Ok(())
}
