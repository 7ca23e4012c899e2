#![deny(unsafe_code)]

//! Daemon-side module listing and authentication.
//!
//! [`session::handle_connection`] runs the ASCII `@RSYNCD:` greeting,
//! module request (or `#list`), and `AUTHREQD` challenge-response exchange.
//! Everything after a module is granted — the binary compat-flags/seed
//! handshake and the Sender/Generator/Receiver transfer itself — is the
//! same code path a direct (non-daemon) connection uses, found in
//! `rsync_io` and `engine`.

extern crate rrsync_core as rcore;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod module;
pub mod session;

pub use auth::{ModuleAuthenticator, StaticModuleAuth};
pub use client::list_modules;
pub use config::DaemonConfig;
pub use error::{DaemonError, Result};
pub use module::ModuleConfig;
pub use session::{handle_connection, SessionOutcome};
