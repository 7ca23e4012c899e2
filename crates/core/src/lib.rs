#![deny(unsafe_code)]

//! Shared error taxonomy, environment, and collaborator traits for the
//! `rrsync` workspace.
//!
//! This crate has no dependency on the wire protocol, the file list, or any
//! filesystem adapter — every other crate in the workspace depends on it,
//! never the reverse. That keeps the `FileAttributeManager` contract usable by both the engine and its concrete, OS-specific
//! implementation without a cyclic dependency.

pub mod attrs;
pub mod auth;
pub mod env;
pub mod error;
pub mod identity;
pub mod message;
pub mod stats;

pub use attrs::{DirEntry, FileAttributeManager, Stat};
pub use auth::{AuthProvider, StaticAuth};
pub use env::Environment;
pub use error::{ExitCode, Result, RsyncError};
pub use identity::Identity;
pub use message::{Message, Role};
pub use stats::{format_stats, StatsSnapshot, TransferStats};
