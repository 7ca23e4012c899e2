#![deny(unsafe_code)]

//! The Sender, Generator, and Receiver roles, plus the task executor that
//! wires them into a transfer session.
//!
//! [`generator`] walks a source file list against the destination tree and
//! decides what needs transferring; [`sender`] turns those decisions into a
//! delta stream against the matching source file; [`receiver`] replays that
//! stream into a temp file, verifies it, and renames it into place.
//! [`executor`] runs all three concurrently for a local copy.

extern crate rrsync_core as rcore;

pub mod error;
pub mod executor;
pub mod generator;
pub mod itemize;
pub mod options;
pub mod receiver;
pub mod sender;
pub mod uplink;
pub mod wire;

pub use error::{EngineError, Result};
pub use executor::{run_local_copy, ExecutorOptions};
pub use generator::Generator;
pub use itemize::{ItemizeFlags, ItemizeRecord};
pub use options::{FileSelection, GeneratorOptions, ReceiverOptions, SenderOptions};
pub use receiver::Receiver;
pub use sender::Sender;
pub use uplink::{ChannelUplink, ReceiverUplink, UplinkMessage};
