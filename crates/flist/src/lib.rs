#![deny(unsafe_code)]

//! Segmented, incremental file list generation and wire encoding.
//!
//! [`build_file_list`] walks a transfer root through the
//! [`rcore::FileAttributeManager`] collaborator into a sorted, depth-first
//! sequence of [`FileListEntry`] values; [`write_file_list`] and
//! [`read_file_list`] carry that sequence over a multiplexed channel.
//! [`FileList`] holds the sequence as it actually travels during a
//! transfer: a queue of [`Segment`]s, each covering a dense run of global
//! indices, deleted strictly in arrival order as their entries resolve.

extern crate rrsync_core as rcore;

pub mod entry;
pub mod error;
pub mod segment;
pub mod walker;
pub mod wire;

pub use entry::{FileKind, FileListEntry};
pub use error::FileListError;
pub use segment::{FileList, Segment};
pub use walker::build_file_list;
pub use wire::{read_file_list, write_file_list};
