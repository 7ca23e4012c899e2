#![deny(unsafe_code)]

//! Per-file checksum header generation.
//!
//! [`generate_file_signature`] streams a file through [`checksums`]'s
//! rolling and strong digest primitives to produce a [`FileSignature`];
//! [`wire`] encodes and decodes that header over a [`protocol::BufferedChannel`].

extern crate rrsync_core as rcore;

pub mod block;
pub mod error;
pub mod file_signature;
pub mod wire;

pub use block::SignatureBlock;
pub use error::SignatureError;
pub use file_signature::{generate_file_signature, FileSignature};
pub use wire::{read_checksum_header, write_checksum_header};
