#![deny(unsafe_code)]

//! Concrete [`rcore::FileAttributeManager`] implementation.
//!
//! The engine, flist walker, and receiver all depend on the trait from
//! `core`; this crate is the one place that actually calls into the
//! operating system on their behalf. Only [`unix`] exists today, matching
//! this crate's Unix-only scope for permissions, ownership, and symlinks.

#[cfg(unix)]
extern crate rrsync_core as rcore;

pub mod unix;

#[cfg(unix)]
pub use unix::UnixFileAttributeManager;
