#![deny(unsafe_code)]

//! Rolling and strong checksum primitives used by the delta-transfer
//! algorithm.
//!
//! - [`rolling`] implements the Adler-32-style weak checksum (`rsum`) used
//!   for block matching.
//! - [`strong`] computes MD5 strong digests, seeded the way the protocol
//!   requires (`MD5(seed || bytes)`).
//! - [`policy`] derives the block length and digest length for a file from
//!   its size, following Design Note 2's formula.

pub mod policy;
pub mod rolling;
pub mod strong;

pub use policy::{BlockChecksumPolicy, ChunkOverflow, MAX_CHUNK_COUNT};
pub use rolling::{RollingChecksum, RollingError};
pub use strong::{block_digest, FileDigest, MAX_DIGEST_LEN, MIN_DIGEST_LEN};
