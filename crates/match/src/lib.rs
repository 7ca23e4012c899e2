#![deny(unsafe_code)]

//! Block matching and delta generation.
//!
//! [`DeltaSignatureIndex`] turns a received [`signature::FileSignature`]
//! into a rolling-checksum hash table; [`generate_delta`] scans new data
//! against it to produce a [`DeltaScript`]; [`apply_delta`] replays that
//! script against a basis file to reconstruct the target.

pub mod apply;
pub mod generate;
pub mod index;
pub mod token;

pub use apply::apply_delta;
pub use generate::generate_delta;
pub use index::{DeltaSignatureIndex, MatchCandidate};
pub use token::{DeltaScript, DeltaToken};
