#![deny(unsafe_code)]

//! Frame transport, index codec, and handshake primitives.
//!
//! - [`channel`] is the buffered little-endian byte channel every other
//!   layer reads and writes through.
//! - [`multiplex`] layers tagged `DATA`/out-of-band framing over a channel.
//! - [`codec`] is the variable-length index codec used for file-list and
//!   checksum-header references.
//! - [`version`] drives the ASCII greeting, compat-flag, and checksum-seed
//!   handshake.
//! - [`message`] enumerates the wire message codes the other modules share.

extern crate rrsync_core as rcore;

pub mod channel;
pub mod codec;
pub mod error;
pub mod message;
pub mod multiplex;
pub mod version;

pub use channel::BufferedChannel;
pub use codec::{IndexDecoder, IndexEncoder};
pub use error::ProtocolError;
pub use message::MessageCode;
pub use multiplex::{MessageHandler, MultiplexReader, MultiplexWriter, NullHandler, MAX_FRAME_LEN};
pub use version::{
    negotiate_version, read_args, read_checksum_seed, read_compat_flags, read_greeting,
    write_args, write_checksum_seed, write_compat_flags, write_greeting, CompatFlags,
    MAX_PROTOCOL_VERSION, MIN_PROTOCOL_VERSION,
};
