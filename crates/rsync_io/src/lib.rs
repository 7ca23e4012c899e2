#![deny(unsafe_code)]

//! Turns an already-open byte channel into the transport primitives a
//! session runs on: [`transport::FrameTransport`]
//! pairs a [`protocol::MultiplexReader`]/[`protocol::MultiplexWriter`]
//! split over independent read/write handles, [`pipe::pipe_pair`] supplies
//! the in-memory pipe used for local copies, and [`handshake`] runs the
//! version/argument/compat-flags/seed exchange shared by every session
//! kind.

extern crate rrsync_core as rcore;

pub mod combined;
pub mod handshake;
pub mod pipe;
pub mod split;
pub mod transport;

pub use handshake::{negotiate_session, HandshakeOptions, NegotiatedSession, Role};
pub use pipe::{pipe_pair, PipeReader, PipeWriter};
pub use split::{ReadHalf, WriteHalf};
pub use transport::FrameTransport;
