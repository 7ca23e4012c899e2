use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error taxonomy shared by every layer of the engine.
///
/// Variants map one-to-one onto conceptual error *kinds* rather than onto
/// implementation details, so a caller can match on
/// `RsyncError::Protocol { .. }` regardless of which crate raised it.
#[derive(Debug, thiserror::Error)]
pub enum RsyncError {
    /// Underlying filesystem or socket failure.
    #[error("I/O error{}: {source}", path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    Io {
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },

    /// Unexpected end of the byte channel.
    #[error("unexpected end of stream")]
    Eof,

    /// A blocking call was interrupted, voluntarily or externally.
    #[error("operation cancelled")]
    Cancelled,

    /// The peer violated the wire contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Non-fatal, per-file transfer failure. The session continues.
    #[error("transfer error for {path}: {reason}")]
    ErrorXfer { path: PathBuf, reason: String },

    /// Unknown module, permission denied, or authentication failure.
    #[error("module error: {0}")]
    Module(String),

    /// Invalid option combination discovered during handshake.
    #[error("argument error: {0}")]
    Argument(String),

    /// A checksum header would exceed the addressable chunk count.
    #[error("checksum chunk count overflow for file of {size} bytes at block length {block_length}")]
    ChunkOverflow { size: u64, block_length: u32 },
}

impl RsyncError {
    /// Wraps an [`io::Error`] without an associated path.
    pub fn io(source: io::Error) -> Self {
        Self::Io { source, path: None }
    }

    /// Wraps an [`io::Error`] together with the path that produced it.
    pub fn io_at(source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
        }
    }

    /// Returns the [`ExitCode`] a process should exit with for this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io { .. } => ExitCode::FileIo,
            Self::Eof | Self::Protocol(_) => ExitCode::Protocol,
            Self::Cancelled => ExitCode::Signal,
            Self::ErrorXfer { .. } => ExitCode::Partial,
            Self::Module(_) => ExitCode::StartClient,
            Self::Argument(_) => ExitCode::Syntax,
            Self::ChunkOverflow { .. } => ExitCode::Protocol,
        }
    }
}

impl From<io::Error> for RsyncError {
    fn from(source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            return Self::Eof;
        }
        if source.kind() == io::ErrorKind::Interrupted {
            return Self::Cancelled;
        }
        Self::io(source)
    }
}

pub type Result<T> = std::result::Result<T, RsyncError>;

/// Process exit codes matching upstream rsync's `errcode.h` subset that this
/// engine can actually produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    Ok = 0,
    Syntax = 1,
    Protocol = 2,
    FileSelect = 3,
    StartClient = 5,
    FileIo = 11,
    StreamIo = 12,
    Signal = 20,
    Partial = 23,
}

impl ExitCode {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::Protocol => "protocol incompatibility",
            Self::FileSelect => "error selecting input/output files",
            Self::StartClient => "error starting client-server protocol",
            Self::FileIo => "error in file I/O",
            Self::StreamIo => "error in rsync protocol data stream",
            Self::Signal => "received SIGINT, SIGTERM, or SIGHUP",
            Self::Partial => "partial transfer",
        };
        write!(f, "{text}")
    }
}
