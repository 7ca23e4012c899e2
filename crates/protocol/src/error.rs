use thiserror::Error;

/// Failures specific to the frame-transport and handshake layer. These
/// compose into [`rcore::RsyncError::Protocol`] at the crate boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("multiplex tag carried unknown message code {0}")]
    UnknownMessageCode(u8),

    #[error("multiplex frame length {length} exceeds the {max} byte maximum")]
    FrameTooLarge { length: u32, max: u32 },

    #[error("index codec saw an out-of-range escape value {0}")]
    IndexOutOfRange(i64),

    #[error("peer greeting was not a well-formed @RSYNCD: line: {0:?}")]
    MalformedGreeting(String),

    #[error("unsupported protocol version {peer}; this implementation supports {min}-{max}")]
    UnsupportedVersion { peer: u32, min: u32, max: u32 },

    #[error("daemon authentication challenge was rejected")]
    AuthRejected,
}

impl From<ProtocolError> for rcore::RsyncError {
    fn from(err: ProtocolError) -> Self {
        rcore::RsyncError::Protocol(err.to_string())
    }
}
