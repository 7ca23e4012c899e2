use rcore::RsyncError;

/// Errors specific to the daemon-side handshake.
///
/// Wire and I/O failures propagate as [`RsyncError`] via [`From`]; the
/// variants here are the module-lookup and authentication outcomes that
/// only make sense for a daemon.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("unknown module {0:?}")]
    UnknownModule(String),

    #[error("access denied")]
    AccessDenied,

    #[error(transparent)]
    Protocol(#[from] RsyncError),
}

pub type Result<T> = std::result::Result<T, DaemonError>;
