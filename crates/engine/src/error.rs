use thiserror::Error;

use checksums::ChunkOverflow;
use flist::FileListError;
use signature::SignatureError;

/// Failures raised while running the Sender, Generator, or Receiver role
///.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Protocol(#[from] rcore::RsyncError),

    #[error(transparent)]
    FileList(#[from] FileListError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    ChunkOverflow(#[from] ChunkOverflow),

    /// A file's reconstruction failed its whole-file digest check on every
    /// retry.
    #[error("checksum verification failed for file index {index} after {attempts} attempts")]
    VerificationFailed { index: i32, attempts: u32 },
}

impl From<EngineError> for rcore::RsyncError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Protocol(e) => e,
            EngineError::FileList(e) => e.into(),
            EngineError::Signature(e) => e.into(),
            EngineError::ChunkOverflow(e) => rcore::RsyncError::Protocol(e.to_string()),
            EngineError::VerificationFailed { index, attempts } => rcore::RsyncError::ErrorXfer {
                path: index.to_string().into(),
                reason: format!("checksum verification failed after {attempts} attempts"),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
