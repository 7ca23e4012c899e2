use thiserror::Error;

/// Failures while generating or reading a file's checksum header.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("failed to read source data: {0}")]
    Io(#[from] std::io::Error),

    #[error("source stream ended after {actual} bytes, expected {expected}")]
    Truncated { expected: u64, actual: u64 },

    #[error("source stream produced {actual} bytes of trailing data beyond the expected {expected}")]
    TrailingData { expected: u64, actual: u64 },
}

impl From<SignatureError> for rcore::RsyncError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Io(source) => rcore::RsyncError::io(source),
            other => rcore::RsyncError::Protocol(other.to_string()),
        }
    }
}
