use std::path::PathBuf;

use thiserror::Error;

/// Failures while walking a directory tree, decoding a received entry, or
/// mutating the segmented file list.
#[derive(Debug, Error)]
pub enum FileListError {
    #[error("failed to read metadata for {path}: {source}")]
    Stat { path: PathBuf, source: std::io::Error },

    #[error("failed to read directory {path}: {source}")]
    ReadDir { path: PathBuf, source: std::io::Error },

    #[error("malformed file list entry: {0}")]
    Malformed(String),

    #[error("cannot delete the first segment: it still has {remaining} file(s) outstanding")]
    SegmentNotFinished { remaining: usize },

    #[error("file list has no segments to delete")]
    NoSegments,

    #[error("index {0} does not belong to any live segment")]
    UnknownIndex(i32),
}

impl From<FileListError> for rcore::RsyncError {
    fn from(err: FileListError) -> Self {
        match err {
            FileListError::Stat { path, source } | FileListError::ReadDir { path, source } => {
                rcore::RsyncError::io_at(source, path)
            }
            FileListError::Malformed(reason) => rcore::RsyncError::Protocol(reason),
            other => rcore::RsyncError::Protocol(other.to_string()),
        }
    }
}
