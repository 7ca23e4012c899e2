use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use rcore::Stat;

/// What kind of filesystem object an entry represents.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink { target: Vec<u8> },
}

/// One file list entry: its path relative to the transfer root, its
/// traversal depth, and the attributes the wire format carries.
///
/// The path is kept as the raw bytes a directory read or the wire handed
/// us, not a UTF-8 string, so a non-UTF-8 name survives a walk-encode-decode
/// round trip unchanged.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileListEntry {
    path: Vec<u8>,
    depth: usize,
    is_root: bool,
    kind: FileKind,
    stat: Stat,
}

impl FileListEntry {
    #[must_use]
    pub fn new(path: impl AsRef<Path>, depth: usize, is_root: bool, kind: FileKind, stat: Stat) -> Self {
        Self {
            path: path.as_ref().as_os_str().as_bytes().to_vec(),
            depth,
            is_root,
            kind,
            stat,
        }
    }

    /// Builds an entry directly from the raw path-name bytes carried on the
    /// wire, without an intermediate UTF-8 conversion.
    #[must_use]
    pub fn from_raw_path(path: Vec<u8>, depth: usize, is_root: bool, kind: FileKind, stat: Stat) -> Self {
        Self { path, depth, is_root, kind, stat }
    }

    #[must_use]
    pub fn relative_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(&self.path))
    }

    /// The path-name's raw bytes, as they would be transmitted on the wire.
    #[must_use]
    pub fn relative_path_bytes(&self) -> &[u8] {
        &self.path
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    #[must_use]
    pub fn kind(&self) -> &FileKind {
        &self.kind
    }

    #[must_use]
    pub fn metadata(&self) -> &Stat {
        &self.stat
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, FileKind::Directory)
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, FileKind::Symlink { .. })
    }
}
