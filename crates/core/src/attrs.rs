use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::identity::Identity;

/// Attributes of one directory entry as returned by the filesystem
/// collaborator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stat {
    pub mode: u32,
    pub size: u64,
    pub mtime: i64,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u32,
    pub inode: u64,
}

impl Stat {
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.mode & libc_consts::S_IFMT == libc_consts::S_IFDIR
    }

    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        self.mode & libc_consts::S_IFMT == libc_consts::S_IFLNK
    }

    #[must_use]
    pub const fn is_regular(&self) -> bool {
        self.mode & libc_consts::S_IFMT == libc_consts::S_IFREG
    }

    #[must_use]
    pub const fn hardlink_candidate(&self) -> bool {
        self.nlink > 1 && !self.is_dir()
    }
}

/// POSIX file-type bits, duplicated here (rather than pulled from `libc`) so
/// this crate stays usable on non-Unix hosts for pure protocol testing.
pub mod libc_consts {
    pub const S_IFMT: u32 = 0o170_000;
    pub const S_IFDIR: u32 = 0o040_000;
    pub const S_IFLNK: u32 = 0o120_000;
    pub const S_IFREG: u32 = 0o100_000;
}

/// Entries yielded by [`FileAttributeManager::read_directory`].
#[derive(Clone, Debug)]
pub struct DirEntry {
    pub file_name: Vec<u8>,
}

/// Abstract filesystem collaborator consumed by the Generator and Receiver
///. The core engine depends only on this trait; a concrete adapter
/// (see the `metadata` crate) supplies the real syscalls.
///
/// Implementations must not follow symlinks when the operation targets a
/// symlink itself (`stat_if_exists`, `set_*` on a path that is a symlink).
pub trait FileAttributeManager: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<Stat>;
    fn stat_if_exists(&self, path: &Path) -> io::Result<Option<Stat>>;
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
    fn set_mtime(&self, path: &Path, mtime: SystemTime) -> io::Result<()>;
    fn set_uid(&self, path: &Path, uid: u32) -> io::Result<()>;
    fn set_gid(&self, path: &Path, gid: u32) -> io::Result<()>;
    fn set_owner(&self, path: &Path, owner: &Identity) -> io::Result<()> {
        self.set_uid(path, owner.id)
    }
    fn set_group(&self, path: &Path, group: &Identity) -> io::Result<()> {
        self.set_gid(path, group.id)
    }
    fn unlink(&self, path: &Path) -> io::Result<()>;
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
    fn create_dir(&self, path: &Path) -> io::Result<()>;
    fn atomic_move(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn read_symlink(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn create_symlink(&self, link: &Path, target: &[u8]) -> io::Result<()>;
    fn read_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>>;
}
