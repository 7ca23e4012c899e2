// `chmod`/`lchown` have no safe std equivalent that avoids following a
// trailing symlink component; `libc` FFI is the only way to get that.
#![allow(unsafe_code)]

use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;

use rcore::{DirEntry, FileAttributeManager, Stat};

/// [`FileAttributeManager`] backed by real POSIX syscalls.
///
/// Every method operates on the path itself, never following a trailing
/// symlink component, matching the contract the trait documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnixFileAttributeManager;

impl UnixFileAttributeManager {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// `chown(2)` with `None` fields left unchanged, mirroring POSIX's `-1`
    /// sentinel convention. Uses `lchown` so a symlink's own ownership is
    /// changed rather than its target's.
    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        let current = self.stat(path)?;
        let new_uid = uid.unwrap_or(current.uid);
        let new_gid = gid.unwrap_or(current.gid);
        let c_path = cstring(path)?;
        let rc = unsafe { libc::lchown(c_path.as_ptr(), new_uid, new_gid) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

fn to_stat(meta: &fs::Metadata) -> Stat {
    Stat {
        mode: meta.mode(),
        size: meta.size(),
        mtime: meta.mtime(),
        uid: meta.uid(),
        gid: meta.gid(),
        nlink: meta.nlink() as u32,
        inode: meta.ino(),
    }
}

fn cstring(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))
}

impl FileAttributeManager for UnixFileAttributeManager {
    fn stat(&self, path: &Path) -> io::Result<Stat> {
        let meta = fs::symlink_metadata(path)?;
        Ok(to_stat(&meta))
    }

    fn stat_if_exists(&self, path: &Path) -> io::Result<Option<Stat>> {
        match fs::symlink_metadata(path) {
            Ok(meta) => Ok(Some(to_stat(&meta))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        if self.stat(path)?.is_symlink() {
            // No symlink-local chmod exists on POSIX; permission bits on
            // the link itself are never transferred.
            return Ok(());
        }
        let c_path = cstring(path)?;
        let rc = unsafe { libc::chmod(c_path.as_ptr(), mode as libc::mode_t) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn set_mtime(&self, path: &Path, mtime: SystemTime) -> io::Result<()> {
        let ft = FileTime::from_system_time(mtime);
        if self.stat(path)?.is_symlink() {
            filetime::set_symlink_file_times(path, ft, ft)
        } else {
            filetime::set_file_times(path, ft, ft)
        }
    }

    fn set_uid(&self, path: &Path, uid: u32) -> io::Result<()> {
        self.chown(path, Some(uid), None)
    }

    fn set_gid(&self, path: &Path, gid: u32) -> io::Result<()> {
        self.chown(path, None, Some(gid))
    }

    fn unlink(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn atomic_move(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn read_symlink(&self, path: &Path) -> io::Result<Vec<u8>> {
        Ok(fs::read_link(path)?.into_os_string().into_vec())
    }

    fn create_symlink(&self, link: &Path, target: &[u8]) -> io::Result<()> {
        let target_path: PathBuf = std::ffi::OsStr::from_bytes(target).into();
        std::os::unix::fs::symlink(target_path, link)
    }

    fn read_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(DirEntry {
                file_name: entry.file_name().as_bytes().to_vec(),
            });
        }
        Ok(entries)
    }
}
