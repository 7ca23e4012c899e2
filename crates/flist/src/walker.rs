use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use rcore::FileAttributeManager;

use crate::entry::{FileKind, FileListEntry};
use crate::error::FileListError;

/// Walks a transfer root into a depth-first, lexicographically sorted
/// [`FileListEntry`] sequence.
///
/// The root itself is always the first entry, with `is_root` set and an
/// empty relative path. Symlinks are recorded as [`FileKind::Symlink`] but
/// never followed, matching the default (non `--copy-links`) behaviour.
pub fn build_file_list(
    root: &Path,
    attrs: &dyn FileAttributeManager,
) -> Result<Vec<FileListEntry>, FileListError> {
    let mut entries = Vec::new();
    let root_stat = attrs
        .stat(root)
        .map_err(|source| FileListError::Stat { path: root.to_path_buf(), source })?;

    let root_kind = classify(root, &root_stat, attrs)?;
    let is_dir = matches!(root_kind, FileKind::Directory);
    entries.push(FileListEntry::new(
        PathBuf::new(),
        0,
        true,
        root_kind,
        root_stat,
    ));

    if is_dir {
        walk_dir(root, Path::new(""), 1, attrs, &mut entries)?;
    }

    Ok(entries)
}

fn classify(
    path: &Path,
    stat: &rcore::Stat,
    attrs: &dyn FileAttributeManager,
) -> Result<FileKind, FileListError> {
    if stat.is_dir() {
        Ok(FileKind::Directory)
    } else if stat.is_symlink() {
        let target = attrs
            .read_symlink(path)
            .map_err(|source| FileListError::Stat { path: path.to_path_buf(), source })?;
        Ok(FileKind::Symlink { target })
    } else {
        Ok(FileKind::Regular)
    }
}

fn walk_dir(
    abs_dir: &Path,
    rel_dir: &Path,
    depth: usize,
    attrs: &dyn FileAttributeManager,
    entries: &mut Vec<FileListEntry>,
) -> Result<(), FileListError> {
    let mut names: Vec<Vec<u8>> = attrs
        .read_directory(abs_dir)
        .map_err(|source| FileListError::ReadDir { path: abs_dir.to_path_buf(), source })?
        .into_iter()
        .map(|e| e.file_name)
        .collect();
    names.sort();

    for name in names {
        let os_name = OsStr::from_bytes(&name);
        let abs_path = abs_dir.join(os_name);
        let rel_path = rel_dir.join(os_name);

        let stat = attrs
            .stat(&abs_path)
            .map_err(|source| FileListError::Stat { path: abs_path.clone(), source })?;
        let kind = classify(&abs_path, &stat, attrs)?;
        let is_dir = matches!(kind, FileKind::Directory);

        entries.push(FileListEntry::new(rel_path.clone(), depth, false, kind, stat));

        if is_dir {
            walk_dir(&abs_path, &rel_path, depth + 1, attrs, entries)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata::UnixFileAttributeManager;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn walks_nested_directories_in_sorted_depth_first_order() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir(root.join("b_dir")).expect("mkdir b_dir");
        fs::write(root.join("a.txt"), b"a").expect("write a.txt");
        fs::write(root.join("b_dir/z.txt"), b"z").expect("write z.txt");
        fs::write(root.join("b_dir/y.txt"), b"y").expect("write y.txt");
        fs::write(root.join("c.txt"), b"c").expect("write c.txt");

        let attrs = UnixFileAttributeManager::new();
        let entries = build_file_list(root, &attrs).expect("build_file_list");

        let names: Vec<String> = entries
            .iter()
            .map(|e| e.relative_path().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["", "a.txt", "b_dir", "b_dir/y.txt", "b_dir/z.txt", "c.txt"]
        );
        assert!(entries[0].is_root());
        assert!(entries.iter().skip(1).all(|e| !e.is_root()));
    }

    #[test]
    fn root_that_is_a_plain_file_yields_a_single_entry() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("solo.txt");
        fs::write(&path, b"solo").expect("write");

        let attrs = UnixFileAttributeManager::new();
        let entries = build_file_list(&path, &attrs).expect("build_file_list");

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_root());
        assert!(!entries[0].is_directory());
    }

    #[test]
    fn symlinks_are_recorded_but_not_followed() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir(root.join("real")).expect("mkdir");
        fs::write(root.join("real/inside.txt"), b"x").expect("write");

        let attrs = UnixFileAttributeManager::new();
        attrs
            .create_symlink(&root.join("link"), b"real")
            .expect("create_symlink");

        let entries = build_file_list(root, &attrs).expect("build_file_list");
        let link_entry = entries
            .iter()
            .find(|e| e.relative_path() == Path::new("link"))
            .expect("link entry present");
        assert!(link_entry.is_symlink());
        assert!(entries
            .iter()
            .all(|e| e.relative_path() != Path::new("link/inside.txt")));
    }

    #[test]
    fn depth_tracks_nesting_level() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("a/b")).expect("mkdir -p");
        fs::write(root.join("a/b/leaf.txt"), b"x").expect("write");

        let attrs = UnixFileAttributeManager::new();
        let entries = build_file_list(root, &attrs).expect("build_file_list");

        let depths: std::collections::HashMap<String, usize> = entries
            .iter()
            .map(|e| (e.relative_path().to_string_lossy().into_owned(), e.depth()))
            .collect();
        assert_eq!(depths[""], 0);
        assert_eq!(depths["a"], 1);
        assert_eq!(depths["a/b"], 2);
        assert_eq!(depths["a/b/leaf.txt"], 3);
    }
}
