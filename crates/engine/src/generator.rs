//! The Generator role: walks the source file list against the destination
//! tree, decides what needs transferring, and drives the Sender over the
//! itemize channel.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use checksums::BlockChecksumPolicy;
use rcore::{FileAttributeManager, Stat};
use crossbeam_channel::Receiver;
use flist::{FileKind, FileListEntry};
use protocol::{BufferedChannel, IndexEncoder};
use signature::{generate_file_signature, write_checksum_header};

use crate::error::Result;
use crate::itemize::{write_done, write_itemize, ItemizeFlags, ItemizeRecord};
use crate::options::GeneratorOptions;
use crate::uplink::UplinkMessage;

/// An attribute-only fix-up postponed until the whole file list has been
/// walked, so a directory's mtime is stamped only after everything inside
/// it has settled.
struct DeferredJob {
    path: PathBuf,
    stat: Stat,
}

/// Drives one local-copy session's Generator role.
pub struct Generator<'a> {
    dest_root: PathBuf,
    dest_attrs: &'a dyn FileAttributeManager,
    options: GeneratorOptions,
    checksum_seed: i32,
    uplink_rx: Receiver<UplinkMessage>,
    deferred: Vec<DeferredJob>,
}

impl<'a> Generator<'a> {
    #[must_use]
    pub fn new(
        dest_root: PathBuf,
        dest_attrs: &'a dyn FileAttributeManager,
        options: GeneratorOptions,
        checksum_seed: i32,
        uplink_rx: Receiver<UplinkMessage>,
    ) -> Self {
        Self {
            dest_root,
            dest_attrs,
            options,
            checksum_seed,
            uplink_rx,
            deferred: Vec::new(),
        }
    }

    /// Walks `entries` (the source side's file list, already built by the
    /// caller via [`flist::build_file_list`]) and writes one itemize record
    /// per entry to `channel`, followed by the `DONE` sentinel. Regular
    /// files that need new data are also given a checksum header so the
    /// Sender can compute a delta against the existing destination copy.
    pub fn run<S: Read + Write>(&mut self, channel: &mut BufferedChannel<S>, entries: &[FileListEntry]) -> Result<()> {
        let mut encoder = IndexEncoder::new();
        let mut live_paths = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            if entry.is_root() {
                continue;
            }
            live_paths.push(entry.relative_path().to_path_buf());
            let dest_path = self.dest_root.join(entry.relative_path());
            self.drain_uplink();

            match entry.kind() {
                FileKind::Directory => self.process_directory(channel, &mut encoder, index as i32, entry, &dest_path)?,
                FileKind::Symlink { target } => {
                    self.process_symlink(channel, &mut encoder, index as i32, entry, &dest_path, target)?
                }
                FileKind::Regular => self.process_regular(channel, &mut encoder, index as i32, entry, &dest_path)?,
            }
        }

        if self.options.delete {
            self.delete_extraneous(&self.dest_root.clone(), &live_paths)?;
        }

        write_done(channel, &mut encoder)?;
        channel.flush()?;
        self.flush_deferred()?;
        Ok(())
    }

    fn drain_uplink(&mut self) {
        while let Ok(msg) = self.uplink_rx.try_recv() {
            match msg {
                UplinkMessage::PurgeFile(_) | UplinkMessage::PruneSegment(_) => {
                    // Local-copy mode runs a single segment; a purge just
                    // means the Sender already told the Receiver directly.
                    // Nothing further for the Generator to do here.
                }
            }
        }
    }

    fn process_directory<S: Read + Write>(
        &mut self,
        channel: &mut BufferedChannel<S>,
        encoder: &mut IndexEncoder,
        index: i32,
        entry: &FileListEntry,
        dest_path: &Path,
    ) -> Result<()> {
        let existing = self.dest_attrs.stat_if_exists(dest_path).map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
        match &existing {
            Some(stat) if stat.is_dir() => {}
            Some(stat) => {
                remove_any(self.dest_attrs, dest_path, stat)?;
                self.dest_attrs
                    .create_dir(dest_path)
                    .map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
            }
            None => {
                self.dest_attrs
                    .create_dir(dest_path)
                    .map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
            }
        }

        let mut flags = ItemizeFlags::empty();
        flags.insert(ItemizeFlags::NO_CHANGE);
        write_itemize(channel, encoder, &ItemizeRecord { index, flags })?;

        self.deferred.push(DeferredJob {
            path: dest_path.to_path_buf(),
            stat: entry.metadata().clone(),
        });
        Ok(())
    }

    fn process_symlink<S: Read + Write>(
        &mut self,
        channel: &mut BufferedChannel<S>,
        encoder: &mut IndexEncoder,
        index: i32,
        _entry: &FileListEntry,
        dest_path: &Path,
        target: &[u8],
    ) -> Result<()> {
        if !self.options.preserve_links {
            let mut flags = ItemizeFlags::empty();
            flags.insert(ItemizeFlags::NO_CHANGE);
            write_itemize(channel, encoder, &ItemizeRecord { index, flags })?;
            return Ok(());
        }

        let existing = self.dest_attrs.stat_if_exists(dest_path).map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
        let current_target = if matches!(existing, Some(ref s) if s.is_symlink()) {
            Some(self.dest_attrs.read_symlink(dest_path).map_err(|e| rcore::RsyncError::io_at(e, dest_path))?)
        } else {
            None
        };

        let mut flags = ItemizeFlags::empty();
        if current_target.as_deref() == Some(target) {
            flags.insert(ItemizeFlags::NO_CHANGE);
        } else {
            if let Some(stat) = &existing {
                remove_any(self.dest_attrs, dest_path, stat)?;
            }
            self.dest_attrs
                .create_symlink(dest_path, target)
                .map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
            flags.insert(ItemizeFlags::LOCAL_CHANGE);
            flags.insert(if existing.is_none() { ItemizeFlags::IS_NEW } else { ItemizeFlags::REPORT_CHANGE });
        }
        write_itemize(channel, encoder, &ItemizeRecord { index, flags })?;
        Ok(())
    }

    fn process_regular<S: Read + Write>(
        &mut self,
        channel: &mut BufferedChannel<S>,
        encoder: &mut IndexEncoder,
        index: i32,
        entry: &FileListEntry,
        dest_path: &Path,
    ) -> Result<()> {
        let source_stat = entry.metadata();
        let existing = self.dest_attrs.stat_if_exists(dest_path).map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;

        if let Some(stat) = &existing {
            if !stat.is_regular() {
                remove_any(self.dest_attrs, dest_path, stat)?;
            }
        }

        let is_new = existing.as_ref().map_or(true, |s| !s.is_regular());
        let needs_transfer = self.options.always_itemize
            || is_new
            || source_stat.size != existing.as_ref().map_or(u64::MAX, |s| s.size)
            || (!self.options.ignore_times && source_stat.mtime != existing.as_ref().map_or(i64::MIN, |s| s.mtime));

        let mut flags = ItemizeFlags::empty();
        if is_new {
            flags.insert(ItemizeFlags::IS_NEW);
        }

        if needs_transfer {
            flags.insert(ItemizeFlags::TRANSFER);
            let signature = if is_new {
                let policy = BlockChecksumPolicy::for_file_size(0);
                generate_file_signature(std::io::empty(), policy, 0, self.checksum_seed)?
            } else {
                let file = File::open(dest_path).map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
                let policy = BlockChecksumPolicy::for_file_size(existing.as_ref().unwrap().size);
                generate_file_signature(file, policy, existing.as_ref().unwrap().size, self.checksum_seed)?
            };
            write_itemize(channel, encoder, &ItemizeRecord { index, flags })?;
            write_checksum_header(channel, &signature)?;
        } else {
            flags.insert(ItemizeFlags::NO_CHANGE);
            write_itemize(channel, encoder, &ItemizeRecord { index, flags })?;
            self.deferred.push(DeferredJob {
                path: dest_path.to_path_buf(),
                stat: source_stat.clone(),
            });
        }
        Ok(())
    }

    fn delete_extraneous(&mut self, dir: &Path, live_paths: &[PathBuf]) -> Result<()> {
        let entries = match self.dest_attrs.read_directory(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(rcore::RsyncError::io_at(e, dir).into()),
        };
        for child in entries {
            let name = String::from_utf8_lossy(&child.file_name).into_owned();
            let child_path = dir.join(&name);
            let relative = child_path.strip_prefix(&self.dest_root).unwrap_or(&child_path);
            let is_live = live_paths.iter().any(|p| p == relative || relative.starts_with(p));
            if is_live {
                if let Ok(Some(stat)) = self.dest_attrs.stat_if_exists(&child_path) {
                    if stat.is_dir() {
                        self.delete_extraneous(&child_path, live_paths)?;
                    }
                }
                continue;
            }
            if let Some(stat) = self.dest_attrs.stat_if_exists(&child_path).map_err(|e| rcore::RsyncError::io_at(e, &child_path))? {
                remove_any(self.dest_attrs, &child_path, &stat)?;
            }
        }
        Ok(())
    }

    fn flush_deferred(&mut self) -> Result<()> {
        while let Some(job) = self.deferred.pop() {
            if self.options.preserve_times {
                let mtime = system_time_from_secs(job.stat.mtime);
                self.dest_attrs
                    .set_mtime(&job.path, mtime)
                    .map_err(|e| rcore::RsyncError::io_at(e, &job.path))?;
            }
            if self.options.preserve_permissions {
                self.dest_attrs
                    .set_mode(&job.path, job.stat.mode)
                    .map_err(|e| rcore::RsyncError::io_at(e, &job.path))?;
            }
            if self.options.preserve_user {
                self.dest_attrs
                    .set_uid(&job.path, job.stat.uid)
                    .map_err(|e| rcore::RsyncError::io_at(e, &job.path))?;
            }
            if self.options.preserve_group {
                self.dest_attrs
                    .set_gid(&job.path, job.stat.gid)
                    .map_err(|e| rcore::RsyncError::io_at(e, &job.path))?;
            }
        }
        Ok(())
    }
}

/// Deletes whatever currently sits at `path`, recursively if it is a
/// directory, so a path whose type changed between sender and receiver can
/// be recreated from scratch (Open Question: cross-type replacement).
fn remove_any(attrs: &dyn FileAttributeManager, path: &Path, stat: &Stat) -> Result<()> {
    if stat.is_dir() {
        attrs.remove_dir_all(path).map_err(|e| rcore::RsyncError::io_at(e, path))?;
    } else {
        attrs.unlink(path).map_err(|e| rcore::RsyncError::io_at(e, path))?;
    }
    Ok(())
}

pub(crate) fn system_time_from_secs(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs((-secs) as u64)
    }
}
