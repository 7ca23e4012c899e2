//! The Receiver role: reconstructs files from the Sender's token stream
//! into a sibling temp file, verifies the whole-file digest, and either
//! renames the result into place or asks for a retransmission.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use checksums::FileDigest;
use rcore::FileAttributeManager;
use flist::FileListEntry;
use protocol::{MessageCode, MessageHandler};
use rsync_io::FrameTransport;
use signature::FileSignature;

use crate::error::{EngineError, Result};
use crate::generator::system_time_from_secs;
use crate::itemize::ItemizeRecord;
use crate::options::ReceiverOptions;
use crate::uplink::ReceiverUplink;
use crate::wire::{read_digest, read_itemize_and_checksum, read_token, WireToken};

/// Dispatches the `NO_SEND` and `DONE` out-of-band codes the Sender can
/// send in place of (or after) a file's data. `DONE` is surfaced to the
/// caller as a clean end-of-stream, matching how a dropped pipe also ends
/// the transfer.
struct ReceiverHandler<'a> {
    uplink: &'a dyn ReceiverUplink,
}

impl MessageHandler for ReceiverHandler<'_> {
    fn handle(&mut self, code: MessageCode, payload: &[u8]) -> rcore::Result<()> {
        match code {
            MessageCode::NoSend => {
                if let Ok(bytes) = payload.try_into() {
                    self.uplink.purge_file(i32::from_le_bytes(bytes));
                }
                Ok(())
            }
            MessageCode::Done => Err(rcore::RsyncError::Eof),
            _ => Ok(()),
        }
    }
}

/// Drives one local-copy session's Receiver role.
pub struct Receiver<'a> {
    dest_root: PathBuf,
    dest_attrs: &'a dyn FileAttributeManager,
    entries: &'a [FileListEntry],
    options: ReceiverOptions,
    checksum_seed: i32,
    uplink: &'a dyn ReceiverUplink,
}

impl<'a> Receiver<'a> {
    #[must_use]
    pub fn new(
        dest_root: PathBuf,
        dest_attrs: &'a dyn FileAttributeManager,
        entries: &'a [FileListEntry],
        options: ReceiverOptions,
        checksum_seed: i32,
        uplink: &'a dyn ReceiverUplink,
    ) -> Self {
        Self {
            dest_root,
            dest_attrs,
            entries,
            options,
            checksum_seed,
            uplink,
        }
    }

    /// Runs until the Sender signals `DONE` or closes its side of `peer`.
    pub fn run<R, W>(&mut self, peer: &mut FrameTransport<R, W>) -> Result<()>
    where
        R: Read,
        W: Write,
    {
        let mut handler = ReceiverHandler { uplink: self.uplink };
        loop {
            let (record, checksum) = match read_itemize_and_checksum(&mut peer.reader, &mut handler) {
                Ok(v) => v,
                Err(EngineError::Protocol(rcore::RsyncError::Eof)) => break,
                Err(e) => return Err(e),
            };
            let checksum = checksum.expect("the sender only forwards itemize records that carry a checksum header");
            self.receive_file(peer, &mut handler, &record, checksum)?;
        }
        Ok(())
    }

    fn receive_file<R, W>(
        &mut self,
        peer: &mut FrameTransport<R, W>,
        handler: &mut ReceiverHandler<'_>,
        record: &ItemizeRecord,
        mut checksum: FileSignature,
    ) -> Result<()>
    where
        R: Read,
        W: Write,
    {
        let entry = &self.entries[record.index as usize];
        let dest_path = self.dest_root.join(entry.relative_path());

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let (tmp_path, verified) = self.reconstruct(peer, handler, &dest_path, record.index, &checksum)?;

            if verified {
                if self.options.preserve_times {
                    self.dest_attrs
                        .set_mtime(&tmp_path, system_time_from_secs(entry.metadata().mtime))
                        .map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
                }
                if self.options.preserve_permissions {
                    self.dest_attrs
                        .set_mode(&tmp_path, entry.metadata().mode)
                        .map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
                }
                if self.options.preserve_user {
                    self.dest_attrs
                        .set_uid(&tmp_path, entry.metadata().uid)
                        .map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
                }
                if self.options.preserve_group {
                    self.dest_attrs
                        .set_gid(&tmp_path, entry.metadata().gid)
                        .map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
                }
                self.dest_attrs
                    .atomic_move(&tmp_path, &dest_path)
                    .map_err(|e| rcore::RsyncError::io_at(e, &dest_path))?;

                peer.writer.write_message(MessageCode::Success, &record.index.to_le_bytes())?;
                peer.writer.flush()?;
                return Ok(());
            }

            if attempt >= self.options.max_redo_attempts {
                peer.writer.write_message(MessageCode::ErrorXfer, &record.index.to_le_bytes())?;
                peer.writer.flush()?;
                return Err(EngineError::VerificationFailed { index: record.index, attempts: attempt });
            }

            peer.writer.write_message(MessageCode::Redo, &record.index.to_le_bytes())?;
            peer.writer.flush()?;

            let (_, resent) = read_itemize_and_checksum(&mut peer.reader, handler)?;
            checksum = resent.expect("a redo retransmission always carries a fresh checksum header");
        }
    }

    /// Applies the Sender's token stream for one file to a fresh sibling
    /// temp file and checks the trailing whole-file digest, returning the
    /// temp path and whether verification passed.
    fn reconstruct<R, W>(
        &self,
        peer: &mut FrameTransport<R, W>,
        handler: &mut ReceiverHandler<'_>,
        dest_path: &Path,
        index: i32,
        checksum: &FileSignature,
    ) -> Result<(PathBuf, bool)>
    where
        R: Read,
        W: Write,
    {
        let tmp_path = sibling_temp_path(dest_path, index);
        let mut tmp = File::create(&tmp_path).map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
        let mut basis = File::open(dest_path).ok();
        let block_length = u64::from(checksum.policy().block_length);
        let mut digest = FileDigest::new(self.checksum_seed);

        loop {
            match read_token(&mut peer.reader, handler)? {
                Some(WireToken::Literal(bytes)) => {
                    tmp.write_all(&bytes).map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
                    digest.update(&bytes);
                }
                Some(WireToken::Copy(block_index)) => {
                    let block = &checksum.blocks()[block_index as usize];
                    let mut buf = vec![0u8; block.length() as usize];
                    let basis = basis
                        .as_mut()
                        .ok_or_else(|| rcore::RsyncError::Protocol("copy token with no basis file".into()))?;
                    basis
                        .seek(SeekFrom::Start(block_index as u64 * block_length))
                        .map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
                    basis.read_exact(&mut buf).map_err(|e| rcore::RsyncError::io_at(e, dest_path))?;
                    tmp.write_all(&buf).map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
                    digest.update(&buf);
                }
                None => break,
            }
        }

        let expected = read_digest(&mut peer.reader, handler)?;
        let verified = digest.finalize() == expected;
        tmp.flush().map_err(|e| rcore::RsyncError::io_at(e, &tmp_path))?;
        drop(tmp);

        if !verified {
            let _ = std::fs::remove_file(&tmp_path);
        }
        Ok((tmp_path, verified))
    }
}

fn sibling_temp_path(dest_path: &Path, index: i32) -> PathBuf {
    let name = dest_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    dest_path.with_file_name(format!(".{name}.{index}.tmp"))
}
