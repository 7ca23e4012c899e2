//! The Sender role: reads itemize records (and, for changed files, checksum
//! headers) from the Generator, scans the matching source file against the
//! basis signature, and streams a delta to the Receiver.

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use checksums::FileDigest;
use flist::FileListEntry;
use matching::{generate_delta, DeltaSignatureIndex, DeltaToken};
use protocol::{BufferedChannel, IndexDecoder, MessageCode};
use rsync_io::FrameTransport;
use signature::{read_checksum_header, FileSignature};
use tracing::warn;

use crate::error::Result;
use crate::itemize::{read_itemize, ItemizeFlags, ItemizeRecord};
use crate::options::SenderOptions;
use crate::wire::{write_eof_digest, write_itemize_and_checksum};

/// Drives one local-copy session's Sender role.
pub struct Sender<'a> {
    source_root: PathBuf,
    entries: &'a [FileListEntry],
    #[allow(dead_code)]
    options: SenderOptions,
    checksum_seed: i32,
}

impl<'a> Sender<'a> {
    #[must_use]
    pub fn new(source_root: PathBuf, entries: &'a [FileListEntry], options: SenderOptions, checksum_seed: i32) -> Self {
        Self {
            source_root,
            entries,
            options,
            checksum_seed,
        }
    }

    /// Consumes itemize records from `generator_channel` until the
    /// segment's `DONE` sentinel, forwarding each transferable file's delta
    /// to the Receiver over `peer` and waiting for its `SUCCESS`/`REDO`/
    /// `ERROR_XFER` acknowledgement before moving to the next file. Writes [`MessageCode::Done`] once the
    /// Generator's segment is exhausted.
    pub fn run<G, R, W>(&mut self, generator_channel: &mut BufferedChannel<G>, peer: &mut FrameTransport<R, W>) -> Result<()>
    where
        G: Read + Write,
        R: Read,
        W: Write,
    {
        let mut decoder = IndexDecoder::new();

        loop {
            let Some(record) = read_itemize(generator_channel, &mut decoder)? else {
                break;
            };

            if !record.flags.contains(ItemizeFlags::TRANSFER) {
                continue;
            }

            let checksum = read_checksum_header(generator_channel)?;
            let entry = self.entries.get(record.index as usize).ok_or_else(|| {
                rcore::RsyncError::Protocol(format!("itemize index {} out of range", record.index))
            })?;
            let source_path = self.source_root.join(entry.relative_path());

            let data = match read_whole_file(&source_path) {
                Ok(data) => data,
                Err(_) => {
                    peer.writer.write_message(MessageCode::NoSend, &record.index.to_le_bytes())?;
                    peer.writer.flush()?;
                    continue;
                }
            };

            self.send_until_acknowledged(peer, &record, &checksum, &data)?;
        }

        peer.writer.write_message(MessageCode::Done, &[])?;
        peer.writer.flush()?;
        Ok(())
    }

    fn send_until_acknowledged<R, W>(
        &self,
        peer: &mut FrameTransport<R, W>,
        record: &ItemizeRecord,
        checksum: &FileSignature,
        data: &[u8],
    ) -> Result<()>
    where
        R: Read,
        W: Write,
    {
        loop {
            self.send_delta(peer, record, checksum, data)?;

            let (code, payload) = peer.reader.read_frame()?;
            match code {
                MessageCode::Success => return Ok(()),
                MessageCode::Redo => continue,
                MessageCode::ErrorXfer => {
                    warn!(index = record.index, "receiver gave up verifying file after repeated redo");
                    return Ok(());
                }
                other => {
                    return Err(rcore::RsyncError::Protocol(format!(
                        "unexpected acknowledgement code {other:?} for index {} (payload {} bytes)",
                        record.index,
                        payload.len()
                    ))
                    .into())
                }
            }
        }
    }

    fn send_delta<R, W>(
        &self,
        peer: &mut FrameTransport<R, W>,
        record: &ItemizeRecord,
        checksum: &FileSignature,
        data: &[u8],
    ) -> Result<()>
    where
        R: Read,
        W: Write,
    {
        write_itemize_and_checksum(&mut peer.writer, record, Some(checksum))?;

        let index = DeltaSignatureIndex::from_signature(checksum);
        let script = generate_delta(data, &index, self.checksum_seed);
        for token in script.tokens() {
            match token {
                DeltaToken::Copy { block_index, .. } => crate::wire::write_copy(&mut peer.writer, *block_index)?,
                DeltaToken::Literal(bytes) => crate::wire::write_literal(&mut peer.writer, bytes)?,
            }
        }

        let mut digest = FileDigest::new(self.checksum_seed);
        digest.update(data);
        write_eof_digest(&mut peer.writer, &digest.finalize())?;
        peer.writer.flush()?;
        Ok(())
    }
}

fn read_whole_file(path: &std::path::Path) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
