use std::io::{Read, Write};

use checksums::BlockChecksumPolicy;
use rcore::error::Result;
use protocol::BufferedChannel;

use crate::block::SignatureBlock;
use crate::file_signature::FileSignature;

/// Writes a checksum header: block count, block length, digest length,
/// final-block remainder, then each block's rolling checksum and strong
/// digest bytes.
pub fn write_checksum_header<S>(channel: &mut BufferedChannel<S>, sig: &FileSignature) -> Result<()>
where
    S: Read + Write,
{
    let policy = sig.policy();
    let remainder = sig
        .blocks()
        .last()
        .map_or(0, |b| if b.length() == policy.block_length { 0 } else { b.length() });

    channel.put_u32(sig.blocks().len() as u32);
    channel.put_u32(policy.block_length);
    channel.put_u32(policy.digest_length as u32);
    channel.put_u32(remainder);

    for block in sig.blocks() {
        channel.put_u32(block.rolling());
        channel.put(block.strong());
    }
    Ok(())
}

/// Reads a checksum header written by [`write_checksum_header`].
pub fn read_checksum_header<S>(channel: &mut BufferedChannel<S>) -> Result<FileSignature>
where
    S: Read + Write,
{
    let count = channel.get_u32()?;
    let block_length = channel.get_u32()?;
    let digest_length = channel.get_u32()? as usize;
    let remainder = channel.get_u32()?;

    let policy = BlockChecksumPolicy {
        block_length,
        digest_length,
    };

    let mut blocks = Vec::with_capacity(count as usize);
    let mut file_size: u64 = 0;
    for index in 0..count {
        let rolling = channel.get_u32()?;
        let strong = channel.get(digest_length)?;
        let is_last = index == count.saturating_sub(1);
        let length = if is_last && remainder != 0 {
            remainder
        } else {
            block_length
        };
        file_size += u64::from(length);
        blocks.push(SignatureBlock::from_raw_parts(index, length, rolling, strong));
    }

    Ok(FileSignature::from_raw_parts(policy, blocks, file_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct DuplexBuf {
        read: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for DuplexBuf {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.read.read(buf)
        }
    }

    impl Write for DuplexBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn checksum_header_round_trips() {
        let data: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        let policy = BlockChecksumPolicy {
            block_length: 700,
            digest_length: 16,
        };
        let sig = crate::generate_file_signature(Cursor::new(data), policy, 1500, 42).unwrap();

        let mut writer = BufferedChannel::new(DuplexBuf {
            read: Cursor::new(Vec::new()),
            written: Vec::new(),
        });
        write_checksum_header(&mut writer, &sig).unwrap();
        writer.flush().unwrap();
        let bytes = writer.get_mut().written.clone();

        let mut reader = BufferedChannel::new(DuplexBuf {
            read: Cursor::new(bytes),
            written: Vec::new(),
        });
        let decoded = read_checksum_header(&mut reader).unwrap();

        assert_eq!(decoded.blocks().len(), sig.blocks().len());
        assert_eq!(decoded.file_size(), sig.file_size());
        for (a, b) in decoded.blocks().iter().zip(sig.blocks()) {
            assert_eq!(a.rolling(), b.rolling());
            assert_eq!(a.strong(), b.strong());
            assert_eq!(a.length(), b.length());
        }
    }
}
