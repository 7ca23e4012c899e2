use std::io::{Read, Write};

use protocol::{BufferedChannel, IndexDecoder, IndexEncoder};

use crate::error::Result;

/// Per-file change flags the Generator attaches to an itemize record. Bit layout is local to this wire format; it is not the upstream
/// `ITEM_*` numbering.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ItemizeFlags(u16);

impl ItemizeFlags {
    pub const IS_NEW: u16 = 0x0001;
    pub const NO_CHANGE: u16 = 0x0002;
    pub const TRANSFER: u16 = 0x0004;
    pub const LOCAL_CHANGE: u16 = 0x0008;
    pub const REPORT_CHANGE: u16 = 0x0010;
    pub const REPORT_SIZE: u16 = 0x0020;
    pub const REPORT_TIME: u16 = 0x0040;
    pub const REPORT_PERMS: u16 = 0x0080;
    pub const REPORT_OWNER: u16 = 0x0100;
    pub const REPORT_GROUP: u16 = 0x0200;

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn insert(&mut self, flag: u16) {
        self.0 |= flag;
    }
}

/// One Generator-to-Sender (and, forwarded, Sender-to-Receiver) record:
/// which file list index it concerns, and what changed about it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ItemizeRecord {
    pub index: i32,
    pub flags: ItemizeFlags,
}

/// Writes one itemize record. Use [`write_done`] to close the segment
/// instead of calling this with a sentinel value.
pub fn write_itemize<S: Read + Write>(
    channel: &mut BufferedChannel<S>,
    encoder: &mut IndexEncoder,
    record: &ItemizeRecord,
) -> Result<()> {
    encoder.encode(channel, Some(record.index))?;
    channel.put_u16(record.flags.bits());
    Ok(())
}

/// Writes the segment-completion sentinel.
pub fn write_done<S: Read + Write>(channel: &mut BufferedChannel<S>, encoder: &mut IndexEncoder) -> Result<()> {
    encoder.encode(channel, None)?;
    Ok(())
}

/// Reads one itemize record, or `None` once the `DONE` sentinel is read.
pub fn read_itemize<S: Read + Write>(
    channel: &mut BufferedChannel<S>,
    decoder: &mut IndexDecoder,
) -> Result<Option<ItemizeRecord>> {
    let Some(index) = decoder.decode(channel)? else {
        return Ok(None);
    };
    let flags = ItemizeFlags::from_bits(channel.get_u16()?);
    Ok(Some(ItemizeRecord { index, flags }))
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
    fn records_and_done_sentinel_round_trip() {
        let mut chan = BufferedChannel::new(DuplexBuf {
            read: Cursor::new(Vec::new()),
            written: Vec::new(),
        });
        let mut encoder = IndexEncoder::new();
        let mut flags = ItemizeFlags::empty();
        flags.insert(ItemizeFlags::TRANSFER);
        flags.insert(ItemizeFlags::IS_NEW);
        write_itemize(&mut chan, &mut encoder, &ItemizeRecord { index: 0, flags }).unwrap();
        write_itemize(
            &mut chan,
            &mut encoder,
            &ItemizeRecord {
                index: 3,
                flags: ItemizeFlags::from_bits(ItemizeFlags::NO_CHANGE),
            },
        )
        .unwrap();
        write_done(&mut chan, &mut encoder).unwrap();
        chan.flush().unwrap();

        let bytes = chan.get_mut().written.clone();
        let mut reader = BufferedChannel::new(DuplexBuf {
            read: Cursor::new(bytes),
            written: Vec::new(),
        });
        let mut decoder = IndexDecoder::new();

        let first = read_itemize(&mut reader, &mut decoder).unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert!(first.flags.contains(ItemizeFlags::TRANSFER));
        assert!(first.flags.contains(ItemizeFlags::IS_NEW));

        let second = read_itemize(&mut reader, &mut decoder).unwrap().unwrap();
        assert_eq!(second.index, 3);
        assert!(second.flags.contains(ItemizeFlags::NO_CHANGE));

        assert!(read_itemize(&mut reader, &mut decoder).unwrap().is_none());
    }
}
