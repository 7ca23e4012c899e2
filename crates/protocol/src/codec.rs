use std::io::{Read, Write};

use rcore::error::Result;

use crate::channel::BufferedChannel;

/// Sentinel lead byte: no further index follows.
const DONE: u8 = 0x00;
/// Lead byte: the diff that follows is negative. The magnitude is encoded
/// with the same inline/`EXT2`/`EXT3` tiering used for positive diffs.
const NEG: u8 = 0xFE;
/// Lead byte: a 2-byte magnitude extension follows.
const EXT2: u8 = 0xFC;
/// Lead byte: a 3-byte magnitude extension follows.
const EXT3: u8 = 0xFD;
/// Lead byte: no diff is encoded at all; four raw little-endian bytes carry
/// the absolute index value.
const ESCAPE: u8 = 0xFF;

/// Largest magnitude a single inline lead byte can carry (lead bytes
/// `0x01..=0xFB` encode `value = lead - 1`).
const INLINE_MAX: u64 = 0xFB - 1;
/// First magnitude value that needs the 2-byte extension tier.
const EXT2_BASE: u64 = INLINE_MAX + 1;
/// First magnitude value that needs the 3-byte extension tier.
const EXT3_BASE: u64 = EXT2_BASE + 0x1_0000;
/// One past the largest magnitude the 3-byte extension tier can carry.
const EXT3_RANGE: u64 = 0x0100_0000;
/// Largest magnitude the tiered encoding can express before the encoder
/// must fall back to [`ESCAPE`].
const MAX_TIERED_MAGNITUDE: u64 = EXT3_BASE + EXT3_RANGE - 1;

/// Encodes the monotonic-ish index stream used for file-list indices,
/// checksum-header references, and generator redo requests.
///
/// Each direction of the connection keeps its own running "previous index"
/// state. The wire layout tiers on the gap from that previous index:
///
/// - lead byte `0x00`: the `DONE` sentinel, no index follows.
/// - lead byte `0x01..=0xFB`: the diff is `lead - 1` (0..=250), inline.
/// - lead byte `0xFC`: a 2-byte little-endian extension follows, giving a
///   diff of `251 + ext`.
/// - lead byte `0xFD`: a 3-byte little-endian extension follows, giving a
///   diff of `251 + 0x1_0000 + ext`.
/// - lead byte `0xFE`: the diff is negative; a second lead byte (using the
///   same inline/`0xFC`/`0xFD` tiering) carries its magnitude.
/// - lead byte `0xFF`: the diff tiering doesn't apply (the gap is too large,
///   or this is the first index on the wire); four raw little-endian bytes
///   carry the absolute index value directly, not a diff.
pub struct IndexEncoder {
    prev: i32,
}

impl IndexEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self { prev: -1 }
    }

    /// Encodes `index`, or the `DONE` sentinel when `index` is `None`.
    pub fn encode<S>(&mut self, channel: &mut BufferedChannel<S>, index: Option<i32>) -> Result<()>
    where
        S: Read + Write,
    {
        let Some(idx) = index else {
            channel.put_byte(DONE);
            return Ok(());
        };

        let diff = i64::from(idx) - i64::from(self.prev);
        if diff >= 0 && (diff as u64) <= MAX_TIERED_MAGNITUDE {
            write_magnitude(channel, diff as u64);
        } else if diff < 0 && ((-diff) as u64) <= MAX_TIERED_MAGNITUDE {
            channel.put_byte(NEG);
            write_magnitude(channel, (-diff) as u64);
        } else {
            channel.put_byte(ESCAPE);
            channel.put_u32(idx as u32);
        }
        self.prev = idx;
        Ok(())
    }
}

impl Default for IndexEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes `value` using the inline/`EXT2`/`EXT3` tiering described on
/// [`IndexEncoder`]. Callers must ensure `value <= MAX_TIERED_MAGNITUDE`.
fn write_magnitude<S>(channel: &mut BufferedChannel<S>, value: u64)
where
    S: Read + Write,
{
    if value <= INLINE_MAX {
        channel.put_byte((value + 1) as u8);
    } else if value < EXT3_BASE {
        channel.put_byte(EXT2);
        channel.put_u16((value - EXT2_BASE) as u16);
    } else {
        channel.put_byte(EXT3);
        let rel = (value - EXT3_BASE) as u32;
        channel.put_byte((rel & 0xFF) as u8);
        channel.put_byte(((rel >> 8) & 0xFF) as u8);
        channel.put_byte(((rel >> 16) & 0xFF) as u8);
    }
}

/// Reads the magnitude tier that starts with the already-consumed `lead`
/// byte (one of an inline lead, `EXT2`, or `EXT3`).
fn read_magnitude<S>(channel: &mut BufferedChannel<S>, lead: u8) -> Result<u64>
where
    S: Read + Write,
{
    match lead {
        EXT2 => {
            let rel = u64::from(channel.get_u16()?);
            Ok(EXT2_BASE + rel)
        }
        EXT3 => {
            let bytes = channel.get(3)?;
            let rel = u64::from(bytes[0]) | (u64::from(bytes[1]) << 8) | (u64::from(bytes[2]) << 16);
            Ok(EXT3_BASE + rel)
        }
        _ => Ok(u64::from(lead - 1)),
    }
}

/// The reading half of [`IndexEncoder`].
pub struct IndexDecoder {
    prev: i32,
}

impl IndexDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self { prev: -1 }
    }

    /// Decodes the next index, returning `None` once the `DONE` sentinel is
    /// read.
    pub fn decode<S>(&mut self, channel: &mut BufferedChannel<S>) -> Result<Option<i32>>
    where
        S: Read + Write,
    {
        let lead = channel.get_byte()?;
        if lead == DONE {
            return Ok(None);
        }
        if lead == ESCAPE {
            let idx = channel.get_u32()? as i32;
            self.prev = idx;
            return Ok(Some(idx));
        }
        if lead == NEG {
            let lead2 = channel.get_byte()?;
            let magnitude = read_magnitude(channel, lead2)?;
            let idx = (i64::from(self.prev) - magnitude as i64) as i32;
            self.prev = idx;
            return Ok(Some(idx));
        }
        let magnitude = read_magnitude(channel, lead)?;
        let idx = (i64::from(self.prev) + magnitude as i64) as i32;
        self.prev = idx;
        Ok(Some(idx))
    }
}

impl Default for IndexDecoder {
    fn default() -> Self {
        Self::new()
    }
}
