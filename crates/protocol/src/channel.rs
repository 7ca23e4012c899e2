use std::io::{Read, Write};

use rcore::error::Result;

/// Size of the write-aggregation and read-prefetch buffers.
pub const BUFFER_CAPACITY: usize = 8 * 1024;

/// The buffered byte channel: little-endian integer
/// primitives layered over an arbitrary `Read + Write` stream, with writes
/// aggregated into an 8 KiB buffer and reads served from an 8 KiB prefetch
/// buffer.
///
/// Partial reads/writes never surface to callers: every primitive loops
/// internally until the requested bytes are transferred, surfacing
/// [`rcore::RsyncError::Eof`] if the underlying stream is exhausted and
/// [`rcore::RsyncError::Cancelled`] if a blocking call is interrupted.
pub struct BufferedChannel<S> {
    stream: S,
    read_buf: Vec<u8>,
    read_pos: usize,
    read_len: usize,
    write_buf: Vec<u8>,
}

impl<S> BufferedChannel<S>
where
    S: Read + Write,
{
    #[must_use]
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_buf: vec![0u8; BUFFER_CAPACITY],
            read_pos: 0,
            read_len: 0,
            write_buf: Vec::with_capacity(BUFFER_CAPACITY),
        }
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    // ---- writes ----

    pub fn put_byte(&mut self, byte: u8) {
        self.write_buf.push(byte);
    }

    /// Writes a 2-byte little-endian value.
    pub fn put_u16(&mut self, value: u16) {
        self.write_buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 4-byte little-endian value.
    pub fn put_u32(&mut self, value: u32) {
        self.write_buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.put_u32(value as u32);
    }

    pub fn put(&mut self, bytes: &[u8]) {
        self.write_buf.extend_from_slice(bytes);
    }

    /// Flushes the write-aggregation buffer to the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        if !self.write_buf.is_empty() {
            self.stream.write_all(&self.write_buf)?;
            self.write_buf.clear();
        }
        self.stream.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn pending_write_len(&self) -> usize {
        self.write_buf.len()
    }

    pub fn take_pending_write(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.write_buf)
    }

    pub fn restore_pending_write(&mut self, bytes: Vec<u8>) {
        self.write_buf = bytes;
    }

    /// Overwrites 4 bytes at `offset` in the pending write buffer with
    /// `value`'s little-endian encoding. Used to backpatch a multiplex tag
    /// word reserved before its frame's length was known.
    pub fn patch_u32_at(&mut self, offset: usize, value: u32) {
        self.write_buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Drops the last `n` bytes reserved in the pending write buffer.
    pub fn rewind_write(&mut self, n: usize) {
        let new_len = self.write_buf.len() - n;
        self.write_buf.truncate(new_len);
    }

    // ---- reads ----

    pub fn get_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.get_into(&mut buf)?;
        Ok(buf[0])
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.get_into(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.get_into(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        Ok(self.get_u32()? as i32)
    }

    pub fn get(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.get_into(&mut buf)?;
        Ok(buf)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        let mut remaining = n;
        while remaining > 0 {
            let available = self.read_len - self.read_pos;
            if available == 0 {
                self.refill()?;
                continue;
            }
            let take = available.min(remaining);
            self.read_pos += take;
            remaining -= take;
        }
        Ok(())
    }

    /// Fills `out` completely from the channel, looping across buffer and
    /// underlying-stream boundaries as needed.
    fn get_into(&mut self, mut out: &mut [u8]) -> Result<()> {
        while !out.is_empty() {
            let available = self.read_len - self.read_pos;
            if available == 0 {
                self.refill()?;
                continue;
            }
            let take = available.min(out.len());
            out[..take].copy_from_slice(&self.read_buf[self.read_pos..self.read_pos + take]);
            self.read_pos += take;
            out = &mut out[take..];
        }
        Ok(())
    }

    fn refill(&mut self) -> Result<()> {
        self.read_pos = 0;
        let n = self.stream.read(&mut self.read_buf)?;
        if n == 0 {
            return Err(rcore::RsyncError::Eof);
        }
        self.read_len = n;
        Ok(())
    }
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
    fn put_then_flush_then_get_round_trips_exactly() {
        let mut chan = BufferedChannel::new(DuplexBuf {
            read: Cursor::new(Vec::new()),
            written: Vec::new(),
        });
        chan.put_byte(0x42);
        chan.put_u16(0x1234);
        chan.put_u32(0xDEAD_BEEF);
        chan.put(b"hello");
        chan.flush().unwrap();

        let written = chan.get_mut().written.clone();
        chan.get_mut().read = Cursor::new(written);

        assert_eq!(chan.get_byte().unwrap(), 0x42);
        assert_eq!(chan.get_u16().unwrap(), 0x1234);
        assert_eq!(chan.get_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(chan.get(5).unwrap(), b"hello");
    }

    #[test]
    fn get_across_tiny_reader_chunks_still_assembles_whole_value() {
        // Regression for the buffer-boundary invariant:
        // a reader that only ever returns one byte at a time must still
        // produce the correct multi-byte value.
        struct OneByteAtATime(Vec<u8>);
        impl Read for OneByteAtATime {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0.remove(0);
                Ok(1)
            }
        }
        impl Write for OneByteAtATime {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut chan = BufferedChannel::new(OneByteAtATime(vec![0xEF, 0xBE, 0xAD, 0xDE]));
        assert_eq!(chan.get_u32().unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn exhausted_stream_raises_eof() {
        let mut chan = BufferedChannel::new(DuplexBuf {
            read: Cursor::new(Vec::new()),
            written: Vec::new(),
        });
        let err = chan.get_byte().unwrap_err();
        assert!(matches!(err, rcore::RsyncError::Eof));
    }

    #[test]
    fn skip_advances_past_requested_bytes() {
        let mut chan = BufferedChannel::new(DuplexBuf {
            read: Cursor::new(vec![1, 2, 3, 4, 5]),
            written: Vec::new(),
        });
        chan.skip(2).unwrap();
        assert_eq!(chan.get_byte().unwrap(), 3);
    }
}
