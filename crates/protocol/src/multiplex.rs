use std::io::{Read, Write};

use rcore::error::Result;

use crate::channel::BufferedChannel;
use crate::error::ProtocolError;
use crate::message::MessageCode;

/// Largest payload length a single multiplex frame can carry: the tag word
/// reserves its top byte for the message code, leaving 24 bits for length.
pub const MAX_FRAME_LEN: u32 = 0x00FF_FFFF;

/// Receives out-of-band frames as a [`MultiplexReader`] dispatches them
/// while a caller is pulling `DATA` bytes.
pub trait MessageHandler {
    fn handle(&mut self, code: MessageCode, payload: &[u8]) -> Result<()>;
}

/// A [`MessageHandler`] that drops everything. Useful for handshake stages
/// where no out-of-band frames are expected yet.
pub struct NullHandler;

impl MessageHandler for NullHandler {
    fn handle(&mut self, _code: MessageCode, _payload: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Writes `DATA` frames with lazy tag reservation: the 4-byte tag word is
/// reserved up front and backpatched once the frame's final length is
/// known, so a stream of small writes coalesces into one frame instead of
/// one frame per write. Non-`DATA` messages flush the pending frame first,
/// preserving the peer's read order.
pub struct MultiplexWriter<S> {
    channel: BufferedChannel<S>,
    pending_tag_offset: Option<usize>,
    pending_len: u32,
}

impl<S> MultiplexWriter<S>
where
    S: Read + Write,
{
    #[must_use]
    pub fn new(channel: BufferedChannel<S>) -> Self {
        Self {
            channel,
            pending_tag_offset: None,
            pending_len: 0,
        }
    }

    pub fn into_inner(mut self) -> BufferedChannel<S> {
        self.finalize_data_frame();
        self.channel
    }

    fn reserve_data_tag(&mut self) {
        if self.pending_tag_offset.is_none() {
            let offset = self.channel.pending_write_len();
            self.channel.put_u32(0);
            self.pending_tag_offset = Some(offset);
            self.pending_len = 0;
        }
    }

    /// Rewinds the reserved tag word if the frame it was guarding ended up
    /// empty, otherwise backpatches it with the final code/length tag.
    fn finalize_data_frame(&mut self) {
        if let Some(offset) = self.pending_tag_offset.take() {
            if self.pending_len == 0 {
                self.channel.rewind_write(4);
            } else {
                let tag = (u32::from(MessageCode::Data.as_u8()) << 24) | self.pending_len;
                self.channel.patch_u32_at(offset, tag);
            }
            self.pending_len = 0;
        }
    }

    /// Appends `bytes` to the channel as one or more `DATA` frames,
    /// splitting at [`MAX_FRAME_LEN`] boundaries.
    pub fn write_data(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            self.reserve_data_tag();
            let room = (MAX_FRAME_LEN - self.pending_len) as usize;
            let take = room.min(bytes.len());
            self.channel.put(&bytes[..take]);
            self.pending_len += take as u32;
            bytes = &bytes[take..];
            if self.pending_len == MAX_FRAME_LEN {
                self.finalize_data_frame();
            }
        }
        Ok(())
    }

    /// Writes a single out-of-band frame, flushing any pending `DATA` frame
    /// first so frame order on the wire matches call order.
    pub fn write_message(&mut self, code: MessageCode, payload: &[u8]) -> Result<()> {
        self.finalize_data_frame();
        if payload.len() as u64 > u64::from(MAX_FRAME_LEN) {
            return Err(ProtocolError::FrameTooLarge {
                length: payload.len() as u32,
                max: MAX_FRAME_LEN,
            }
            .into());
        }
        let tag = (u32::from(code.as_u8()) << 24) | payload.len() as u32;
        self.channel.put_u32(tag);
        self.channel.put(payload);
        Ok(())
    }

    pub fn write_noop(&mut self) -> Result<()> {
        self.write_message(MessageCode::Noop, &[])
    }

    pub fn flush(&mut self) -> Result<()> {
        self.finalize_data_frame();
        self.channel.flush()
    }
}

/// Reads a multiplexed stream, transparently dispatching out-of-band frames
/// (`ERROR`, `INFO`, `FLIST`, ...) to a [`MessageHandler`] while serving
/// `DATA` payload bytes to the caller. `NOOP` frames are consumed and
/// discarded as keepalive traffic.
pub struct MultiplexReader<S> {
    channel: BufferedChannel<S>,
    current_data_remaining: u32,
}

impl<S> MultiplexReader<S>
where
    S: Read + Write,
{
    #[must_use]
    pub fn new(channel: BufferedChannel<S>) -> Self {
        Self {
            channel,
            current_data_remaining: 0,
        }
    }

    pub fn into_inner(self) -> BufferedChannel<S> {
        self.channel
    }

    fn next_tag(&mut self) -> Result<(MessageCode, u32)> {
        let tag = self.channel.get_u32()?;
        let code_byte = (tag >> 24) as u8;
        let length = tag & MAX_FRAME_LEN;
        let code = MessageCode::from_u8(code_byte)
            .ok_or(ProtocolError::UnknownMessageCode(code_byte))?;
        Ok((code, length))
    }

    fn advance_to_data(&mut self, handler: &mut dyn MessageHandler) -> Result<()> {
        while self.current_data_remaining == 0 {
            let (code, length) = self.next_tag()?;
            match code {
                MessageCode::Data => self.current_data_remaining = length,
                MessageCode::Noop => {
                    self.channel.skip(length as usize)?;
                }
                other => {
                    let payload = self.channel.get(length as usize)?;
                    handler.handle(other, &payload)?;
                }
            }
        }
        Ok(())
    }

    /// Fills `out` entirely with `DATA` payload bytes, dispatching any
    /// interleaved out-of-band frames to `handler` along the way.
    pub fn read_data(&mut self, handler: &mut dyn MessageHandler, mut out: &mut [u8]) -> Result<()> {
        while !out.is_empty() {
            self.advance_to_data(handler)?;
            let take = (self.current_data_remaining as usize).min(out.len());
            let chunk = self.channel.get(take)?;
            out[..take].copy_from_slice(&chunk);
            self.current_data_remaining -= take as u32;
            out = &mut out[take..];
        }
        Ok(())
    }

    /// Reads exactly one frame, without any `DATA`-coalescing semantics.
    /// Used during the handshake and file-list stages, before multiplexed
    /// `DATA` traffic starts flowing.
    pub fn read_frame(&mut self) -> Result<(MessageCode, Vec<u8>)> {
        let (code, length) = self.next_tag()?;
        let payload = self.channel.get(length as usize)?;
        Ok((code, payload))
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

    struct RecordingHandler(Vec<(MessageCode, Vec<u8>)>);

    impl MessageHandler for RecordingHandler {
        fn handle(&mut self, code: MessageCode, payload: &[u8]) -> Result<()> {
            self.0.push((code, payload.to_vec()));
            Ok(())
        }
    }

    fn duplex() -> DuplexBuf {
        DuplexBuf {
            read: Cursor::new(Vec::new()),
            written: Vec::new(),
        }
    }

    #[test]
    fn coalesces_consecutive_writes_into_one_data_frame() {
        let mut writer = MultiplexWriter::new(BufferedChannel::new(duplex()));
        writer.write_data(b"hello, ").unwrap();
        writer.write_data(b"world").unwrap();
        writer.flush().unwrap();

        let mut channel = writer.into_inner();
        let bytes = channel.get_mut().written.clone();
        // tag word + 12 payload bytes, nothing else.
        assert_eq!(bytes.len(), 4 + 12);
        let tag = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!((tag >> 24) as u8, MessageCode::Data.as_u8());
        assert_eq!(tag & MAX_FRAME_LEN, 12);
    }

    #[test]
    fn out_of_band_message_flushes_pending_data_frame_first() {
        let mut writer = MultiplexWriter::new(BufferedChannel::new(duplex()));
        writer.write_data(b"abc").unwrap();
        writer.write_message(MessageCode::Info, b"note").unwrap();
        writer.flush().unwrap();

        let mut channel = writer.into_inner();
        let bytes = channel.get_mut().written.clone();
        let first_tag = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!((first_tag >> 24) as u8, MessageCode::Data.as_u8());
        let second_tag = u32::from_le_bytes(bytes[7..11].try_into().unwrap());
        assert_eq!((second_tag >> 24) as u8, MessageCode::Info.as_u8());
    }

    #[test]
    fn reader_dispatches_interleaved_frames_and_assembles_data() {
        let mut writer = MultiplexWriter::new(BufferedChannel::new(duplex()));
        writer.write_data(b"part1").unwrap();
        writer.write_message(MessageCode::Info, b"progress").unwrap();
        writer.write_data(b"part2").unwrap();
        writer.write_noop().unwrap();
        writer.flush().unwrap();
        let written = writer.into_inner().get_mut().written.clone();

        let mut reader = MultiplexReader::new(BufferedChannel::new(DuplexBuf {
            read: Cursor::new(written),
            written: Vec::new(),
        }));
        let mut handler = RecordingHandler(Vec::new());
        let mut out = [0u8; 10];
        reader.read_data(&mut handler, &mut out).unwrap();

        assert_eq!(&out, b"part1part2");
        assert_eq!(handler.0, vec![(MessageCode::Info, b"progress".to_vec())]);
    }

    #[test]
    fn unknown_message_code_is_rejected() {
        // Little-endian tag bytes for (250 << 24) | 0, where 250 is not a
        // code this protocol version assigns.
        let mut reader = MultiplexReader::new(BufferedChannel::new(DuplexBuf {
            read: Cursor::new(vec![0x00, 0x00, 0x00, 250]),
            written: Vec::new(),
        }));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, rcore::RsyncError::Protocol(_)));
    }
}
