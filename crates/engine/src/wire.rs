use std::io::{Cursor, Read, Write};

use protocol::{BufferedChannel, IndexDecoder, IndexEncoder, MessageHandler, MultiplexReader, MultiplexWriter};
use signature::{read_checksum_header, write_checksum_header, FileSignature};

use crate::error::Result;
use crate::itemize::{read_itemize, write_itemize, ItemizeRecord};

/// One token of the sender's delta stream, read back off the wire. The end-of-file marker is consumed internally by [`read_token`]
/// returning `None`; the caller then reads the trailing digest with
/// [`read_digest`].
pub enum WireToken {
    Literal(Vec<u8>),
    Copy(u32),
}

/// Writes one literal token: its length followed by its bytes.
pub fn write_literal<S: Read + Write>(mux: &mut MultiplexWriter<S>, bytes: &[u8]) -> Result<()> {
    mux.write_data(&(bytes.len() as i32).to_le_bytes())?;
    mux.write_data(bytes)?;
    Ok(())
}

/// Writes one copy token referencing basis block `block_index`, encoded as
/// `-(block_index + 1)`.
pub fn write_copy<S: Read + Write>(mux: &mut MultiplexWriter<S>, block_index: u32) -> Result<()> {
    let token = -(i64::from(block_index) + 1);
    mux.write_data(&(token as i32).to_le_bytes())?;
    Ok(())
}

/// Writes the end-of-file marker followed by the whole-file digest.
pub fn write_eof_digest<S: Read + Write>(mux: &mut MultiplexWriter<S>, digest: &[u8; 16]) -> Result<()> {
    mux.write_data(&0i32.to_le_bytes())?;
    mux.write_data(digest)?;
    Ok(())
}

/// Reads the next token, or `None` at the end-of-file marker.
pub fn read_token<S: Read + Write>(
    mux: &mut MultiplexReader<S>,
    handler: &mut dyn MessageHandler,
) -> Result<Option<WireToken>> {
    let mut header = [0u8; 4];
    mux.read_data(handler, &mut header)?;
    let value = i32::from_le_bytes(header);
    if value == 0 {
        return Ok(None);
    }
    if value > 0 {
        let mut buf = vec![0u8; value as usize];
        mux.read_data(handler, &mut buf)?;
        Ok(Some(WireToken::Literal(buf)))
    } else {
        let block_index = (-(i64::from(value)) - 1) as u32;
        Ok(Some(WireToken::Copy(block_index)))
    }
}

/// Reads the 16-byte whole-file digest following an end-of-file marker.
pub fn read_digest<S: Read + Write>(mux: &mut MultiplexReader<S>, handler: &mut dyn MessageHandler) -> Result<[u8; 16]> {
    let mut digest = [0u8; 16];
    mux.read_data(handler, &mut digest)?;
    Ok(digest)
}

fn encode_itemize_and_checksum(record: &ItemizeRecord, checksum: Option<&FileSignature>) -> Result<Vec<u8>> {
    let mut scratch = BufferedChannel::new(Cursor::new(Vec::new()));
    let mut encoder = IndexEncoder::new();
    write_itemize(&mut scratch, &mut encoder, record)?;
    if let Some(sig) = checksum {
        scratch.put_byte(1);
        write_checksum_header(&mut scratch, sig)?;
    } else {
        scratch.put_byte(0);
    }
    scratch.flush()?;
    Ok(scratch.into_inner().into_inner())
}

fn decode_itemize_and_checksum(bytes: &[u8]) -> Result<(ItemizeRecord, Option<FileSignature>)> {
    let mut scratch = BufferedChannel::new(Cursor::new(bytes.to_vec()));
    let mut decoder = IndexDecoder::new();
    let record = read_itemize(&mut scratch, &mut decoder)?
        .expect("a framed itemize blob never carries the bare DONE sentinel");
    let checksum = if scratch.get_byte()? != 0 {
        Some(read_checksum_header(&mut scratch)?)
    } else {
        None
    };
    Ok((record, checksum))
}

/// Forwards one itemize record, plus its checksum header when present, from
/// the Sender to the Receiver.
pub fn write_itemize_and_checksum<S: Read + Write>(
    mux: &mut MultiplexWriter<S>,
    record: &ItemizeRecord,
    checksum: Option<&FileSignature>,
) -> Result<()> {
    let bytes = encode_itemize_and_checksum(record, checksum)?;
    mux.write_data(&(bytes.len() as u32).to_le_bytes())?;
    mux.write_data(&bytes)?;
    Ok(())
}

pub fn read_itemize_and_checksum<S: Read + Write>(
    mux: &mut MultiplexReader<S>,
    handler: &mut dyn MessageHandler,
) -> Result<(ItemizeRecord, Option<FileSignature>)> {
    let mut len_buf = [0u8; 4];
    mux.read_data(handler, &mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    mux.read_data(handler, &mut buf)?;
    decode_itemize_and_checksum(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itemize::ItemizeFlags;
    use protocol::NullHandler;
    use std::io::Cursor as IoCursor;

    #[test]
    fn token_stream_round_trips_literal_copy_and_eof() {
        let buffer: Vec<u8> = Vec::new();
        let mut writer = MultiplexWriter::new(BufferedChannel::new(IoCursor::new(buffer)));
        write_literal(&mut writer, b"hello").unwrap();
        write_copy(&mut writer, 3).unwrap();
        write_eof_digest(&mut writer, &[0xAB; 16]).unwrap();
        writer.flush().unwrap();
        let bytes = writer.into_inner().into_inner().into_inner();

        let mut reader = MultiplexReader::new(BufferedChannel::new(IoCursor::new(bytes)));
        let mut handler = NullHandler;

        match read_token(&mut reader, &mut handler).unwrap() {
            Some(WireToken::Literal(b)) => assert_eq!(b, b"hello"),
            _ => panic!("expected a literal token"),
        }
        match read_token(&mut reader, &mut handler).unwrap() {
            Some(WireToken::Copy(idx)) => assert_eq!(idx, 3),
            _ => panic!("expected copy token"),
        }
        assert!(read_token(&mut reader, &mut handler).unwrap().is_none());
        assert_eq!(read_digest(&mut reader, &mut handler).unwrap(), [0xAB; 16]);
    }

    #[test]
    fn itemize_and_checksum_round_trip_without_checksum() {
        let buffer: Vec<u8> = Vec::new();
        let mut writer = MultiplexWriter::new(BufferedChannel::new(IoCursor::new(buffer)));
        let record = ItemizeRecord {
            index: 5,
            flags: ItemizeFlags::from_bits(ItemizeFlags::NO_CHANGE),
        };
        write_itemize_and_checksum(&mut writer, &record, None).unwrap();
        writer.flush().unwrap();
        let bytes = writer.into_inner().into_inner().into_inner();

        let mut reader = MultiplexReader::new(BufferedChannel::new(IoCursor::new(bytes)));
        let mut handler = NullHandler;
        let (decoded, checksum) = read_itemize_and_checksum(&mut reader, &mut handler).unwrap();
        assert_eq!(decoded, record);
        assert!(checksum.is_none());
    }
}
