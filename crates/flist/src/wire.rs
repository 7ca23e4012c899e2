use std::io::Cursor;

use protocol::{BufferedChannel, MessageCode, MultiplexReader, MultiplexWriter};

use crate::entry::{FileKind, FileListEntry};
use crate::error::FileListError;

const FLAG_TOP_LEVEL: u16 = 0x0001;
const FLAG_DIRECTORY: u16 = 0x0002;
const FLAG_SYMLINK: u16 = 0x0004;
const FLAG_SAME_MODE: u16 = 0x0008;
const FLAG_SAME_UID: u16 = 0x0010;
const FLAG_SAME_GID: u16 = 0x0020;
const FLAG_SAME_MTIME: u16 = 0x0040;
const FLAG_LONG_NAME: u16 = 0x0080;
/// A second flags byte follows, reserved for future per-entry extension
/// data. Never set by this encoder; a decoder that sees it consumes and
/// discards the byte so a newer peer's extended entries don't desync us.
const FLAG_EXTENDED: u16 = 0x0100;

/// The fields of a peer's previous entry that a later one can reference
/// instead of retransmitting, via the same-mode/same-uid/same-gid/
/// same-mtime XMIT flags.
#[derive(Clone, Copy)]
struct PreviousFields {
    mode: u32,
    uid: u32,
    gid: u32,
    mtime: i64,
}

/// Per-stream encoder state: the previous entry's fields, so a run of
/// files sharing an owner or directory only pays for the fields that
/// actually change.
#[derive(Default)]
struct EncodeState {
    previous: Option<PreviousFields>,
}

/// Encodes one entry's XMIT flag word, its raw path-name bytes, and
/// whichever stat fields differ from the previous entry in this stream,
/// as a standalone in-memory frame.
fn encode_entry(state: &mut EncodeState, entry: &FileListEntry) -> Vec<u8> {
    let mut channel = BufferedChannel::new(Cursor::new(Vec::new()));

    let stat = entry.metadata();
    let name = entry.relative_path_bytes();

    let same_mode = state.previous.is_some_and(|p| p.mode == stat.mode);
    let same_uid = state.previous.is_some_and(|p| p.uid == stat.uid);
    let same_gid = state.previous.is_some_and(|p| p.gid == stat.gid);
    let same_mtime = state.previous.is_some_and(|p| p.mtime == stat.mtime);
    let long_name = name.len() > u8::MAX as usize;

    let mut flags = 0u16;
    if entry.is_root() {
        flags |= FLAG_TOP_LEVEL;
    }
    match entry.kind() {
        FileKind::Directory => flags |= FLAG_DIRECTORY,
        FileKind::Symlink { .. } => flags |= FLAG_SYMLINK,
        FileKind::Regular => {}
    }
    if same_mode {
        flags |= FLAG_SAME_MODE;
    }
    if same_uid {
        flags |= FLAG_SAME_UID;
    }
    if same_gid {
        flags |= FLAG_SAME_GID;
    }
    if same_mtime {
        flags |= FLAG_SAME_MTIME;
    }
    if long_name {
        flags |= FLAG_LONG_NAME;
    }
    channel.put_u16(flags);

    if long_name {
        channel.put_u32(name.len() as u32);
    } else {
        channel.put_byte(name.len() as u8);
    }
    channel.put(name);

    channel.put_u32(entry.depth() as u32);

    if !same_mode {
        channel.put_u32(stat.mode);
    }
    channel.put_u32((stat.size >> 32) as u32);
    channel.put_u32(stat.size as u32);
    if !same_mtime {
        channel.put_i32((stat.mtime >> 32) as i32);
        channel.put_i32(stat.mtime as i32);
    }
    if !same_uid {
        channel.put_u32(stat.uid);
    }
    if !same_gid {
        channel.put_u32(stat.gid);
    }

    if let FileKind::Symlink { target } = entry.kind() {
        channel.put_u32(target.len() as u32);
        channel.put(target);
    }

    state.previous = Some(PreviousFields { mode: stat.mode, uid: stat.uid, gid: stat.gid, mtime: stat.mtime });

    channel.flush().expect("writes to an in-memory buffer never fail");
    channel.into_inner().into_inner()
}

/// Mirror of [`EncodeState`] on the reading side.
#[derive(Default)]
struct DecodeState {
    previous: Option<PreviousFields>,
}

/// Decodes one entry previously produced by [`encode_entry`], filling in
/// any field the XMIT flags say matches `state`'s previous entry.
fn decode_entry(state: &mut DecodeState, bytes: &[u8]) -> Result<FileListEntry, FileListError> {
    let mut channel = BufferedChannel::new(Cursor::new(bytes.to_vec()));
    let malformed = |reason: &str| FileListError::Malformed(reason.to_string());

    let flags = channel.get_u16().map_err(|_| malformed("truncated flags word"))?;

    if flags & FLAG_EXTENDED != 0 {
        channel.get_byte().map_err(|_| malformed("truncated extension byte"))?;
    }

    let name_len = if flags & FLAG_LONG_NAME != 0 {
        channel.get_u32().map_err(|_| malformed("truncated name length"))? as usize
    } else {
        channel.get_byte().map_err(|_| malformed("truncated name length"))? as usize
    };
    let name = channel.get(name_len).map_err(|_| malformed("truncated name"))?;

    let depth = channel.get_u32().map_err(|_| malformed("truncated depth"))? as usize;

    let previous = state.previous;

    let mode = if flags & FLAG_SAME_MODE != 0 {
        previous.map(|p| p.mode).ok_or_else(|| malformed("same-mode flag with no previous entry"))?
    } else {
        channel.get_u32().map_err(|_| malformed("truncated mode"))?
    };

    let size_hi = channel.get_u32().map_err(|_| malformed("truncated size"))? as u64;
    let size_lo = channel.get_u32().map_err(|_| malformed("truncated size"))? as u64;
    let size = (size_hi << 32) | size_lo;

    let mtime = if flags & FLAG_SAME_MTIME != 0 {
        previous.map(|p| p.mtime).ok_or_else(|| malformed("same-mtime flag with no previous entry"))?
    } else {
        let mtime_hi = channel.get_i32().map_err(|_| malformed("truncated mtime"))? as i64;
        let mtime_lo = channel.get_i32().map_err(|_| malformed("truncated mtime"))? as i64;
        (mtime_hi << 32) | (mtime_lo & 0xFFFF_FFFF)
    };

    let uid = if flags & FLAG_SAME_UID != 0 {
        previous.map(|p| p.uid).ok_or_else(|| malformed("same-uid flag with no previous entry"))?
    } else {
        channel.get_u32().map_err(|_| malformed("truncated uid"))?
    };

    let gid = if flags & FLAG_SAME_GID != 0 {
        previous.map(|p| p.gid).ok_or_else(|| malformed("same-gid flag with no previous entry"))?
    } else {
        channel.get_u32().map_err(|_| malformed("truncated gid"))?
    };

    let kind = if flags & FLAG_DIRECTORY != 0 {
        FileKind::Directory
    } else if flags & FLAG_SYMLINK != 0 {
        let target_len = channel
            .get_u32()
            .map_err(|_| malformed("truncated symlink target length"))? as usize;
        let target = channel
            .get(target_len)
            .map_err(|_| malformed("truncated symlink target"))?;
        FileKind::Symlink { target }
    } else {
        FileKind::Regular
    };

    let stat = rcore::Stat { mode, size, mtime, uid, gid, nlink: 1, inode: 0 };
    state.previous = Some(PreviousFields { mode, uid, gid, mtime });

    Ok(FileListEntry::from_raw_path(name, depth, flags & FLAG_TOP_LEVEL != 0, kind, stat))
}

/// Writes an entire file list as a run of `Flist` frames terminated by one
/// `FlistEof` frame. The same-field XMIT flags are relative to this call's
/// own entry order, starting fresh each time.
pub fn write_file_list<S: std::io::Read + std::io::Write>(
    writer: &mut MultiplexWriter<S>,
    entries: &[FileListEntry],
) -> rcore::Result<()> {
    let mut state = EncodeState::default();
    for entry in entries {
        let bytes = encode_entry(&mut state, entry);
        writer.write_message(MessageCode::Flist, &bytes)?;
    }
    writer.write_message(MessageCode::FlistEof, &[])?;
    Ok(())
}

/// Reads entries from a run of `Flist` frames until `FlistEof`.
///
/// Any `DATA` bytes interleaved before the list completes are rejected: a
/// file list exchange never shares a connection with payload data.
pub fn read_file_list<S: std::io::Read + std::io::Write>(
    reader: &mut MultiplexReader<S>,
) -> rcore::Result<Vec<FileListEntry>> {
    let mut entries = Vec::new();
    let mut state = DecodeState::default();
    loop {
        let (code, payload) = reader.read_frame()?;
        match code {
            MessageCode::Flist => {
                let entry = decode_entry(&mut state, &payload).map_err(rcore::RsyncError::from)?;
                entries.push(entry);
            }
            MessageCode::FlistEof => return Ok(entries),
            other => {
                return Err(rcore::RsyncError::Protocol(format!(
                    "unexpected message code {other:?} during file list exchange"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;
    use std::path::PathBuf;

    fn sample_regular() -> FileListEntry {
        FileListEntry::new(
            PathBuf::from("docs/readme.txt"),
            1,
            false,
            FileKind::Regular,
            rcore::Stat {
                mode: 0o100_644,
                size: 4096,
                mtime: 1_700_000_000,
                uid: 1000,
                gid: 1000,
                nlink: 1,
                inode: 0,
            },
        )
    }

    fn sample_symlink() -> FileListEntry {
        FileListEntry::new(
            PathBuf::from("link"),
            0,
            true,
            FileKind::Symlink {
                target: b"target/path".to_vec(),
            },
            rcore::Stat {
                mode: 0o120_777,
                size: 11,
                mtime: 1_700_000_001,
                uid: 0,
                gid: 0,
                nlink: 1,
                inode: 0,
            },
        )
    }

    fn round_trip_one(entry: &FileListEntry) -> FileListEntry {
        let mut encode_state = EncodeState::default();
        let bytes = encode_entry(&mut encode_state, entry);
        let mut decode_state = DecodeState::default();
        decode_entry(&mut decode_state, &bytes).expect("decode")
    }

    #[test]
    fn regular_entry_round_trips() {
        let entry = sample_regular();
        assert_eq!(round_trip_one(&entry), entry);
    }

    #[test]
    fn symlink_entry_round_trips_with_target() {
        let entry = sample_symlink();
        assert_eq!(round_trip_one(&entry), entry);
    }

    #[test]
    fn mtime_beyond_the_2038_boundary_round_trips() {
        let base = sample_regular();
        let entry = FileListEntry::new(
            base.relative_path().to_path_buf(),
            base.depth(),
            base.is_root(),
            base.kind().clone(),
            rcore::Stat { mtime: 4_102_444_800, ..base.metadata().clone() },
        );
        assert_eq!(round_trip_one(&entry).metadata().mtime, 4_102_444_800);
    }

    #[test]
    fn non_utf8_name_survives_a_round_trip() {
        let raw_name = vec![b'b', b'a', 0xFF, 0xFE, b'd'];
        let entry = FileListEntry::from_raw_path(
            raw_name.clone(),
            1,
            false,
            FileKind::Regular,
            rcore::Stat { mode: 0o100_644, size: 0, mtime: 0, uid: 0, gid: 0, nlink: 1, inode: 0 },
        );
        let decoded = round_trip_one(&entry);
        assert_eq!(decoded.relative_path_bytes(), raw_name.as_slice());
    }

    #[test]
    fn long_name_sets_the_long_name_flag_and_still_round_trips() {
        let long_name: Vec<u8> = std::iter::repeat(b'x').take(300).collect();
        let entry = FileListEntry::from_raw_path(
            long_name.clone(),
            0,
            false,
            FileKind::Regular,
            rcore::Stat { mode: 0o100_644, size: 0, mtime: 0, uid: 0, gid: 0, nlink: 1, inode: 0 },
        );
        let mut state = EncodeState::default();
        let bytes = encode_entry(&mut state, &entry);
        let flags = u16::from_le_bytes([bytes[0], bytes[1]]);
        assert_ne!(flags & FLAG_LONG_NAME, 0);

        let mut decode_state = DecodeState::default();
        let decoded = decode_entry(&mut decode_state, &bytes).expect("decode");
        assert_eq!(decoded.relative_path_bytes(), long_name.as_slice());
    }

    #[test]
    fn entries_sharing_owner_and_mode_omit_those_fields_on_the_wire() {
        let first = sample_regular();
        let mut second_stat = first.metadata().clone();
        second_stat.mtime += 1;
        let second = FileListEntry::new(
            PathBuf::from("docs/other.txt"),
            first.depth(),
            false,
            FileKind::Regular,
            second_stat,
        );

        let mut state = EncodeState::default();
        let first_bytes = encode_entry(&mut state, &first);
        let second_bytes = encode_entry(&mut state, &second);

        let first_flags = u16::from_le_bytes([first_bytes[0], first_bytes[1]]);
        let second_flags = u16::from_le_bytes([second_bytes[0], second_bytes[1]]);
        assert_eq!(first_flags & (FLAG_SAME_MODE | FLAG_SAME_UID | FLAG_SAME_GID), 0);
        assert_eq!(
            second_flags & (FLAG_SAME_MODE | FLAG_SAME_UID | FLAG_SAME_GID),
            FLAG_SAME_MODE | FLAG_SAME_UID | FLAG_SAME_GID
        );
        assert_eq!(second_flags & FLAG_SAME_MTIME, 0);

        let mut decode_state = DecodeState::default();
        let decoded_first = decode_entry(&mut decode_state, &first_bytes).expect("decode first");
        let decoded_second = decode_entry(&mut decode_state, &second_bytes).expect("decode second");
        assert_eq!(decoded_first, first);
        assert_eq!(decoded_second, second);
    }

    #[test]
    fn write_then_read_file_list_round_trips_all_entries() {
        let entries = vec![sample_regular(), sample_symlink()];
        let buffer: Vec<u8> = Vec::new();
        let mut writer = MultiplexWriter::new(BufferedChannel::new(IoCursor::new(buffer)));
        write_file_list(&mut writer, &entries).expect("write_file_list");
        let bytes = writer.into_inner().into_inner();

        let mut reader = MultiplexReader::new(BufferedChannel::new(bytes));
        let decoded = read_file_list(&mut reader).expect("read_file_list");
        assert_eq!(decoded, entries);
    }

    #[test]
    fn empty_file_list_round_trips() {
        let buffer: Vec<u8> = Vec::new();
        let mut writer = MultiplexWriter::new(BufferedChannel::new(IoCursor::new(buffer)));
        write_file_list(&mut writer, &[]).expect("write_file_list");
        let bytes = writer.into_inner().into_inner();

        let mut reader = MultiplexReader::new(BufferedChannel::new(bytes));
        let decoded = read_file_list(&mut reader).expect("read_file_list");
        assert!(decoded.is_empty());
    }
}
